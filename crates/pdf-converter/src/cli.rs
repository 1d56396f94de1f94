// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface: argument parsing and subcommand dispatch.
//
// Converted documents go to stdout; logs, archive paths and errors go to
// stderr so the output can be piped.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pdf_converter::services::fetch::DEFAULT_PDF_PATH;
use pdf_converter::{
    ConversionMethod, Converter, ConverterConfig, Result, Table, TextConverter, TextMethod, add_markdown_column,
    convert_pdf_to_md,
};
use pdf_converter_document::{MarkdownRenderer, PageSize, bundle};
use tracing::info;

/// Convert PDF documents into Markdown and plain text.
#[derive(Parser, Debug)]
#[command(name = "pdf-converter", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a local PDF to Markdown and print it.
    Convert {
        /// PDF file to convert.
        input: PathBuf,
        /// layout (pymupdf), relative (pdfplumber), docling-serve (docling) or
        /// pdf-extract (pymupdf4llm). Unknown names fall back to layout.
        method: String,
        /// Extract embedded images into the image folder.
        #[arg(long)]
        images: bool,
        /// Also write a ZIP of the Markdown and its images; its path goes to stderr.
        #[arg(long)]
        bundle: bool,
    },

    /// Print the plain text of a local PDF.
    Text {
        input: PathBuf,
        /// lopdf (pymupdf) or pdf-extract (pdfplumber).
        #[arg(short, long, default_value = "lopdf")]
        method: String,
    },

    /// Download a PDF and print its Markdown.
    Fetch {
        url: String,
        method: String,
        /// Where the downloaded PDF is stored.
        #[arg(long, default_value = DEFAULT_PDF_PATH)]
        pdf_path: PathBuf,
    },

    /// Add a Markdown column to a CSV file of PDF URLs.
    Batch {
        /// Input CSV file with a header row.
        csv: PathBuf,
        /// Column holding the PDF URLs.
        #[arg(long)]
        url_column: String,
        #[arg(long)]
        method: String,
        /// Name of the new column (default: <url_column>_md_<method>).
        #[arg(long)]
        md_column: Option<String>,
        /// Write the table here after every row; without it the result is
        /// printed to stdout at the end.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a Markdown file to PDF.
    Render {
        markdown: PathBuf,
        output: PathBuf,
        /// a4 or letter.
        #[arg(long, default_value = "a4")]
        paper: PageSize,
    },

    /// Print an HTML download link embedding the file as a data URI.
    Link {
        file: PathBuf,
        #[arg(long, default_value = "Download")]
        text: String,
    },
}

/// Run one subcommand to completion.
pub async fn run(command: Command, config: &ConverterConfig) -> Result<()> {
    match command {
        Command::Convert {
            input,
            method,
            images,
            bundle,
        } => {
            let method = ConversionMethod::parse_lenient(&method);
            let mut converter = Converter::new(method, input, config)?.with_images(images);
            let markdown = converter.convert().await?.to_string();
            println!("{markdown}");
            if bundle {
                let archive = converter.zip_with_images()?;
                eprintln!("{}", archive.display());
            }
        }

        Command::Text { input, method } => {
            let mut converter = TextConverter::new(TextMethod::parse_lenient(&method), input, config)?;
            println!("{}", converter.convert()?);
        }

        Command::Fetch { url, method, pdf_path } => {
            let method = ConversionMethod::parse_lenient(&method);
            let markdown = convert_pdf_to_md(&url, method, &pdf_path, config).await?;
            println!("{markdown}");
        }

        Command::Batch {
            csv,
            url_column,
            method,
            md_column,
            output,
        } => {
            let table = Table::from_path(&csv)?;
            let result = add_markdown_column(
                &table,
                &url_column,
                &method,
                md_column.as_deref(),
                output.as_deref(),
                config,
            )
            .await?;
            match output {
                Some(path) => info!(rows = result.len(), output = %path.display(), "batch complete"),
                None => result.to_writer(std::io::stdout())?,
            }
        }

        Command::Render {
            markdown,
            output,
            paper,
        } => {
            let text = std::fs::read_to_string(&markdown)?;
            let mut renderer = MarkdownRenderer::new(paper);
            if let Some(stem) = markdown.file_stem() {
                renderer.set_title(stem.to_string_lossy());
            }
            renderer.write_to_file(&text, &output)?;
        }

        Command::Link { file, text } => {
            println!("{}", bundle::download_link(&file, &text)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_convert_flags() {
        let cli = Cli::try_parse_from(["pdf-converter", "convert", "in.pdf", "pymupdf", "--images", "--bundle"]).unwrap();
        match cli.command {
            Command::Convert {
                input,
                method,
                images,
                bundle,
            } => {
                assert_eq!(input, PathBuf::from("in.pdf"));
                assert_eq!(method, "pymupdf");
                assert!(images && bundle);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn fetch_defaults_pdf_path() {
        let cli = Cli::try_parse_from(["pdf-converter", "fetch", "http://x/a.pdf", "layout"]).unwrap();
        assert!(matches!(cli.command, Command::Fetch { ref pdf_path, .. } if pdf_path == &PathBuf::from("temp.pdf")));
    }

    #[test]
    fn render_parses_paper() {
        let cli = Cli::try_parse_from(["pdf-converter", "render", "a.md", "a.pdf", "--paper", "letter"]).unwrap();
        assert!(matches!(cli.command, Command::Render { paper: PageSize::Letter, .. }));
        assert!(Cli::try_parse_from(["pdf-converter", "render", "a.md", "a.pdf", "--paper", "a0"]).is_err());
    }

    #[test]
    fn batch_requires_url_column() {
        assert!(Cli::try_parse_from(["pdf-converter", "batch", "in.csv", "--method", "layout"]).is_err());
    }

    #[tokio::test]
    async fn render_and_link_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let markdown = dir.path().join("notes.md");
        std::fs::write(&markdown, "# Notes\n\nSome text.").unwrap();
        let output = dir.path().join("notes.pdf");

        let config = ConverterConfig::default();
        run(
            Command::Render {
                markdown: markdown.clone(),
                output: output.clone(),
                paper: PageSize::A4,
            },
            &config,
        )
        .await
        .unwrap();
        assert!(std::fs::read(&output).unwrap().starts_with(b"%PDF"));

        run(Command::Link { file: output, text: "pdf".into() }, &config).await.unwrap();
    }
}
