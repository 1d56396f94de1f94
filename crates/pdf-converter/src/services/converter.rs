// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF → Markdown conversion service.
//
// A `Converter` owns one input PDF, a uniquely named `.md` output file and a
// per-document image folder. Local methods run on the blocking thread pool;
// docling-serve conversion goes over the network.

use std::path::{Path, PathBuf};

use pdf_converter_core::config::ConverterConfig;
use pdf_converter_core::error::{ConverterError, Result};
use pdf_converter_core::types::{ConversionMethod, OutputKind};
use pdf_converter_document::markdown::{layout, relative};
use pdf_converter_document::{ImageExtractor, PdfReader, bundle, text};
use pdf_converter_remote::DoclingClient;
use tracing::{info, instrument, warn};

use super::unique_output_file;

/// Converts one PDF into Markdown with a chosen method.
pub struct Converter {
    method: ConversionMethod,
    input_file: PathBuf,
    output_file: PathBuf,
    image_folder: PathBuf,
    extract_images: bool,
    markdown: String,
    config: ConverterConfig,
}

impl Converter {
    // -- Construction ---------------------------------------------------------

    /// Prepare a conversion: reserves the output file in `config.output_dir`
    /// and creates `<image_folder>/<output stem>` for extracted images.
    pub fn new(method: ConversionMethod, input_file: impl Into<PathBuf>, config: &ConverterConfig) -> Result<Self> {
        let output_file = unique_output_file(&config.output_dir, OutputKind::Markdown.extension())?;
        let stem = output_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let image_folder = config.image_folder.join(stem);
        std::fs::create_dir_all(&image_folder)?;

        Ok(Self {
            method,
            input_file: input_file.into(),
            output_file,
            image_folder,
            extract_images: false,
            markdown: String::new(),
            config: config.clone(),
        })
    }

    /// Also extract embedded images into the image folder during `convert()`.
    pub fn with_images(mut self, enabled: bool) -> Self {
        self.extract_images = enabled;
        self
    }

    // -- Accessors ------------------------------------------------------------

    pub fn method(&self) -> ConversionMethod {
        self.method
    }

    pub fn input_file(&self) -> &Path {
        &self.input_file
    }

    /// Whether `convert()` extracts images and bundles them with the Markdown.
    pub fn has_image_extraction(&self) -> bool {
        self.extract_images
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    pub fn image_folder(&self) -> &Path {
        &self.image_folder
    }

    /// Markdown from the last successful `convert()`; empty before that.
    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    // -- Conversion -----------------------------------------------------------

    /// Run the conversion, write the output file, and return the Markdown.
    #[instrument(skip(self), fields(method = %self.method, input = %self.input_file.display()))]
    pub async fn convert(&mut self) -> Result<&str> {
        let markdown = if self.method.is_remote() {
            DoclingClient::from_config(&self.config)?
                .convert_file(&self.input_file)
                .await?
        } else {
            let (method, input) = (self.method, self.input_file.clone());
            run_blocking(move || convert_locally(method, &input)).await?
        };

        if self.extract_images {
            let input = self.input_file.clone();
            let folder = self.image_folder.clone();
            let images = run_blocking(move || {
                let reader = PdfReader::open(&input)?;
                ImageExtractor::new(&reader).extract_to(&folder)
            })
            .await?;
            info!(images = images.len(), folder = %self.image_folder.display(), "images extracted");
        }

        tokio::fs::write(&self.output_file, &markdown).await?;
        info!(chars = markdown.len(), output = %self.output_file.display(), "markdown written");
        self.markdown = markdown;
        Ok(&self.markdown)
    }

    // -- Packaging ------------------------------------------------------------

    /// Bundle the Markdown file and extracted images into `<output>.zip`.
    pub fn zip_with_images(&self) -> Result<PathBuf> {
        let dest = self.output_file.with_extension(OutputKind::Zip.extension());
        bundle::zip_markdown_with_images(&self.output_file, &self.image_folder, &dest)
    }

    /// Archive only the image folder, as `<image folder>.zip`.
    pub fn zip_images(&self) -> Result<PathBuf> {
        bundle::zip_folder(&self.image_folder)
    }

    /// HTML download anchor for the result.
    ///
    /// With image extraction on, links the ZIP bundle; otherwise the Markdown
    /// file itself. `None` when there is no output file.
    pub fn download_link(&self, link_text: &str) -> Result<Option<String>> {
        if !self.output_file.exists() {
            warn!(output = %self.output_file.display(), "no output to link");
            return Ok(None);
        }
        let target = if self.extract_images {
            self.zip_with_images()?
        } else {
            self.output_file.clone()
        };
        bundle::download_link(&target, link_text).map(Some)
    }
}

/// Markdown from one of the local (non-network) methods.
fn convert_locally(method: ConversionMethod, input: &Path) -> Result<String> {
    match method {
        ConversionMethod::Layout => {
            let reader = PdfReader::open(input)?;
            Ok(layout::to_markdown(&reader.layout_lines()))
        }
        ConversionMethod::RelativeFont => {
            let reader = PdfReader::open(input)?;
            Ok(relative::to_markdown(&reader.layout_lines()))
        }
        ConversionMethod::PlainExtract => text::plain_markdown(input),
        ConversionMethod::DoclingServe => Err(ConverterError::UnsupportedMethod(
            "docling-serve cannot run locally".into(),
        )),
    }
}

/// Run CPU-bound PDF work off the async executor.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ConverterError::PdfError(format!("conversion task failed: {err}")))?
}
