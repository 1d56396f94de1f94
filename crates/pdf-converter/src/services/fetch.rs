// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Download a PDF from a URL and convert it to Markdown in one step.

use std::path::Path;

use pdf_converter_core::config::ConverterConfig;
use pdf_converter_core::error::Result;
use pdf_converter_core::types::ConversionMethod;
use pdf_converter_remote::PdfDownloader;
use tracing::{info, instrument};

use super::converter::Converter;

/// Where downloads land when no path is given.
pub const DEFAULT_PDF_PATH: &str = "temp.pdf";

/// Download `url` to `pdf_path`, convert it with `method`, and return the
/// Markdown.
#[instrument(skip_all, fields(%url, %method, pdf_path = %pdf_path.display()))]
pub async fn convert_pdf_to_md(
    url: &str,
    method: ConversionMethod,
    pdf_path: &Path,
    config: &ConverterConfig,
) -> Result<String> {
    info!("Downloading PDF: {url}");
    let bytes = PdfDownloader::from_config(config)?.download(url, pdf_path).await?;
    info!(bytes, "PDF downloaded");

    let mut converter = Converter::new(method, pdf_path, config)?;
    converter.convert().await?;
    Ok(tokio::fs::read_to_string(converter.output_file()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_converter_core::error::ConverterError;
    use pdf_converter_document::fixtures::{SampleLine, sample_pdf};
    use wiremock::matchers::{method as http_method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(dir: &Path) -> ConverterConfig {
        ConverterConfig {
            image_folder: dir.join("images"),
            output_dir: dir.join("out"),
            download_retries: 0,
            ..ConverterConfig::default()
        }
    }

    #[tokio::test]
    async fn downloads_and_converts() {
        let server = MockServer::start().await;
        let pdf = sample_pdf(&[vec![
            SampleLine::regular("Quarterly Results", 18),
            SampleLine::regular("Revenue grew in every region.", 11),
        ]]);
        Mock::given(http_method("GET"))
            .and(path("/report.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(pdf))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let pdf_path = dir.path().join("temp.pdf");
        let markdown = convert_pdf_to_md(
            &format!("{}/report.pdf", server.uri()),
            ConversionMethod::Layout,
            &pdf_path,
            &config(dir.path()),
        )
        .await
        .unwrap();

        assert_eq!(markdown, "# Quarterly Results\n\nRevenue grew in every region.");
        assert!(pdf_path.exists());
    }

    #[tokio::test]
    async fn failed_download_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(http_method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = convert_pdf_to_md(
            &format!("{}/missing.pdf", server.uri()),
            ConversionMethod::Layout,
            &dir.path().join("temp.pdf"),
            &config(dir.path()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ConverterError::HttpStatus { status: 404, .. }));
    }
}
