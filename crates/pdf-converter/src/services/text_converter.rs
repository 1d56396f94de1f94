// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF → plain text conversion service.

use std::path::{Path, PathBuf};

use pdf_converter_core::config::ConverterConfig;
use pdf_converter_core::error::Result;
use pdf_converter_core::types::{OutputKind, TextMethod};
use pdf_converter_document::text;
use tracing::{info, instrument};

use super::unique_output_file;

/// Extracts the text of one PDF into a uniquely named `.txt` file.
pub struct TextConverter {
    method: TextMethod,
    input_file: PathBuf,
    output_file: PathBuf,
    text: String,
}

impl TextConverter {
    pub fn new(method: TextMethod, input_file: impl Into<PathBuf>, config: &ConverterConfig) -> Result<Self> {
        Ok(Self {
            method,
            input_file: input_file.into(),
            output_file: unique_output_file(&config.output_dir, OutputKind::Text.extension())?,
            text: String::new(),
        })
    }

    pub fn method(&self) -> TextMethod {
        self.method
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// Text from the last successful `convert()`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Extract, write the output file, and return the text.
    #[instrument(skip(self), fields(method = %self.method, input = %self.input_file.display()))]
    pub fn convert(&mut self) -> Result<&str> {
        let text = text::extract_text(&self.input_file, self.method)?;
        std::fs::write(&self.output_file, &text)?;
        info!(chars = text.len(), output = %self.output_file.display(), "text written");
        self.text = text;
        Ok(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_converter_core::error::ConverterError;
    use pdf_converter_document::fixtures::{SampleLine, write_sample_pdf};

    #[test]
    fn writes_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        write_sample_pdf(
            &input,
            &[
                vec![SampleLine::regular("First page words", 12)],
                vec![SampleLine::regular("Second page words", 12)],
            ],
        )
        .unwrap();
        let config = ConverterConfig {
            output_dir: dir.path().join("out"),
            ..ConverterConfig::default()
        };

        let mut converter = TextConverter::new(TextMethod::Lopdf, &input, &config).unwrap();
        assert_eq!(converter.output_file().extension().unwrap(), "txt");

        let text = converter.convert().unwrap().to_string();
        assert!(text.contains("First page words"));
        assert!(text.contains("Second page words"));
        assert_eq!(std::fs::read_to_string(converter.output_file()).unwrap(), text);
    }

    #[test]
    fn unreadable_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.pdf");
        std::fs::write(&input, b"not a pdf").unwrap();
        let config = ConverterConfig {
            output_dir: dir.path().to_path_buf(),
            ..ConverterConfig::default()
        };
        let mut converter = TextConverter::new(TextMethod::Lopdf, &input, &config).unwrap();
        assert!(matches!(converter.convert(), Err(ConverterError::PdfError(_))));
    }
}
