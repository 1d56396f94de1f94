// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-text extraction back-ends.

use std::path::Path;

use pdf_converter_core::error::{ConverterError, Result};
use pdf_converter_core::types::TextMethod;
use tracing::{info, instrument};

use crate::pdf::PdfReader;

/// Extract the text of every page with the chosen back-end.
#[instrument(skip_all, fields(path = %path.as_ref().display(), %method))]
pub fn extract_text(path: impl AsRef<Path>, method: TextMethod) -> Result<String> {
    let text = match method {
        TextMethod::Lopdf => PdfReader::open(path.as_ref())?.all_text(),
        TextMethod::PdfExtract => extract_with_pdf_extract(path.as_ref())?,
    };
    info!(chars = text.len(), "text extracted");
    Ok(text)
}

/// Text from `pdf-extract`, regrouped into Markdown paragraphs.
///
/// Hard line breaks inside a paragraph are joined with spaces; paragraphs are
/// separated by one blank line.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn plain_markdown(path: impl AsRef<Path>) -> Result<String> {
    let text = extract_with_pdf_extract(path.as_ref())?;
    Ok(paragraphs(&text))
}

fn extract_with_pdf_extract(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    pdf_extract::extract_text_from_mem(&bytes).map_err(|err| {
        ConverterError::PdfError(format!("pdf-extract failed on {}: {}", path.display(), err))
    })
}

/// Regroup raw extracted text into blank-line separated paragraphs.
pub fn paragraphs(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                out.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current.join(" "));
    }

    out.into_iter()
        .map(|paragraph| paragraph.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{SampleLine, write_sample_pdf};

    #[test]
    fn paragraphs_join_wrapped_lines() {
        let raw = "\n\nFirst line\ncontinues  here\n\n\n  Second paragraph \n";
        assert_eq!(paragraphs(raw), "First line continues here\n\nSecond paragraph");
    }

    #[test]
    fn paragraphs_of_empty_text() {
        assert_eq!(paragraphs(" \n\n "), "");
    }

    #[test]
    fn lopdf_backend_reads_every_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two.pdf");
        write_sample_pdf(
            &path,
            &[
                vec![SampleLine::regular("Alpha page", 12)],
                vec![SampleLine::regular("Beta page", 12)],
            ],
        )
        .unwrap();

        let text = extract_text(&path, TextMethod::Lopdf).unwrap();
        let alpha = text.find("Alpha page").unwrap();
        let beta = text.find("Beta page").unwrap();
        assert!(alpha < beta);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = extract_text("/nonexistent/file.pdf", TextMethod::PdfExtract).unwrap_err();
        assert!(matches!(err, ConverterError::Io(_)));
    }
}
