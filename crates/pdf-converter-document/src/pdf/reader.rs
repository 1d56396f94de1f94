// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open existing PDF documents with the `lopdf` crate and pull
// out their text, either flat or as styled layout lines.

use std::path::Path;

use lopdf::content::Content;
use lopdf::{Document, ObjectId};
use pdf_converter_core::error::ConverterError;
use tracing::{debug, info, instrument, warn};

use super::content::{LayoutLine, PageWalker};
use super::fonts;

/// Reads text and structure out of an existing PDF.
///
/// Wraps `lopdf::Document`; pages are addressed 1-indexed throughout.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConverterError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            ConverterError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ConverterError> {
        let document = Document::load_mem(data).map_err(|err| {
            ConverterError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Borrow the underlying lopdf document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// `(page number, object id)` pairs in page order.
    pub fn pages(&self) -> Vec<(u32, ObjectId)> {
        self.document.get_pages().into_iter().collect()
    }

    // -- Flat text ------------------------------------------------------------

    /// Text of a single page (1-indexed).
    pub fn page_text(&self, page_number: u32) -> Result<String, ConverterError> {
        let total = self.page_count();
        if page_number == 0 || page_number as usize > total {
            return Err(ConverterError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number, total
            )));
        }
        self.document.extract_text(&[page_number]).map_err(|err| {
            ConverterError::PdfError(format!("failed to extract text of page {}: {}", page_number, err))
        })
    }

    /// Text of every page, pages joined by a newline.
    ///
    /// Pages whose text cannot be extracted contribute an empty string.
    #[instrument(skip(self))]
    pub fn all_text(&self) -> String {
        let texts: Vec<String> = self
            .pages()
            .into_iter()
            .map(|(page_number, _)| {
                self.page_text(page_number).unwrap_or_else(|err| {
                    warn!(page_number, %err, "text extraction failed, page left empty");
                    String::new()
                })
            })
            .collect();
        texts.join("\n")
    }

    // -- Layout ---------------------------------------------------------------

    /// Styled lines of every page, in reading order of the content streams.
    ///
    /// A page whose content stream cannot be decoded is skipped with a warning.
    #[instrument(skip(self))]
    pub fn layout_lines(&self) -> Vec<LayoutLine> {
        let mut lines = Vec::new();

        for (page_number, page_id) in self.pages() {
            let raw = match self.document.get_page_content(page_id) {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(page_number, %err, "cannot read page content");
                    continue;
                }
            };
            let content = match Content::decode(&raw) {
                Ok(content) => content,
                Err(err) => {
                    warn!(page_number, %err, "cannot decode page content");
                    continue;
                }
            };

            let resources = fonts::page_resources(&self.document, page_id);
            let mut walker = PageWalker::new(&self.document, page_number);
            walker.run(&content.operations, resources, 0);
            let page_lines = walker.finish();
            debug!(page_number, lines = page_lines.len(), "page laid out");
            lines.extend(page_lines);
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{SampleLine, form_xobject_pdf, pdf_with_font, sample_pdf};
    use lopdf::dictionary;

    #[test]
    fn reads_page_count_and_layout() {
        let bytes = sample_pdf(&[
            vec![
                SampleLine::bold("Annual Report", 20),
                SampleLine::regular("Revenue grew steadily throughout the year.", 11),
            ],
            vec![SampleLine::regular("Second page body text.", 11)],
        ]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.page_count(), 2);
        assert!(reader.source_path().is_none());

        let lines = reader.layout_lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text(), "Annual Report");
        assert_eq!(lines[0].font_size(), 20.0);
        assert!(lines[0].is_bold());
        assert!(!lines[1].is_bold());
        assert_eq!(lines[2].page, 2);
    }

    #[test]
    fn page_text_checks_range() {
        let bytes = sample_pdf(&[vec![SampleLine::regular("Only page", 12)]]);
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert!(reader.page_text(1).unwrap().contains("Only page"));
        assert!(matches!(reader.page_text(2), Err(ConverterError::PdfError(_))));
        assert!(matches!(reader.page_text(0), Err(ConverterError::PdfError(_))));
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        let err = PdfReader::from_bytes(b"definitely not a pdf").err().unwrap();
        assert!(matches!(err, ConverterError::PdfError(_)));
    }

    #[test]
    fn open_records_source_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, sample_pdf(&[vec![SampleLine::regular("x", 12)]])).unwrap();
        let reader = PdfReader::open(&path).unwrap();
        assert_eq!(reader.source_path(), Some(path.display().to_string().as_str()));
    }

    #[test]
    fn form_xobject_text_is_laid_out() {
        let reader = PdfReader::from_bytes(&form_xobject_pdf()).unwrap();
        let lines = reader.layout_lines();
        let texts: Vec<String> = lines.iter().map(LayoutLine::text).collect();
        assert_eq!(texts, ["Before the form", "Inside the form"]);
        assert!(lines.iter().all(|line| line.page == 1));
    }

    #[test]
    fn layout_text_follows_the_font_encoding() {
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Times-Roman",
            "Encoding" => "MacRomanEncoding",
        };
        let reader = PdfReader::from_bytes(&pdf_with_font(font, &[0x43, 0x61, 0x66, 0x8E])).unwrap();
        let lines = reader.layout_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "Café");
    }
}
