// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdf-converter-document — Local document processing for pdf-converter.
//
// Reads PDFs with lopdf (text, layout lines with font metrics, embedded
// images), turns layout lines into Markdown with two heading heuristics,
// packages results as zip archives or data-URI links, and renders Markdown
// back into PDF with printpdf.

pub mod bundle;
pub mod image;
pub mod markdown;
pub mod pdf;
pub mod render;
pub mod text;

#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;

// Re-export the primary structs so callers can use `pdf_converter_document::PdfReader` etc.
pub use image::extract::{ExtractedImage, ImageExtractor};
pub use pdf::{LayoutLine, PdfReader, TextSpan};
pub use render::{MarkdownRenderer, PageSize};
