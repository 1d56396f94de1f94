// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdf-converter — Convert PDF documents into Markdown and plain text.
//
// The service layer ties the document and remote crates together: single
// file conversion, URL download + conversion, and CSV batch enrichment.

pub mod services;

pub use pdf_converter_core::{ConversionMethod, ConverterConfig, ConverterError, Result, TextMethod};
pub use services::batch::{Table, add_markdown_column, default_column_name};
pub use services::converter::Converter;
pub use services::fetch::convert_pdf_to_md;
pub use services::text_converter::TextConverter;
