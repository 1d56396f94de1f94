// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: conversion methods, output kinds, and error classes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConverterError;

/// How a PDF is turned into Markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionMethod {
    /// Line-level layout heuristics: absolute font sizes pick heading levels,
    /// bold fonts become `**strong**` text.
    Layout,
    /// Headings are lines noticeably larger than the page's average font size.
    RelativeFont,
    /// Remote conversion through a docling-serve instance.
    DoclingServe,
    /// Plain text from the pdf-extract back-end, normalised into paragraphs.
    PlainExtract,
}

impl ConversionMethod {
    /// Canonical name, used in generated column names and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::RelativeFont => "relative",
            Self::DoclingServe => "docling-serve",
            Self::PlainExtract => "pdf-extract",
        }
    }

    /// Parse a method name, falling back to [`ConversionMethod::Layout`] for
    /// names nobody recognises.
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!(method = name, "unknown conversion method, using layout");
            Self::Layout
        })
    }

    /// Whether the method needs network access.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::DoclingServe)
    }
}

impl FromStr for ConversionMethod {
    type Err = ConverterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "layout" | "pymupdf" => Ok(Self::Layout),
            "relative" | "relative-font" | "pdfplumber" => Ok(Self::RelativeFont),
            "docling-serve" | "docling" => Ok(Self::DoclingServe),
            "pdf-extract" | "plain" | "pymupdf4llm" => Ok(Self::PlainExtract),
            other => Err(ConverterError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for ConversionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Back-end used for plain-text extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextMethod {
    /// lopdf's per-page text extraction.
    #[default]
    Lopdf,
    /// The `pdf-extract` crate, which handles more font encodings.
    PdfExtract,
}

impl TextMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lopdf => "lopdf",
            Self::PdfExtract => "pdf-extract",
        }
    }

    /// Unknown names select the default back-end.
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pdf-extract" | "pdfplumber" => Self::PdfExtract,
            _ => Self::Lopdf,
        }
    }
}

impl fmt::Display for TextMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of files the converter produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    Markdown,
    Text,
    Zip,
    Pdf,
}

impl OutputKind {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Text => "txt",
            Self::Zip => "zip",
            Self::Pdf => "pdf",
        }
    }

    /// MIME type used in data-URI download links.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Markdown => "text/markdown",
            Self::Text => "text/plain",
            Self::Zip => "application/zip",
            Self::Pdf => "application/pdf",
        }
    }

    /// Infer the output kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "txt" => Some(Self::Text),
            "zip" => Some(Self::Zip),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Error classification for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Network blip, timeout, overloaded server — safe to retry automatically.
    Transient,
    /// The user must fix something first (missing setting, wrong column).
    UserAction,
    /// Retrying cannot help — broken PDF, rejected request.
    Permanent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_aliases_parse() {
        assert_eq!("pymupdf".parse::<ConversionMethod>().unwrap(), ConversionMethod::Layout);
        assert_eq!("PDFPlumber".parse::<ConversionMethod>().unwrap(), ConversionMethod::RelativeFont);
        assert_eq!("docling".parse::<ConversionMethod>().unwrap(), ConversionMethod::DoclingServe);
        assert_eq!(" pymupdf4llm ".parse::<ConversionMethod>().unwrap(), ConversionMethod::PlainExtract);
    }

    #[test]
    fn unknown_method_is_an_error_but_lenient_falls_back() {
        assert!(matches!(
            "mistral-ocr".parse::<ConversionMethod>(),
            Err(ConverterError::UnsupportedMethod(_))
        ));
        assert_eq!(ConversionMethod::parse_lenient("mistral-ocr"), ConversionMethod::Layout);
    }

    #[test]
    fn canonical_names_round_trip() {
        for method in [
            ConversionMethod::Layout,
            ConversionMethod::RelativeFont,
            ConversionMethod::DoclingServe,
            ConversionMethod::PlainExtract,
        ] {
            assert_eq!(method.as_str().parse::<ConversionMethod>().unwrap(), method);
        }
    }

    #[test]
    fn text_method_defaults_to_lopdf() {
        assert_eq!(TextMethod::parse_lenient("pdfplumber"), TextMethod::PdfExtract);
        assert_eq!(TextMethod::parse_lenient("whatever"), TextMethod::Lopdf);
        assert_eq!(TextMethod::default(), TextMethod::Lopdf);
    }

    #[test]
    fn only_docling_needs_the_network() {
        assert!(ConversionMethod::DoclingServe.is_remote());
        assert!(!ConversionMethod::Layout.is_remote());
        assert!(!ConversionMethod::PlainExtract.is_remote());
    }

    #[test]
    fn output_kind_mime_types() {
        assert_eq!(OutputKind::from_extension("MD"), Some(OutputKind::Markdown));
        assert_eq!(OutputKind::from_extension(OutputKind::Text.extension()), Some(OutputKind::Text));
        assert_eq!(OutputKind::Zip.mime_type(), "application/zip");
        assert_eq!(OutputKind::from_extension("docx"), None);
    }
}
