// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pdf-converter.

use thiserror::Error;

/// Top-level error type for all conversion operations.
#[derive(Debug, Error)]
pub enum ConverterError {
    // -- Method selection --
    #[error("unsupported conversion method: {0}")]
    UnsupportedMethod(String),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF rendering failed: {0}")]
    RenderError(String),

    // -- Network --
    #[error("download failed: {0}")]
    Download(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("docling-serve conversion failed: {0}")]
    Docling(String),

    // -- Configuration --
    #[error("{0} is not set")]
    MissingConfig(&'static str),

    // -- Packaging / tables --
    #[error("archive error: {0}")]
    Archive(String),

    #[error("CSV error: {0}")]
    Table(String),

    #[error("column not found: {0}")]
    UnknownColumn(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ConverterError>;
