// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdf-converter-remote — Network access for pdf-converter.
//
// Downloads PDFs over HTTP with automatic retries and talks to a docling-serve
// instance for server-side conversion.

pub mod docling;
pub mod download;
pub mod retry;

pub use docling::{DoclingClient, DoclingOptions};
pub use download::PdfDownloader;
pub use retry::{RetryConfig, RetryDecision};
