// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — pull embedded raster images out of PDFs.

pub mod extract;

pub use extract::{ExtractedImage, ImageExtractor};
