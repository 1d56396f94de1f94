// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — opening documents and recovering styled text lines.

pub mod content;
pub(crate) mod fonts;
pub mod reader;

pub use content::{LayoutLine, TextSpan};
pub use reader::PdfReader;
