// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Markdown heuristics over laid-out PDF lines.
//
// `layout` reads heading levels from absolute font sizes and bold fonts;
// `relative` compares each line against its page's average size.

pub mod layout;
pub mod relative;
