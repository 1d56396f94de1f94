// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-relative heading heuristics: a line is a heading when it is set
// noticeably larger than the page's average character.

use std::collections::BTreeMap;

use crate::pdf::LayoutLine;

/// Assumed average size for pages without measurable text.
pub const DEFAULT_AVERAGE_SIZE: f32 = 12.0;
/// How much larger than average a heading must be.
pub const HEADING_RATIO: f32 = 1.2;

/// Render laid-out lines as Markdown, one output line per input line.
///
/// Every page is closed with a `---` rule.
pub fn to_markdown(lines: &[LayoutLine]) -> String {
    let mut pages: BTreeMap<u32, Vec<&LayoutLine>> = BTreeMap::new();
    for line in lines {
        pages.entry(line.page).or_default().push(line);
    }

    let mut out: Vec<String> = Vec::new();
    for page_lines in pages.values() {
        let average = average_font_size(page_lines);
        for line in page_lines {
            let text = line.text();
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            if line.font_size() > average * HEADING_RATIO {
                out.push(format!("\n# {text}\n"));
            } else {
                out.push(text.to_string());
            }
        }
        out.push("\n---\n".to_string());
    }
    out.join("\n")
}

/// Character-weighted mean font size of visible text.
pub fn average_font_size(lines: &[&LayoutLine]) -> f32 {
    let (weighted, chars) = lines
        .iter()
        .flat_map(|line| line.visible_spans())
        .fold((0.0f32, 0usize), |(sum, count), span| {
            let n = span.text.chars().filter(|c| !c.is_whitespace()).count();
            (sum + span.font_size * n as f32, count + n)
        });
    if chars == 0 {
        DEFAULT_AVERAGE_SIZE
    } else {
        weighted / chars as f32
    }
}
