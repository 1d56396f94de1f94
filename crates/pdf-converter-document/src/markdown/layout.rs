// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Absolute-size heading heuristics.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::pdf::LayoutLine;

/// Lines set larger than this are headings regardless of their length.
pub const HEADING_MIN_SIZE: f32 = 12.0;
/// Short lines without closing punctuation are treated as heading candidates.
const SHORT_LINE_CHARS: usize = 80;
const CLOSING_PUNCTUATION: [char; 6] = ['.', ',', ';', ':', '?', '!'];

static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n{3,}").expect("static regex")
});

/// Render laid-out lines as Markdown.
///
/// Heading levels follow font size (`>= 18` → `#`, `>= 16` → `##`,
/// `>= 14` → `###`), bold lines become `**strong**`, and a thematic break
/// separates pages.
pub fn to_markdown(lines: &[LayoutLine]) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut previous_page: Option<u32> = None;

    for line in lines {
        let text = line.text();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        if previous_page.is_some_and(|page| page != line.page) {
            blocks.push("---".to_string());
        }
        previous_page = Some(line.page);

        blocks.push(format_line(text, line.font_size(), line.is_bold()));
    }

    debug!(lines = lines.len(), blocks = blocks.len(), "layout markdown assembled");
    collapse_newlines(&blocks.join("\n\n"))
}

fn format_line(text: &str, font_size: f32, bold: bool) -> String {
    let is_heading = font_size > HEADING_MIN_SIZE;
    let looks_like_title =
        text.chars().count() < SHORT_LINE_CHARS && !text.ends_with(CLOSING_PUNCTUATION);

    if is_heading || looks_like_title {
        if font_size >= 18.0 {
            return format!("# {text}");
        }
        if font_size >= 16.0 {
            return format!("## {text}");
        }
        if font_size >= 14.0 {
            return format!("### {text}");
        }
    }
    if bold {
        format!("**{text}**")
    } else {
        text.to_string()
    }
}

/// Collapse runs of three or more newlines into a single blank line.
pub fn collapse_newlines(markdown: &str) -> String {
    EXCESS_NEWLINES.replace_all(markdown, "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_levels_follow_font_size() {
        let lines = vec![
            LayoutLine::single(1, "Title", 24.0, true),
            LayoutLine::single(1, "Section", 16.5, false),
            LayoutLine::single(1, "Subsection", 14.0, false),
            LayoutLine::single(1, "Body text that ends with a full stop.", 11.0, false),
        ];
        assert_eq!(
            to_markdown(&lines),
            "# Title\n\n## Section\n\n### Subsection\n\nBody text that ends with a full stop."
        );
    }

    #[test]
    fn bold_lines_become_strong() {
        let lines = vec![
            LayoutLine::single(1, "Key point", 11.0, true),
            LayoutLine::single(1, "A bold sentence that closes with punctuation.", 11.0, true),
        ];
        assert_eq!(
            to_markdown(&lines),
            "**Key point**\n\n**A bold sentence that closes with punctuation.**"
        );
    }

    #[test]
    fn large_sentence_is_still_a_heading() {
        // Over the heading threshold, punctuation does not matter.
        let lines = vec![LayoutLine::single(1, "Welcome to the report.", 20.0, false)];
        assert_eq!(to_markdown(&lines), "# Welcome to the report.");
    }

    #[test]
    fn long_plain_line_between_12_and_14_stays_text() {
        let text = "x".repeat(90);
        let lines = vec![LayoutLine::single(1, text.clone(), 13.0, false)];
        assert_eq!(to_markdown(&lines), text);
    }

    #[test]
    fn pages_are_separated_by_a_rule() {
        let lines = vec![
            LayoutLine::single(1, "End of page one.", 11.0, false),
            LayoutLine::single(2, "Start of page two.", 11.0, false),
            LayoutLine::single(2, "More on page two.", 11.0, false),
        ];
        assert_eq!(
            to_markdown(&lines),
            "End of page one.\n\n---\n\nStart of page two.\n\nMore on page two."
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        let lines = vec![
            LayoutLine::single(1, "   ", 30.0, true),
            LayoutLine::single(1, "Text.", 11.0, false),
        ];
        assert_eq!(to_markdown(&lines), "Text.");
    }

    #[test]
    fn collapse_newlines_keeps_single_blank_line() {
        assert_eq!(collapse_newlines("a\n\n\n\nb\n\nc"), "a\n\nb\n\nc");
    }
}
