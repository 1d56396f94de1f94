// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Markdown renderer — lay out Markdown as a printable PDF using `printpdf` 0.8.
//
// The Markdown is first flattened into styled blocks with pulldown-cmark,
// then each block is word-wrapped and placed top to bottom with the built-in
// PDF fonts. Pages break automatically and at thematic breaks (`---`).

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use pdf_converter_core::error::{ConverterError, Result};
use printpdf::{BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use tracing::{debug, info, instrument, warn};

/// Paper sizes supported by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    /// Width and height in millimetres.
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::Letter => (215.9, 279.4),
        }
    }
}

impl FromStr for PageSize {
    type Err = ConverterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "letter" | "us-letter" => Ok(Self::Letter),
            other => Err(ConverterError::RenderError(format!("unknown paper size: {other}"))),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::A4 => "a4",
            Self::Letter => "letter",
        })
    }
}

// -- Block model --------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum BlockStyle {
    Heading(u8),
    Body,
    Strong,
    Code,
}

impl BlockStyle {
    fn font(self) -> BuiltinFont {
        match self {
            Self::Heading(_) | Self::Strong => BuiltinFont::HelveticaBold,
            Self::Body => BuiltinFont::Helvetica,
            Self::Code => BuiltinFont::Courier,
        }
    }

    fn size_pt(self) -> f32 {
        match self {
            Self::Heading(1) => 20.0,
            Self::Heading(2) => 16.0,
            Self::Heading(_) => 14.0,
            Self::Code => 10.0,
            Self::Body | Self::Strong => 11.0,
        }
    }

    /// Average glyph width as a fraction of the font size.
    fn glyph_width(self) -> f32 {
        match self {
            Self::Code => 0.60,
            Self::Heading(_) | Self::Strong => 0.55,
            Self::Body => 0.50,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Text { style: BlockStyle, text: String },
    PageBreak,
}

/// Collects pulldown-cmark events into flat styled blocks.
#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    buffer: String,
    heading: Option<u8>,
    in_code: bool,
    strong_depth: usize,
    strong_chars: usize,
    plain_chars: usize,
    list_depth: usize,
}

impl BlockBuilder {
    fn push_text(&mut self, text: &str) {
        let visible = text.chars().filter(|c| !c.is_whitespace()).count();
        if self.strong_depth > 0 {
            self.strong_chars += visible;
        } else {
            self.plain_chars += visible;
        }
        self.buffer.push_str(text);
    }

    fn flush(&mut self, style: BlockStyle) {
        let text = std::mem::take(&mut self.buffer);
        let (strong, plain) = (self.strong_chars, self.plain_chars);
        self.strong_chars = 0;
        self.plain_chars = 0;

        let text = match style {
            BlockStyle::Code => text.trim_end_matches('\n').to_string(),
            // List text starts with its indented bullet.
            _ if self.list_depth > 0 => text.trim_end().to_string(),
            _ => text.trim().to_string(),
        };
        let empty = match style {
            BlockStyle::Code => text.is_empty(),
            _ => strong + plain == 0,
        };
        if empty {
            return;
        }
        let style = if style == BlockStyle::Body && strong > 0 && plain == 0 {
            BlockStyle::Strong
        } else {
            style
        };
        self.blocks.push(Block::Text { style, text });
    }

    fn list_prefix(&self) -> String {
        format!("{}- ", "  ".repeat(self.list_depth.saturating_sub(1)))
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush(BlockStyle::Body);
                self.heading = Some(heading_number(level));
            }
            Event::End(TagEnd::Heading(_)) => {
                let level = self.heading.take().unwrap_or(3);
                self.flush(BlockStyle::Heading(level));
            }
            Event::Start(Tag::List(_)) => {
                self.flush(BlockStyle::Body);
                self.list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => {
                self.flush(BlockStyle::Body);
                self.list_depth = self.list_depth.saturating_sub(1);
            }
            Event::Start(Tag::Item) => {
                self.flush(BlockStyle::Body);
                let prefix = self.list_prefix();
                self.buffer.push_str(&prefix);
            }
            Event::End(TagEnd::Item) => self.flush(BlockStyle::Body),
            Event::Start(Tag::Paragraph) => {
                if self.list_depth == 0 {
                    self.flush(BlockStyle::Body);
                }
            }
            Event::End(TagEnd::Paragraph) => {
                if self.list_depth == 0 {
                    self.flush(BlockStyle::Body);
                } else {
                    self.buffer.push(' ');
                }
            }
            Event::Start(Tag::CodeBlock(_)) => {
                self.flush(BlockStyle::Body);
                self.in_code = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                self.in_code = false;
                self.flush(BlockStyle::Code);
            }
            Event::Start(Tag::Strong) => self.strong_depth += 1,
            Event::End(TagEnd::Strong) => self.strong_depth = self.strong_depth.saturating_sub(1),
            Event::Text(text) | Event::Code(text) => self.push_text(&text),
            Event::SoftBreak => {
                if self.in_code {
                    self.buffer.push('\n');
                } else {
                    self.buffer.push(' ');
                }
            }
            Event::HardBreak => self.buffer.push('\n'),
            Event::Rule => {
                self.flush(BlockStyle::Body);
                self.blocks.push(Block::PageBreak);
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush(BlockStyle::Body);
        self.blocks
    }
}

fn heading_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn parse_blocks(markdown: &str) -> Vec<Block> {
    let mut builder = BlockBuilder::default();
    for event in Parser::new(markdown) {
        builder.handle(event);
    }
    builder.finish()
}

// -- Renderer -------------------------------------------------------------------

/// Renders Markdown documents to PDF.
pub struct MarkdownRenderer {
    page_size: PageSize,
    title: Option<String>,
}

impl MarkdownRenderer {
    const MARGIN_MM: f32 = 20.0;
    const LINE_SPACING: f32 = 1.3;

    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            title: None,
        }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w, h) = self.page_size.dimensions_mm();
        (Mm(w), Mm(h))
    }

    /// Render Markdown into PDF bytes.
    #[instrument(skip(self, markdown), fields(markdown_len = markdown.len(), paper = %self.page_size))]
    pub fn render(&self, markdown: &str) -> Result<Vec<u8>> {
        let (page_w, page_h) = self.page_dimensions();
        let title = self.title.as_deref().unwrap_or("Converted Document");
        let blocks = parse_blocks(markdown);

        let margin_pt = Mm(Self::MARGIN_MM).into_pt().0;
        let usable_width_mm = page_w.0 - 2.0 * Self::MARGIN_MM;
        let page_h_pt = page_h.into_pt().0;
        let top = page_h_pt - margin_pt;

        let mut pages: Vec<PdfPage> = Vec::new();
        let mut ops: Vec<Op> = Vec::new();
        let mut y = top;

        for block in &blocks {
            let (style, text) = match block {
                Block::PageBreak => {
                    if !ops.is_empty() {
                        pages.push(PdfPage::new(page_w, page_h, std::mem::take(&mut ops)));
                        y = top;
                    }
                    continue;
                }
                Block::Text { style, text } => (*style, text),
            };

            let size = style.size_pt();
            let line_height = size * Self::LINE_SPACING;
            // 1pt = 0.3528mm
            let char_width_mm = style.glyph_width() * size * 0.3528;
            let max_chars = ((usable_width_mm / char_width_mm) as usize).max(1);

            // Paragraph spacing, skipped at the top of a page.
            if y < top {
                y -= line_height * 0.5;
            }

            for line in wrap_text(text, max_chars) {
                if y - line_height < margin_pt {
                    pages.push(PdfPage::new(page_w, page_h, std::mem::take(&mut ops)));
                    y = top;
                }
                y -= line_height;
                if line.is_empty() {
                    continue;
                }
                push_line(&mut ops, &line, style.font(), size, margin_pt, y);
            }
        }

        if !ops.is_empty() {
            pages.push(PdfPage::new(page_w, page_h, ops));
        }
        if pages.is_empty() {
            pages.push(PdfPage::new(page_w, page_h, Vec::new()));
        }

        let page_count = pages.len();
        let mut doc = PdfDocument::new(title);
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings");
        }

        debug!(blocks = blocks.len(), pages = page_count, "markdown layout complete");
        Ok(output)
    }

    /// Render Markdown and write the PDF to `path`.
    pub fn write_to_file(&self, markdown: &str, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.render(markdown)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote markdown PDF to {}", path.as_ref().display());
        Ok(())
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(PageSize::A4)
    }
}

fn push_line(ops: &mut Vec<Op>, line: &str, font: BuiltinFont, size: f32, x: f32, y: f32) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point { x: Pt(x), y: Pt(y) },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(size),
        font,
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(line.to_string())],
        font,
    });
    ops.push(Op::EndTextSection);
}

// -- Text wrapping helper -----------------------------------------------------

/// Wrap a multi-line string so that no line exceeds `max_width` characters.
///
/// Splits on existing newlines first, then performs simple word-wrap within each
/// paragraph. Words longer than `max_width` are force-broken on character
/// boundaries.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for paragraph in text.split('\n') {
        // Keep leading indentation so nested list items and code stay aligned.
        let indent: String = paragraph.chars().take_while(|c| *c == ' ').collect();
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut current_line = indent.clone();
        let mut current_len = indent.chars().count();
        let base_len = current_len;

        for word in words {
            let word_len = word.chars().count();
            if word_len > max_width.saturating_sub(base_len) {
                if current_len > base_len {
                    result.push(std::mem::replace(&mut current_line, indent.clone()));
                    current_len = base_len;
                }
                let chars: Vec<char> = word.chars().collect();
                let width = max_width.saturating_sub(base_len).max(1);
                let mut chunks = chars.chunks(width).peekable();
                while let Some(chunk) = chunks.next() {
                    let piece: String = chunk.iter().collect();
                    if chunks.peek().is_some() {
                        result.push(format!("{indent}{piece}"));
                    } else {
                        current_line.push_str(&piece);
                        current_len += chunk.len();
                    }
                }
            } else if current_len == base_len {
                current_line.push_str(word);
                current_len += word_len;
            } else if current_len + 1 + word_len <= max_width {
                current_line.push(' ');
                current_line.push_str(word);
                current_len += 1 + word_len;
            } else {
                result.push(std::mem::replace(&mut current_line, indent.clone()));
                current_line.push_str(word);
                current_len = base_len + word_len;
            }
        }

        if current_len > base_len {
            result.push(current_line);
        }
    }

    result
}
