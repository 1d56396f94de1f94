// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-stream walker — turns text-showing operators into lines of styled
// spans, tracking the text and graphics matrices closely enough to know each
// span's effective font size and baseline.

use std::rc::Rc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object};
use tracing::{trace, warn};

use super::fonts::{self, FontInfo, FontMap};

/// TJ adjustments below this (thousandths of an em) read as word gaps.
const TJ_SPACE_THRESHOLD: f32 = -200.0;
/// Form XObjects nested deeper than this are ignored.
const MAX_FORM_DEPTH: usize = 8;

type Matrix = [f32; 6];
const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// A run of text sharing one font and size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// Effective size in points after text and graphics scaling.
    pub font_size: f32,
    pub font_name: String,
    pub bold: bool,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, font_size: f32, bold: bool) -> Self {
        Self {
            text: text.into(),
            font_size,
            font_name: String::new(),
            bold,
        }
    }
}

/// One visual line of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    /// 1-indexed page number.
    pub page: u32,
    pub spans: Vec<TextSpan>,
}

impl LayoutLine {
    pub fn new(page: u32, spans: Vec<TextSpan>) -> Self {
        Self { page, spans }
    }

    /// A line made of a single span.
    pub fn single(page: u32, text: impl Into<String>, font_size: f32, bold: bool) -> Self {
        Self::new(page, vec![TextSpan::new(text, font_size, bold)])
    }

    /// Concatenated text of all spans.
    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    /// Largest font size among spans carrying visible text.
    pub fn font_size(&self) -> f32 {
        self.visible_spans()
            .map(|span| span.font_size)
            .fold(0.0, f32::max)
    }

    /// True when any visible span uses a bold font.
    pub fn is_bold(&self) -> bool {
        self.visible_spans().any(|span| span.bold)
    }

    pub(crate) fn visible_spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.spans.iter().filter(|span| !span.text.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
struct TextState {
    font: Option<Rc<FontInfo>>,
    font_size: f32,
    leading: f32,
    tm: Matrix,
    tlm: Matrix,
    ctm: Matrix,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 0.0,
            leading: 0.0,
            tm: IDENTITY,
            tlm: IDENTITY,
            ctm: IDENTITY,
        }
    }
}

/// Walks the operators of one page, collecting [`LayoutLine`]s.
pub(crate) struct PageWalker<'a> {
    doc: &'a Document,
    page: u32,
    state: TextState,
    stack: Vec<TextState>,
    lines: Vec<LayoutLine>,
    current: Vec<TextSpan>,
    baseline: Option<f32>,
    moved: bool,
}

impl<'a> PageWalker<'a> {
    pub(crate) fn new(doc: &'a Document, page: u32) -> Self {
        Self {
            doc,
            page,
            state: TextState::default(),
            stack: Vec::new(),
            lines: Vec::new(),
            current: Vec::new(),
            baseline: None,
            moved: false,
        }
    }

    /// Process a decoded operator list with the given resources.
    pub(crate) fn run(&mut self, operations: &[Operation], resources: Option<&Dictionary>, depth: usize) {
        let fonts = fonts::collect_fonts(self.doc, resources);

        for op in operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => self.stack.push(self.state.clone()),
                "Q" => {
                    if let Some(saved) = self.stack.pop() {
                        self.state = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix(operands) {
                        self.state.ctm = multiply(&m, &self.state.ctm);
                    }
                }
                "BT" => {
                    self.state.tm = IDENTITY;
                    self.state.tlm = IDENTITY;
                }
                "Tf" => self.set_font(operands, &fonts),
                "TL" => {
                    if let Some(leading) = operands.first().and_then(fonts::number) {
                        self.state.leading = leading;
                    }
                }
                "Td" => {
                    if let (Some(tx), Some(ty)) = (arg(operands, 0), arg(operands, 1)) {
                        self.translate_line(tx, ty);
                    }
                }
                "TD" => {
                    if let (Some(tx), Some(ty)) = (arg(operands, 0), arg(operands, 1)) {
                        self.state.leading = -ty;
                        self.translate_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix(operands) {
                        self.state.tm = m;
                        self.state.tlm = m;
                        self.moved = true;
                    }
                }
                "T*" => self.next_line(),
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(bytes);
                    }
                }
                "'" => {
                    self.next_line();
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(bytes);
                    }
                }
                "\"" => {
                    self.next_line();
                    if let Some(Object::String(bytes, _)) = operands.get(2) {
                        self.show(bytes);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        self.show_array(items);
                    }
                }
                "Do" => self.draw_form(operands, resources, depth),
                _ => {}
            }
        }
    }

    /// Flush the pending line and return everything collected.
    pub(crate) fn finish(mut self) -> Vec<LayoutLine> {
        self.flush_line();
        self.lines
    }

    fn set_font(&mut self, operands: &[Object], fonts: &FontMap) {
        if let Some(Object::Name(name)) = operands.first() {
            self.state.font = fonts.get(name).cloned();
            if self.state.font.is_none() {
                trace!(resource = %String::from_utf8_lossy(name), "font resource not found");
            }
        }
        if let Some(size) = operands.get(1).and_then(fonts::number) {
            self.state.font_size = size;
        }
    }

    fn translate_line(&mut self, tx: f32, ty: f32) {
        let translation = [1.0, 0.0, 0.0, 1.0, tx, ty];
        self.state.tlm = multiply(&translation, &self.state.tlm);
        self.state.tm = self.state.tlm;
        self.moved = true;
    }

    fn next_line(&mut self) {
        let leading = self.state.leading;
        self.translate_line(0.0, -leading);
    }

    fn effective_size(&self) -> f32 {
        let text_scale = self.state.tm[2].hypot(self.state.tm[3]);
        let page_scale = self.state.ctm[2].hypot(self.state.ctm[3]);
        (self.state.font_size * text_scale * page_scale).abs()
    }

    /// Baseline position in device space.
    fn current_baseline(&self) -> f32 {
        let [_, _, _, _, e, f] = self.state.tm;
        let ctm = &self.state.ctm;
        ctm[1] * e + ctm[3] * f + ctm[5]
    }

    fn decode(&self, bytes: &[u8]) -> String {
        match &self.state.font {
            Some(font) => font.decode(self.doc, bytes),
            None => fonts::decode_plain(bytes),
        }
    }

    fn show(&mut self, bytes: &[u8]) {
        let text = self.decode(bytes);
        self.push_text(text);
    }

    fn show_array(&mut self, items: &[Object]) {
        let mut text = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => text.push_str(&self.decode(bytes)),
                other => {
                    if let Some(adjust) = fonts::number(other) {
                        if adjust < TJ_SPACE_THRESHOLD && !text.ends_with(' ') {
                            text.push(' ');
                        }
                    }
                }
            }
        }
        self.push_text(text);
    }

    fn push_text(&mut self, mut text: String) {
        if text.is_empty() {
            return;
        }
        let size = self.effective_size();
        let baseline = self.current_baseline();
        let tolerance = (size * 0.3).max(1.0);

        match self.baseline {
            Some(previous) if (previous - baseline).abs() <= tolerance => {
                let previous_ends_blank = self
                    .current
                    .last()
                    .is_none_or(|span| span.text.ends_with(char::is_whitespace));
                if self.moved && !previous_ends_blank && !text.starts_with(char::is_whitespace) {
                    text.insert(0, ' ');
                }
            }
            Some(_) => {
                self.flush_line();
                self.baseline = Some(baseline);
            }
            None => self.baseline = Some(baseline),
        }
        self.moved = false;

        let (font_name, bold) = match &self.state.font {
            Some(font) => (font.base_font.clone(), font.bold),
            None => (String::new(), false),
        };

        let same_style = self.current.last().is_some_and(|last| {
            last.font_name == font_name && (last.font_size - size).abs() < 0.01 && last.bold == bold
        });
        if let (true, Some(last)) = (same_style, self.current.last_mut()) {
            last.text.push_str(&text);
            return;
        }
        self.current.push(TextSpan {
            text,
            font_size: size,
            font_name,
            bold,
        });
    }

    fn flush_line(&mut self) {
        if !self.current.is_empty() {
            let spans = std::mem::take(&mut self.current);
            self.lines.push(LayoutLine::new(self.page, spans));
        }
        self.baseline = None;
    }

    fn draw_form(&mut self, operands: &[Object], resources: Option<&Dictionary>, depth: usize) {
        if depth >= MAX_FORM_DEPTH {
            warn!(depth, "form XObject nesting too deep, skipping");
            return;
        }
        let Some(Object::Name(name)) = operands.first() else {
            return;
        };
        let doc = self.doc;
        let Some(stream) = resources
            .and_then(|res| res.get(b"XObject").ok())
            .and_then(|obj| fonts::resolve(doc, obj).as_dict().ok())
            .and_then(|xobjects| xobjects.get(name).ok())
            .and_then(|obj| fonts::resolve(doc, obj).as_stream().ok())
        else {
            return;
        };
        let is_form = matches!(
            stream.dict.get(b"Subtype").ok().and_then(|s| s.as_name().ok()),
            Some(b"Form")
        );
        if !is_form {
            return;
        }

        let content = match Content::decode(&fonts::stream_bytes(stream)) {
            Ok(content) => content,
            Err(err) => {
                warn!(%err, "cannot decode form XObject content");
                return;
            }
        };
        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|obj| fonts::resolve(doc, obj).as_dict().ok())
            .or(resources);

        self.stack.push(self.state.clone());
        if let Some(m) = stream.dict.get(b"Matrix").ok().and_then(|m| m.as_array().ok()).and_then(|m| matrix(m)) {
            self.state.ctm = multiply(&m, &self.state.ctm);
        }
        self.run(&content.operations, form_resources, depth + 1);
        if let Some(saved) = self.stack.pop() {
            self.state = saved;
        }
    }
}

fn arg(operands: &[Object], index: usize) -> Option<f32> {
    operands.get(index).and_then(fonts::number)
}

fn matrix(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for (slot, obj) in m.iter_mut().zip(operands) {
        *slot = fonts::number(obj)?;
    }
    Some(m)
}

/// `a × b` for PDF's row-vector affine matrices.
fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;

    fn walk(ops: Vec<Operation>) -> Vec<LayoutLine> {
        let doc = Document::with_version("1.5");
        let mut walker = PageWalker::new(&doc, 1);
        walker.run(&ops, None, 0);
        walker.finish()
    }

    fn op(name: &str, operands: Vec<Object>) -> Operation {
        Operation::new(name, operands)
    }

    #[test]
    fn baseline_change_starts_new_line() {
        let lines = walk(vec![
            op("BT", vec![]),
            op("Tf", vec!["F1".into(), 12.into()]),
            op("Td", vec![72.into(), 700.into()]),
            op("Tj", vec![Object::string_literal("First")]),
            op("Td", vec![0.into(), (-14).into()]),
            op("Tj", vec![Object::string_literal("Second")]),
            op("ET", vec![]),
        ]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "First");
        assert_eq!(lines[1].text(), "Second");
        assert_eq!(lines[0].font_size(), 12.0);
    }

    #[test]
    fn tj_gaps_become_spaces() {
        let lines = walk(vec![
            op("BT", vec![]),
            op("Tf", vec!["F1".into(), 10.into()]),
            op(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("Hello"),
                    (-300).into(),
                    Object::string_literal("world"),
                    (-20).into(),
                    Object::string_literal("!"),
                ])],
            ),
            op("ET", vec![]),
        ]);
        assert_eq!(lines[0].text(), "Hello world!");
    }

    #[test]
    fn text_matrix_scales_font_size() {
        let lines = walk(vec![
            op("BT", vec![]),
            op("Tf", vec!["F1".into(), 1.into()]),
            op("Tm", vec![20.into(), 0.into(), 0.into(), 20.into(), 50.into(), 600.into()]),
            op("Tj", vec![Object::string_literal("Scaled")]),
            op("ET", vec![]),
        ]);
        assert_eq!(lines[0].font_size(), 20.0);
    }

    #[test]
    fn horizontal_move_on_same_baseline_inserts_space() {
        let lines = walk(vec![
            op("BT", vec![]),
            op("Tf", vec!["F1".into(), 12.into()]),
            op("Td", vec![72.into(), 700.into()]),
            op("Tj", vec![Object::string_literal("Left")]),
            op("Td", vec![100.into(), 0.into()]),
            op("Tj", vec![Object::string_literal("Right")]),
            op("ET", vec![]),
        ]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "Left Right");
    }

    #[test]
    fn quote_operator_moves_to_next_line() {
        let lines = walk(vec![
            op("BT", vec![]),
            op("Tf", vec!["F1".into(), 12.into()]),
            op("TL", vec![14.into()]),
            op("Td", vec![72.into(), 700.into()]),
            op("Tj", vec![Object::string_literal("One")]),
            op("'", vec![Object::string_literal("Two")]),
            op("ET", vec![]),
        ]);
        assert_eq!(lines.iter().map(LayoutLine::text).collect::<Vec<_>>(), ["One", "Two"]);
    }

    #[test]
    fn multiply_applies_translation_after_scale() {
        let scale = [2.0, 0.0, 0.0, 2.0, 0.0, 0.0];
        let shift = [1.0, 0.0, 0.0, 1.0, 10.0, 5.0];
        assert_eq!(multiply(&scale, &shift), [2.0, 0.0, 0.0, 2.0, 10.0, 5.0]);
        assert_eq!(multiply(&shift, &scale), [2.0, 0.0, 0.0, 2.0, 20.0, 10.0]);
    }
}
