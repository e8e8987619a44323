//! Content stream interpretation: text operators to positioned runs.
//!
//! Only the state that affects where text lands and how large it is gets
//! tracked (CTM stack, text and line matrices, font, leading, spacing).
//! Glyph widths are estimated rather than read from font metrics.

use std::collections::HashMap;

use crate::error::Result;
use crate::model::TextRun;

use super::backend::{get_number_from_value, ContentOp, MediaBox, PageId, PdfBackend, PdfValue};

/// Fraction of the font size above the baseline used as the glyph top.
const ASCENT: f32 = 0.8;

/// Estimated glyph advance as a fraction of the font size.
const AVG_CHAR_WIDTH: f32 = 0.5;

/// `TJ` adjustments beyond this (thousandths of an em) read as word gaps.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other`
    fn then(&self, other: &Matrix) -> Matrix {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    fn vertical_scale(&self) -> f32 {
        let [_, _, c, d, _, _] = self.0;
        (c * c + d * d).sqrt()
    }

    fn from_operands(operands: &[PdfValue]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        let mut m = [0.0; 6];
        for (slot, value) in m.iter_mut().zip(operands) {
            *slot = get_number_from_value(value)?;
        }
        Some(Matrix(m))
    }
}

/// A run in PDF user space, before flipping to top-left coordinates.
#[derive(Debug, Clone)]
struct RawRun {
    text: String,
    x: f32,
    baseline: f32,
    width: f32,
    size: f32,
    font_name: String,
}

#[derive(Debug, Clone)]
struct TextState {
    font_resource: Vec<u8>,
    font_name: String,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_resource: Vec::new(),
            font_name: String::new(),
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// Interprets a page's content stream into [`TextRun`]s.
pub struct GlyphInterpreter<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
    page: PageId,
    fonts: HashMap<Vec<u8>, String>,
    ctm: Matrix,
    ctm_stack: Vec<(Matrix, TextState)>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    state: TextState,
    in_text_block: bool,
    runs: Vec<RawRun>,
}

impl<'a, B: PdfBackend + ?Sized> GlyphInterpreter<'a, B> {
    /// Create an interpreter for one page.
    pub fn new(backend: &'a B, page: PageId) -> Self {
        let fonts = match backend.page_fonts(page) {
            Ok(fonts) => fonts
                .into_iter()
                .map(|f| (f.name, f.base_font))
                .collect(),
            Err(e) => {
                log::debug!("No font table for page {:?}: {}", page, e);
                HashMap::new()
            }
        };

        Self {
            backend,
            page,
            fonts,
            ctm: Matrix::IDENTITY,
            ctm_stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            state: TextState::default(),
            in_text_block: false,
            runs: Vec::new(),
        }
    }

    /// Decode the page's content stream and interpret it.
    pub fn run(self, media_box: Option<MediaBox>) -> Result<Vec<TextRun>> {
        let content = self.backend.page_content(self.page)?;
        let ops = self.backend.decode_content(&content)?;
        Ok(self.interpret(&ops, media_box))
    }

    /// Interpret already decoded operations.
    pub fn interpret(mut self, ops: &[ContentOp], media_box: Option<MediaBox>) -> Vec<TextRun> {
        for op in ops {
            self.apply(op);
        }
        flip_runs(self.runs, media_box)
    }

    fn apply(&mut self, op: &ContentOp) {
        let num = |i: usize| op.operands.get(i).and_then(get_number_from_value);

        match op.operator.as_str() {
            "q" => self.ctm_stack.push((self.ctm, self.state.clone())),
            "Q" => {
                if let Some((ctm, state)) = self.ctm_stack.pop() {
                    self.ctm = ctm;
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    self.ctm = m.then(&self.ctm);
                }
            }
            "BT" => {
                self.in_text_block = true;
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "ET" => self.in_text_block = false,
            "Tf" => {
                if let Some(PdfValue::Name(resource)) = op.operands.first() {
                    self.state.font_name = self
                        .fonts
                        .get(resource)
                        .cloned()
                        .unwrap_or_else(|| String::from_utf8_lossy(resource).to_string());
                    self.state.font_resource = resource.clone();
                }
                if let Some(size) = num(1) {
                    self.state.font_size = size;
                }
            }
            "Tc" => self.state.char_spacing = num(0).unwrap_or(0.0),
            "Tw" => self.state.word_spacing = num(0).unwrap_or(0.0),
            "Tz" => self.state.horizontal_scale = num(0).unwrap_or(100.0) / 100.0,
            "TL" => self.state.leading = num(0).unwrap_or(0.0),
            "Ts" => self.state.rise = num(0).unwrap_or(0.0),
            "Td" => self.move_line(num(0).unwrap_or(0.0), num(1).unwrap_or(0.0)),
            "TD" => {
                let ty = num(1).unwrap_or(0.0);
                self.state.leading = -ty;
                self.move_line(num(0).unwrap_or(0.0), ty);
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show(&[PdfValue::Str(bytes.clone())]);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    self.show(items);
                }
            }
            "'" => {
                self.next_line();
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show(&[PdfValue::Str(bytes.clone())]);
                }
            }
            "\"" => {
                self.state.word_spacing = num(0).unwrap_or(self.state.word_spacing);
                self.state.char_spacing = num(1).unwrap_or(self.state.char_spacing);
                self.next_line();
                if let Some(PdfValue::Str(bytes)) = op.operands.get(2) {
                    self.show(&[PdfValue::Str(bytes.clone())]);
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.state.leading);
    }

    /// Show a `TJ`-style sequence of strings and kerning adjustments.
    fn show(&mut self, items: &[PdfValue]) {
        if !self.in_text_block {
            return;
        }

        let rendering = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, self.state.rise])
            .then(&self.text_matrix)
            .then(&self.ctm);
        let (start_x, start_y) = rendering.apply(0.0, 0.0);
        let size = self.state.font_size * rendering.vertical_scale();

        let mut text = String::new();
        let mut advance = 0.0;
        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    let decoded =
                        self.backend
                            .decode_text(self.page, &self.state.font_resource, bytes);
                    advance += self.string_advance(&decoded);
                    text.push_str(&decoded);
                }
                other => {
                    let Some(adjustment) = get_number_from_value(other) else {
                        continue;
                    };
                    advance -= adjustment / 1000.0
                        * self.state.font_size
                        * self.state.horizontal_scale;
                    if -adjustment > TJ_SPACE_THRESHOLD && needs_space(&text) {
                        text.push(' ');
                    }
                }
            }
        }

        self.text_matrix = Matrix::translation(advance, 0.0).then(&self.text_matrix);
        let end = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, self.state.rise])
            .then(&self.text_matrix)
            .then(&self.ctm);
        let (end_x, _) = end.apply(0.0, 0.0);

        if text.trim().is_empty() {
            return;
        }

        self.runs.push(RawRun {
            text,
            x: start_x,
            baseline: start_y,
            width: (end_x - start_x).abs(),
            size,
            font_name: self.state.font_name.clone(),
        });
    }

    fn string_advance(&self, s: &str) -> f32 {
        let per_char = AVG_CHAR_WIDTH * self.state.font_size + self.state.char_spacing;
        let spaces = s.chars().filter(|&c| c == ' ').count() as f32;
        let chars = s.chars().count() as f32;
        (chars * per_char + spaces * self.state.word_spacing) * self.state.horizontal_scale
    }
}

/// Interpret a page of a backend into runs.
pub fn extract_runs<B: PdfBackend + ?Sized>(
    backend: &B,
    page: PageId,
    media_box: Option<MediaBox>,
) -> Result<Vec<TextRun>> {
    GlyphInterpreter::new(backend, page).run(media_box)
}

/// Convert baselines to top offsets measured from the page's top edge.
///
/// Without a media box the highest glyph top stands in for the page edge.
fn flip_runs(runs: Vec<RawRun>, media_box: Option<MediaBox>) -> Vec<TextRun> {
    let (left, edge) = match media_box {
        Some(mb) => (mb.left, mb.top),
        None => (
            0.0,
            runs.iter()
                .map(|r| r.baseline + r.size * ASCENT)
                .fold(0.0, f32::max),
        ),
    };

    runs.into_iter()
        .map(|r| TextRun {
            top: edge - (r.baseline + r.size * ASCENT),
            x: r.x - left,
            text: r.text,
            width: r.width,
            size: r.size,
            font_name: r.font_name,
        })
        .collect()
}

fn needs_space(text: &str) -> bool {
    match text.chars().last() {
        Some(c) => !c.is_whitespace() && !is_spaceless_script_char(c),
        None => false,
    }
}

/// Scripts that don't separate words with spaces (Han, Kana).
fn is_spaceless_script_char(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        | 0x20000..=0x2EBEF
        | 0x3040..=0x30FF
        | 0x3000..=0x303F)
}
