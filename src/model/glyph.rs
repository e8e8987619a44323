//! Positioned text produced by the content stream interpreter.

use serde::{Deserialize, Serialize};

/// A single decoded character.
///
/// Only the vertical position is kept; lines are grouped by `top` alone.
/// The `top` coordinate uses a top-left origin: `top` grows downwards from the top
/// edge of the page, like the offsets a reader sees on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    /// The decoded character
    pub text: char,
    /// Vertical offset of the glyph's top from the page top
    pub top: f32,
    /// Effective font size in points
    pub size: f32,
    /// Base font name (e.g., "ABCDEF+Helvetica-Bold")
    pub font_name: String,
}

impl Glyph {
    /// Create a new glyph.
    pub fn new(text: char, top: f32, size: f32, font_name: impl Into<String>) -> Self {
        Self {
            text,
            top,
            size,
            font_name: font_name.into(),
        }
    }
}

/// A string shown by a single text operator (`Tj`, `TJ`, `'`, `"`).
///
/// Runs keep horizontal extent, which the table extractor needs; the line
/// aggregator works on the per-character [`Glyph`]s split from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The decoded text
    pub text: String,
    /// Left edge
    pub x: f32,
    /// Vertical offset of the run's top from the page top
    pub top: f32,
    /// Estimated advance width
    pub width: f32,
    /// Effective font size in points
    pub size: f32,
    /// Base font name
    pub font_name: String,
}

impl TextRun {
    /// Right edge of the run.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Split the run into one glyph per character.
    pub fn glyphs(&self) -> impl Iterator<Item = Glyph> + '_ {
        self.text.chars().map(move |ch| Glyph {
            text: ch,
            top: self.top,
            size: self.size,
            font_name: self.font_name.clone(),
        })
    }
}

/// Flatten runs into glyphs, preserving content stream order.
pub fn runs_to_glyphs(runs: &[TextRun]) -> Vec<Glyph> {
    runs.iter().flat_map(TextRun::glyphs).collect()
}
