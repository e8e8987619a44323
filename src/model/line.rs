//! Visual lines and their heading scores.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Glyphs of one page that share the same rounded `top`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualLine {
    /// 1-indexed page number
    pub page: u32,
    /// Rounded vertical offset (0.1 unit precision)
    pub top: f32,
    /// Concatenated glyph text, trimmed
    pub text: String,
    /// Mean glyph size, rounded to 0.1
    pub avg_size: f32,
    /// Distinct font names used on the line
    pub font_names: BTreeSet<String>,
}

/// Font-size and geometry statistics for one page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageStats {
    /// Page height in points (0 if unknown)
    pub page_height: f32,
    /// Most frequent glyph size
    pub common_size: f32,
    /// Largest glyph size
    pub largest_size: f32,
    /// Lower median glyph size
    pub median_size: f32,
}

/// A visual line with its heading score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredLine {
    /// The scored line
    #[serde(flatten)]
    pub line: VisualLine,
    /// Statistics of the page the line was scored against
    #[serde(flatten)]
    pub stats: PageStats,
    /// Size relative to the page's median/largest spread
    pub size_score: f32,
    /// 1.0 when any font on the line is a bold face
    pub bold_score: f32,
    /// Vertical position score (header zone floored)
    pub pos_score: f32,
    /// Uppercase ratio score
    pub upper_score: f32,
    /// Weighted total in [0, 1]
    pub score: f32,
    /// Whether the weighted total reached the threshold
    pub is_heading: bool,
}

impl ScoredLine {
    /// Line text.
    pub fn text(&self) -> &str {
        &self.line.text
    }

    /// Rounded average glyph size.
    pub fn avg_size(&self) -> f32 {
        self.line.avg_size
    }

    /// Compact form used in heading listings.
    pub fn to_candidate(&self, raw_score: f32) -> HeadingCandidate {
        HeadingCandidate {
            page: self.line.page,
            top: self.line.top,
            text: self.line.text.clone(),
            avg_size: self.line.avg_size,
            score: round_to(raw_score, 3),
        }
    }
}

/// A line classified as a heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingCandidate {
    /// 1-indexed page number
    pub page: u32,
    /// Rounded vertical offset
    pub top: f32,
    /// Heading text
    pub text: String,
    /// Rounded average glyph size
    pub avg_size: f32,
    /// Weighted score, rounded to three decimals
    pub score: f32,
}

/// Round to a fixed number of decimal places.
pub(crate) fn round_to(value: f32, decimals: i32) -> f32 {
    let factor = 10f32.powi(decimals);
    (value * factor).round() / factor
}
