//! Data model shared by the extraction pipeline.
//!
//! Glyphs and lines are per-page intermediates; [`PageContent`] is the only
//! type that leaves a conversion and is what gets serialized to JSON.

mod content;
mod glyph;
mod image;
mod line;

pub use content::{ContentNode, PageContent};
pub use glyph::{runs_to_glyphs, Glyph, TextRun};
pub use image::ExtractedImage;
pub use line::{HeadingCandidate, PageStats, ScoredLine, VisualLine};

pub(crate) use line::round_to;
