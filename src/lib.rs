//! # pdfoutline
//!
//! Structured outline extraction from PDF documents.
//!
//! Each page is turned into a flat list of heading, paragraph, table and
//! image nodes. Headings are found by scoring every visual line on font
//! size, boldness, vertical position and capitalization; each node carries
//! the section and subsection labels active when it was emitted.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfoutline::{convert, render};
//!
//! fn main() -> pdfoutline::Result<()> {
//!     let pages = convert("document.pdf", "images")?;
//!     let json = render::to_json(&pages, render::JsonFormat::Pretty)?;
//!     println!("{}", json);
//!     Ok(())
//! }
//! ```
//!
//! ## Limitations
//!
//! - Within a page, text nodes come first, then tables, then images.
//! - Tables are tagged with the section active at the end of their page.
//! - Lines are grouped by vertical position only, so side-by-side columns
//!   sharing a baseline merge into one line.

pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;

pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, PdfFormat};
pub use error::{Error, Result};
pub use model::{
    ContentNode, ExtractedImage, Glyph, HeadingCandidate, PageContent, PageStats, ScoredLine,
    TextRun, VisualLine,
};
pub use parser::{ErrorMode, HeadingOptions, PageSelection, ParseOptions, PdfParser};
pub use render::JsonFormat;

use std::path::{Path, PathBuf};

/// Convert a PDF file into per-page outline content.
///
/// Images are written to `image_dir`, which is created if needed. Pages
/// without any content are left out.
///
/// # Example
///
/// ```no_run
/// let pages = pdfoutline::convert("report.pdf", "out/images").unwrap();
/// for page in &pages {
///     println!("page {}: {} nodes", page.page_number, page.content.len());
/// }
/// ```
pub fn convert<P: AsRef<Path>>(path: P, image_dir: impl Into<PathBuf>) -> Result<Vec<PageContent>> {
    convert_with_options(path, ParseOptions::new().with_image_dir(image_dir))
}

/// Convert a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use pdfoutline::{convert_with_options, ParseOptions, PageSelection};
///
/// let options = ParseOptions::new()
///     .with_pages(PageSelection::parse("1-3").unwrap())
///     .with_score_threshold(0.5)
///     .text_only();
/// let pages = convert_with_options("report.pdf", options).unwrap();
/// ```
pub fn convert_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Vec<PageContent>> {
    PdfParser::open_with_options(path, options)?.parse()
}

/// Convert a PDF held in memory.
pub fn convert_bytes(data: &[u8], options: ParseOptions) -> Result<Vec<PageContent>> {
    PdfParser::from_bytes_with_options(data, options)?.parse()
}

/// Convert a single page (1-indexed).
///
/// Unlike [`convert`], an empty page is returned rather than omitted.
pub fn extract_page<P: AsRef<Path>>(path: P, page: u32, options: &ParseOptions) -> Result<PageContent> {
    PdfParser::open_with_options(path, options.clone())?.parse_page(page)
}

/// Score every line of a PDF for heading likelihood.
///
/// Returns the lines classified as headings and the full scored list,
/// sorted by page, then top, then descending score.
pub fn detect_headings<P: AsRef<Path>>(
    path: P,
    heading: &HeadingOptions,
    pages: &PageSelection,
) -> Result<(Vec<HeadingCandidate>, Vec<ScoredLine>)> {
    let options = ParseOptions::new()
        .with_heading(*heading)
        .with_pages(pages.clone())
        .text_only();
    PdfParser::open_with_options(path, options)?.detect_headings()
}
