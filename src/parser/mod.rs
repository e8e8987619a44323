//! PDF parsing module.
//!
//! The pipeline per page: [`glyphs`] interprets the content stream into
//! positioned runs, [`lines`] groups their characters into visual lines,
//! [`headings`] scores the lines, [`segment`] builds heading and paragraph
//! nodes, while [`tables`] and [`images`] extract the remaining nodes.

pub mod backend;
pub mod glyphs;
pub mod headings;
pub mod images;
pub mod lines;
mod options;
mod pdf_parser;
pub mod segment;
pub mod tables;

pub use backend::{LopdfBackend, MediaBox, PageId, PdfBackend};
pub use glyphs::extract_runs;
pub use headings::{HeadingClassifier, PageClassification};
pub use images::extract_page_images;
pub use lines::aggregate_lines;
pub use options::{ErrorMode, HeadingOptions, PageSelection, ParseOptions};
pub use pdf_parser::PdfParser;
pub use segment::{segment_page, SegmentedPage};
pub use tables::{DetectedTable, TableDetector, TableDetectorConfig};
