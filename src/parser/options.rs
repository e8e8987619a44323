//! Parsing options and configuration.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use crate::error::{Error, Result};

use super::tables::TableDetectorConfig;

/// Options for converting PDF documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Heading classifier tuning
    pub heading: HeadingOptions,

    /// Page selection (which pages to convert)
    pub pages: PageSelection,

    /// Directory extracted images are written to
    pub image_dir: PathBuf,

    /// Whether to run the table extractor
    pub extract_tables: bool,

    /// Whether to run the image extractor
    pub extract_images: bool,

    /// Table detector tuning
    pub tables: TableDetectorConfig,

    /// Error handling mode
    pub error_mode: ErrorMode,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set heading classifier options.
    pub fn with_heading(mut self, heading: HeadingOptions) -> Self {
        self.heading = heading;
        self
    }

    /// Set the fraction of the page height treated as the header zone.
    pub fn with_top_fraction(mut self, fraction: f32) -> Self {
        self.heading.top_fraction = fraction;
        self
    }

    /// Set the minimum score for a line to count as a heading.
    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.heading.score_threshold = threshold;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Restrict conversion to a single page.
    pub fn only_page(mut self, page: u32) -> Self {
        self.pages = PageSelection::Pages(vec![page]);
        self
    }

    /// Set the image output directory.
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = dir.into();
        self
    }

    /// Enable or disable table extraction.
    pub fn with_tables(mut self, extract: bool) -> Self {
        self.extract_tables = extract;
        self
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Set table detector configuration.
    pub fn with_table_config(mut self, config: TableDetectorConfig) -> Self {
        self.tables = config;
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail on the first page-level error instead of skipping it.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Extract headings and paragraphs only.
    pub fn text_only(mut self) -> Self {
        self.extract_tables = false;
        self.extract_images = false;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            heading: HeadingOptions::default(),
            pages: PageSelection::All,
            image_dir: PathBuf::from("images"),
            extract_tables: true,
            extract_images: true,
            tables: TableDetectorConfig::default(),
            error_mode: ErrorMode::Lenient,
        }
    }
}

/// Heading classifier tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingOptions {
    /// Fraction of the page height whose lines get a position-score floor
    pub top_fraction: f32,
    /// Minimum weighted score to classify a line as heading
    pub score_threshold: f32,
}

impl Default for HeadingOptions {
    fn default() -> Self {
        Self {
            top_fraction: 0.25,
            score_threshold: 0.45,
        }
    }
}

/// Error handling mode for page-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on the first page decode or image write error
    Strict,
    /// Log the failure, skip the failing sub-extraction and continue
    #[default]
    Lenient,
}

/// Which pages to convert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "all", "2-4", "1,3,5-7").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let invalid = || Error::InvalidPageRange(s.to_string());
        let page = |t: &str| -> Result<u32> {
            match t.trim().parse::<u32>() {
                Ok(p) if p > 0 => Ok(p),
                _ => Err(invalid()),
            }
        };

        if !s.contains(',') {
            if let Some((start, end)) = s.split_once('-') {
                let (start, end) = (page(start)?, page(end)?);
                if start > end {
                    return Err(invalid());
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            match part.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (page(start)?, page(end)?);
                    if start > end {
                        return Err(invalid());
                    }
                    pages.extend(start..=end);
                }
                None => pages.push(page(part)?),
            }
        }
        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}
