//! PDF document parser: runs the extraction pipeline page by page.

use std::fs;
use std::path::Path;

use crate::detect::{detect_format_from_bytes, detect_format_from_path};
use crate::error::{Error, Result};
use crate::model::{runs_to_glyphs, ContentNode, HeadingCandidate, PageContent, ScoredLine, TextRun};

use super::backend::{LopdfBackend, PageId, PdfBackend};
use super::glyphs::extract_runs;
use super::headings::{sort_debug_lines, HeadingClassifier, PageClassification};
use super::images::extract_page_images;
use super::options::{ErrorMode, ParseOptions};
use super::segment::segment_page;
use super::tables::TableDetector;

/// PDF document parser.
///
/// Each page goes through glyph extraction, line aggregation, heading
/// classification and segmentation; tables and images are extracted
/// independently and appended after the text nodes.
pub struct PdfParser<B: PdfBackend = LopdfBackend> {
    backend: B,
    options: ParseOptions,
    classifier: HeadingClassifier,
    tables: TableDetector,
}

impl PdfParser<LopdfBackend> {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let format = detect_format_from_path(path)?;
        log::debug!("Opening {} ({})", path.display(), format);

        let backend = LopdfBackend::load_file(path)?;
        Ok(Self::with_backend(backend, options))
    }

    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        detect_format_from_bytes(data)?;
        let backend = LopdfBackend::load_bytes(data)?;
        Ok(Self::with_backend(backend, options))
    }

    /// Get PDF version.
    pub fn version(&self) -> String {
        self.backend.version()
    }
}

impl<B: PdfBackend> PdfParser<B> {
    /// Create a parser over any backend.
    pub fn with_backend(backend: B, options: ParseOptions) -> Self {
        Self {
            classifier: HeadingClassifier::new(options.heading),
            tables: TableDetector::with_config(options.tables.clone()),
            backend,
            options,
        }
    }

    /// Options in use.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Get the number of pages.
    pub fn page_count(&self) -> u32 {
        self.backend.pages().len() as u32
    }

    /// Convert every selected page.
    ///
    /// Pages that end up with no nodes at all are left out.
    pub fn parse(&self) -> Result<Vec<PageContent>> {
        let pages = self.backend.pages();
        log::info!(
            "Converting {} pages, images to {}",
            pages.len(),
            self.options.image_dir.display()
        );
        if self.options.extract_images {
            self.prepare_image_dir()?;
        }

        let mut result = Vec::new();
        for (&number, &id) in pages.iter() {
            if !self.options.pages.includes(number) {
                continue;
            }
            let page = self.assemble_page(number, id)?;
            if page.is_empty() {
                log::debug!("Page {}: no content", number);
                continue;
            }
            result.push(page);
        }
        Ok(result)
    }

    /// Convert a single page, even if it yields no nodes.
    pub fn parse_page(&self, number: u32) -> Result<PageContent> {
        let pages = self.backend.pages();
        let id = *pages
            .get(&number)
            .ok_or(Error::PageOutOfRange(number, pages.len() as u32))?;
        self.assemble_page(number, id)
    }

    /// Score every line of the selected pages.
    ///
    /// Returns the heading candidates in page and reading order, and the full
    /// scored list sorted by page, top and descending score.
    pub fn detect_headings(&self) -> Result<(Vec<HeadingCandidate>, Vec<ScoredLine>)> {
        let mut headings = Vec::new();
        let mut lines = Vec::new();
        for (&number, &id) in self.backend.pages().iter() {
            if !self.options.pages.includes(number) {
                continue;
            }
            let classification = self.classify(number, id, &self.page_runs(number, id)?);
            headings.extend(classification.headings);
            lines.extend(classification.lines);
        }
        sort_debug_lines(&mut lines);
        Ok((headings, lines))
    }

    fn assemble_page(&self, number: u32, id: PageId) -> Result<PageContent> {
        let runs = self.page_runs(number, id)?;
        let classification = self.classify(number, id, &runs);
        let segmented = segment_page(&classification.lines);

        let mut page = PageContent::new(number);
        page.content = segmented.nodes;

        if self.options.extract_tables {
            for table in self.tables.detect(&runs) {
                log::debug!(
                    "Page {}: table with {} rows x {} columns",
                    number,
                    table.rows.len(),
                    table.columns.len()
                );
                page.push(ContentNode::Table {
                    section: segmented.current_section.clone(),
                    rows: table.rows,
                });
            }
        }

        if self.options.extract_images {
            match extract_page_images(
                &self.backend,
                id,
                number,
                &self.options.image_dir,
                self.options.error_mode,
            ) {
                Ok(images) => page
                    .content
                    .extend(images.into_iter().map(|img| img.into_node())),
                Err(e) => self.skip_or_fail(e, "images")?,
            }
        }

        Ok(page)
    }

    /// Text runs of a page; empty when extraction fails leniently.
    fn page_runs(&self, number: u32, id: PageId) -> Result<Vec<TextRun>> {
        match extract_runs(&self.backend, id, self.backend.media_box(id)) {
            Ok(runs) => Ok(runs),
            Err(e) => {
                self.skip_or_fail(Error::page_decode(number, e), "text")?;
                Ok(Vec::new())
            }
        }
    }

    fn classify(&self, number: u32, id: PageId, runs: &[TextRun]) -> PageClassification {
        let page_height = self
            .backend
            .media_box(id)
            .map(|mb| mb.height())
            .unwrap_or(0.0);
        let glyphs = runs_to_glyphs(runs);
        self.classifier.classify_page(number, &glyphs, page_height)
    }

    /// Create the image directory up front, even if no page has images.
    fn prepare_image_dir(&self) -> Result<()> {
        let dir = &self.options.image_dir;
        match fs::create_dir_all(dir) {
            Ok(()) => Ok(()),
            Err(source) => self.skip_or_fail(
                Error::ImageWrite {
                    path: dir.clone(),
                    source,
                },
                "image directory",
            ),
        }
    }

    fn skip_or_fail(&self, err: Error, what: &str) -> Result<()> {
        match self.options.error_mode {
            ErrorMode::Strict => Err(err),
            ErrorMode::Lenient => {
                log::warn!("Skipping {}: {}", what, err);
                Ok(())
            }
        }
    }
}
