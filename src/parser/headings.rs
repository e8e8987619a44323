//! Heading classification.
//!
//! Each visual line is scored against four page-relative signals and
//! labelled a heading when the weighted sum reaches the threshold:
//!
//! | signal | weight | meaning |
//! |--------|--------|---------|
//! | size   | 0.60   | average size relative to the median..largest spread |
//! | bold   | 0.20   | any font on the line is a bold/black/heavy face |
//! | pos    | 0.15   | closeness to the page top, floored in the header zone |
//! | upper  | 0.05   | uppercase share of alphabetic characters |

use std::cmp::Ordering;
use std::collections::HashMap;

use regex::Regex;

use crate::model::{round_to, Glyph, HeadingCandidate, PageStats, ScoredLine, VisualLine};

use super::lines::aggregate_lines;
use super::options::HeadingOptions;

const SIZE_WEIGHT: f32 = 0.6;
const BOLD_WEIGHT: f32 = 0.2;
const POS_WEIGHT: f32 = 0.15;
const UPPER_WEIGHT: f32 = 0.05;

/// Position score floor inside the header zone.
const HEADER_ZONE_FLOOR: f32 = 0.85;

/// Uppercase ratio multiplier before clamping.
const UPPER_SCALE: f32 = 1.2;

/// Lower bound of the size-score denominator on uniformly sized pages.
const MIN_SIZE_SPREAD: f32 = 0.1;

const BOLD_FONT_PATTERN: &str = r"(?i)Bold|Black|Heavy|Bd";

impl PageStats {
    /// Compute size statistics from a page's glyphs.
    ///
    /// Returns `None` when no glyph has a positive size.
    pub fn from_glyphs(glyphs: &[Glyph], page_height: f32) -> Option<Self> {
        let sizes: Vec<f32> = glyphs
            .iter()
            .map(|g| g.size)
            .filter(|&s| s > 0.0)
            .map(|s| round_to(s, 1))
            .collect();
        if sizes.is_empty() {
            return None;
        }

        // Mode; ties go to the size seen first.
        let mut counts: HashMap<i64, (usize, usize)> = HashMap::new();
        for (i, &size) in sizes.iter().enumerate() {
            counts.entry((size * 10.0).round() as i64).or_insert((0, i)).0 += 1;
        }
        let common_size = counts
            .values()
            .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
            .map(|&(_, first)| sizes[first])
            .unwrap_or(sizes[0]);

        let mut sorted = sizes;
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let largest_size = sorted[sorted.len() - 1];
        let median_size = sorted[sorted.len() / 2];

        Some(Self {
            page_height,
            common_size,
            largest_size,
            median_size,
        })
    }
}

/// Scored lines of one page plus the ones that qualified as headings.
#[derive(Debug, Clone, Default)]
pub struct PageClassification {
    /// Every non-blank line with its scores, top to bottom
    pub lines: Vec<ScoredLine>,
    /// Compact form of the heading lines
    pub headings: Vec<HeadingCandidate>,
}

/// Scores visual lines and labels headings.
#[derive(Debug, Clone)]
pub struct HeadingClassifier {
    options: HeadingOptions,
    bold_pattern: Regex,
}

impl HeadingClassifier {
    /// Create a classifier with the given tuning.
    pub fn new(options: HeadingOptions) -> Self {
        Self {
            options,
            bold_pattern: Regex::new(BOLD_FONT_PATTERN).expect("bold font pattern is valid"),
        }
    }

    /// Classifier tuning in use.
    pub fn options(&self) -> &HeadingOptions {
        &self.options
    }

    /// Aggregate a page's glyphs into lines and score them.
    pub fn classify_page(&self, page: u32, glyphs: &[Glyph], page_height: f32) -> PageClassification {
        let Some(stats) = PageStats::from_glyphs(glyphs, page_height) else {
            return PageClassification::default();
        };

        let lines = aggregate_lines(page, glyphs);
        log::debug!(
            "Page {}: {} lines, common={:.1} median={:.1} largest={:.1} height={:.1}",
            page,
            lines.len(),
            stats.common_size,
            stats.median_size,
            stats.largest_size,
            page_height
        );

        let mut result = PageClassification::default();
        for line in lines {
            let (scored, raw_score) = self.score_line(line, &stats);
            if scored.is_heading {
                log::debug!(
                    "Page {}: heading {:?} (score {:.3})",
                    page,
                    scored.text(),
                    raw_score
                );
                result.headings.push(scored.to_candidate(raw_score));
            }
            result.lines.push(scored);
        }
        sort_debug_lines(&mut result.lines);
        result
    }

    /// Score one line against its page statistics.
    ///
    /// Returns the scored line (component scores rounded for reporting) and
    /// the unrounded weighted score the heading decision was made on.
    pub fn score_line(&self, line: VisualLine, stats: &PageStats) -> (ScoredLine, f32) {
        let size_score = size_score(line.avg_size, stats);
        let bold_score = self.bold_score(&line);
        let pos_score = position_score(line.top, stats.page_height, self.options.top_fraction);
        let upper_score = upper_score(&line.text);

        let score = SIZE_WEIGHT * size_score
            + BOLD_WEIGHT * bold_score
            + POS_WEIGHT * pos_score
            + UPPER_WEIGHT * upper_score;
        let score = score.clamp(0.0, 1.0);
        let is_heading = score >= self.options.score_threshold;

        let scored = ScoredLine {
            line,
            stats: *stats,
            size_score: round_to(size_score, 2),
            bold_score,
            pos_score: round_to(pos_score, 2),
            upper_score: round_to(upper_score, 2),
            score: round_to(score, 2),
            is_heading,
        };
        (scored, score)
    }

    fn bold_score(&self, line: &VisualLine) -> f32 {
        if line
            .font_names
            .iter()
            .any(|name| self.bold_pattern.is_match(name))
        {
            1.0
        } else {
            0.0
        }
    }
}

impl Default for HeadingClassifier {
    fn default() -> Self {
        Self::new(HeadingOptions::default())
    }
}

fn size_score(avg_size: f32, stats: &PageStats) -> f32 {
    let spread = (stats.largest_size - stats.median_size).max(MIN_SIZE_SPREAD);
    ((avg_size - stats.median_size) / spread).clamp(0.0, 1.0)
}

fn position_score(top: f32, page_height: f32, top_fraction: f32) -> f32 {
    if page_height <= 0.0 {
        return 0.0;
    }
    let linear = (1.0 - top / page_height).max(0.0);
    let score = if top <= page_height * top_fraction {
        linear.max(HEADER_ZONE_FLOOR)
    } else {
        linear
    };
    score.min(1.0)
}

fn upper_score(text: &str) -> f32 {
    let (alpha, upper) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(a, u), c| (a + 1, u + usize::from(c.is_uppercase())));
    if alpha == 0 {
        return 0.0;
    }
    (upper as f32 / alpha as f32 * UPPER_SCALE).min(1.0)
}

/// Sort scored lines by page, then top, then descending score.
pub fn sort_debug_lines(lines: &mut [ScoredLine]) {
    lines.sort_by(|a, b| {
        a.line
            .page
            .cmp(&b.line.page)
            .then(a.line.top.partial_cmp(&b.line.top).unwrap_or(Ordering::Equal))
            .then(b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
    });
}
