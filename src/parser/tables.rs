//! Table extraction from text run positions.
//!
//! Tables are found without ruling lines: runs are grouped into rows, left
//! edges that line up across rows become column boundaries, and contiguous
//! runs of well-aligned rows form a table. Cells are the joined text of the
//! runs that fall into each column; missing cells are empty strings.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::model::TextRun;

/// Width of the buckets left edges are snapped to.
const EDGE_BUCKET: f32 = 5.0;

/// Distance within which a run counts as aligned with a column edge.
const ALIGN_TOLERANCE: f32 = 5.0;

/// Slack allowed for runs starting slightly left of their column.
const COLUMN_SLACK: f32 = 10.0;

/// Table detector configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Vertical tolerance for grouping runs into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum share of a row's runs that must sit on a column edge
    pub min_alignment_ratio: f32,
    /// Minimum gap between column edges (points)
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// A table found on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTable {
    /// Top of the first row
    pub top: f32,
    /// Top of the last row
    pub bottom: f32,
    /// Column left edges
    pub columns: Vec<f32>,
    /// Rectangular cell grid, one entry per column in every row
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
struct RunRow<'a> {
    top: f32,
    runs: Vec<&'a TextRun>,
}

/// Detects tables in a page's text runs.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a table detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables among the given runs, top to bottom.
    pub fn detect(&self, runs: &[TextRun]) -> Vec<DetectedTable> {
        let runs: Vec<&TextRun> = runs.iter().filter(|r| !r.text.trim().is_empty()).collect();
        if runs.len() < self.config.min_rows * self.config.min_columns {
            log::trace!("TableDetector: only {} runs", runs.len());
            return Vec::new();
        }

        let rows = self.group_into_rows(runs);
        if rows.len() < self.config.min_rows {
            return Vec::new();
        }

        let columns = self.detect_columns(&rows);
        log::debug!(
            "TableDetector: {} rows, column edges {:?}",
            rows.len(),
            columns
        );
        if columns.len() < self.config.min_columns {
            return Vec::new();
        }

        let mut tables = Vec::new();
        for (start, end) in self.find_table_regions(&rows, &columns) {
            let region = &rows[start..=end];

            // Column edges of the region alone, so neighbouring text does not
            // add spurious columns.
            let region_columns = self.detect_columns(region);
            if region_columns.len() < self.config.min_columns {
                continue;
            }
            if region_columns.len() > self.config.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({} > {})",
                    region_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if is_list_pattern(region, &region_columns) {
                log::debug!("TableDetector: skipping region, looks like a list");
                continue;
            }

            tables.push(build_table(region, region_columns));
        }
        tables
    }

    fn group_into_rows<'a>(&self, mut runs: Vec<&'a TextRun>) -> Vec<RunRow<'a>> {
        runs.sort_by(|a, b| {
            a.top
                .partial_cmp(&b.top)
                .unwrap_or(Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
        });

        let mut rows: Vec<RunRow<'a>> = Vec::new();
        let mut anchor: Option<f32> = None;
        for run in runs {
            let tolerance = run.size * self.config.y_tolerance_factor;
            match (anchor, rows.last_mut()) {
                (Some(top), Some(row)) if (run.top - top).abs() <= tolerance => row.runs.push(run),
                _ => {
                    anchor = Some(run.top);
                    rows.push(RunRow {
                        top: run.top,
                        runs: vec![run],
                    });
                }
            }
        }

        for row in &mut rows {
            row.top = row.runs.iter().map(|r| r.top).sum::<f32>() / row.runs.len() as f32;
            row.runs
                .sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
        }
        rows
    }

    /// Left edges shared by enough multi-run rows, at least
    /// `min_column_gap` apart.
    fn detect_columns(&self, rows: &[RunRow<'_>]) -> Vec<f32> {
        let multi: Vec<&RunRow<'_>> = rows.iter().filter(|r| r.runs.len() >= 2).collect();
        if multi.len() < self.config.min_rows {
            return Vec::new();
        }

        // Count each bucket once per row.
        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        for row in &multi {
            let buckets: HashSet<i32> = row.runs.iter().map(|r| bucket(r.x)).collect();
            for b in buckets {
                *edge_counts.entry(b).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((multi.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = edge_counts
            .into_iter()
            .filter(|&(_, count)| count >= min_occurrences)
            .map(|(b, _)| b as f32 * EDGE_BUCKET)
            .collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let mut merged: Vec<f32> = Vec::with_capacity(edges.len());
        for edge in edges {
            match merged.last() {
                Some(&last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Inclusive index ranges of consecutive aligned rows. A row needs at
    /// least two runs to belong to a table.
    fn find_table_regions(&self, rows: &[RunRow<'_>], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if row.runs.len() >= 2 && alignment_score(row, columns) >= self.config.min_alignment_ratio {
                start.get_or_insert(i);
            } else if let Some(s) = start.take() {
                if i - s >= self.config.min_rows {
                    regions.push((s, i - 1));
                }
            }
        }
        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }
        regions
    }
}

fn bucket(x: f32) -> i32 {
    (x / EDGE_BUCKET).round() as i32
}

fn alignment_score(row: &RunRow<'_>, columns: &[f32]) -> f32 {
    if row.runs.is_empty() || columns.is_empty() {
        return 0.0;
    }
    let aligned = row
        .runs
        .iter()
        .filter(|r| columns.iter().any(|c| (r.x - c).abs() <= ALIGN_TOLERANCE))
        .count();
    aligned as f32 / row.runs.len() as f32
}

fn build_table(rows: &[RunRow<'_>], columns: Vec<f32>) -> DetectedTable {
    let right = rows
        .iter()
        .flat_map(|r| r.runs.iter())
        .map(|r| r.right())
        .fold(f32::MIN, f32::max);

    let cells = rows
        .iter()
        .map(|row| {
            let mut parts: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
            for run in &row.runs {
                parts[column_for(run.x, &columns, right)].push(run.text.trim());
            }
            parts.into_iter().map(|p| p.join(" ")).collect()
        })
        .collect();

    DetectedTable {
        top: rows.first().map_or(0.0, |r| r.top),
        bottom: rows.last().map_or(0.0, |r| r.top),
        columns,
        rows: cells,
    }
}

/// Column whose span contains `x`, falling back to the nearest edge.
fn column_for(x: f32, columns: &[f32], right: f32) -> usize {
    for (i, &start) in columns.iter().enumerate() {
        let end = columns.get(i + 1).copied().unwrap_or(right + 100.0);
        if x >= start - COLUMN_SLACK && x < end - COLUMN_SLACK {
            return i;
        }
    }
    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (x - **a)
                .abs()
                .partial_cmp(&(x - **b).abs())
                .unwrap_or(Ordering::Equal)
        })
        .map_or(0, |(i, _)| i)
}

/// Whether the region is a bulleted or numbered list split into two runs per
/// line rather than a table.
fn is_list_pattern(rows: &[RunRow<'_>], columns: &[f32]) -> bool {
    if columns.len() < 2 || rows.is_empty() {
        return false;
    }

    let (bullets, numbers) = rows
        .iter()
        .filter_map(|row| row.runs.first())
        .map(|run| run.text.trim())
        .fold((0usize, 0usize), |(b, n), text| {
            if is_bullet_marker(text) {
                (b + 1, n)
            } else if is_number_marker(text) {
                (b, n + 1)
            } else {
                (b, n)
            }
        });

    let total = rows.len() as f32;
    if bullets as f32 / total >= 0.5 {
        return true;
    }
    // Numbered first columns are common in real tables; only two-column
    // regions are rejected.
    columns.len() == 2 && (bullets + numbers) as f32 / total >= 0.5
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "□" | "◆" | "▶" | "➤"
    )
}

/// Number or letter markers such as `1.`, `12)`, `3`, `a.` or `B)`.
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }
    if cleaned.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }

    let mut chars = cleaned.chars();
    let last = chars.next_back();
    let body = chars.as_str();
    if !matches!(last, Some('.') | Some(')')) || body.is_empty() {
        return false;
    }
    body.chars().all(|c| c.is_ascii_digit())
        || (body.chars().count() == 1 && body.chars().all(char::is_alphabetic))
}
