//! Content segmentation.
//!
//! Walks one page's scored lines in reading order and turns them into
//! heading and paragraph nodes, tracking the active section labels.

use crate::model::{ContentNode, ScoredLine};

/// Result of segmenting one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentedPage {
    /// Heading and paragraph nodes in reading order
    pub nodes: Vec<ContentNode>,
    /// Section label active after the last line
    pub current_section: Option<String>,
    /// Subsection label active after the last line
    pub current_subsection: Option<String>,
}

/// Running state for one page. Never shared between pages.
struct Segmenter {
    max_size: f32,
    section: Option<String>,
    subsection: Option<String>,
    buffer: Vec<String>,
    nodes: Vec<ContentNode>,
}

impl Segmenter {
    fn new(max_size: f32) -> Self {
        Self {
            max_size,
            section: None,
            subsection: None,
            buffer: Vec::new(),
            nodes: Vec::new(),
        }
    }

    fn push_line(&mut self, line: &ScoredLine) {
        let text = line.text().trim();
        if line.is_heading {
            self.flush();
            if line.avg_size() == self.max_size {
                self.section = Some(text.to_string());
                self.subsection = None;
            } else {
                self.subsection = Some(text.to_string());
            }
            self.nodes.push(ContentNode::heading(
                text,
                self.section.clone(),
                self.subsection.clone(),
                line.avg_size(),
            ));
        } else if !text.is_empty() {
            self.buffer.push(text.to_string());
        }
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let joined = self.buffer.join("\n");
        let text = joined.trim();
        if !text.is_empty() {
            self.nodes.push(ContentNode::paragraph(
                text,
                self.section.clone(),
                self.subsection.clone(),
            ));
        }
        self.buffer.clear();
    }

    fn finish(mut self) -> SegmentedPage {
        self.flush();
        SegmentedPage {
            nodes: self.nodes,
            current_section: self.section,
            current_subsection: self.subsection,
        }
    }
}

/// Segment one page's scored lines into heading and paragraph nodes.
///
/// A heading whose size equals the largest line size on the page opens a
/// new section; any other heading opens a subsection under the current
/// section. The largest size is taken over every scored line, headings or
/// not.
pub fn segment_page(lines: &[ScoredLine]) -> SegmentedPage {
    let max_size = lines
        .iter()
        .map(ScoredLine::avg_size)
        .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |m| m.max(s))))
        .unwrap_or(0.0);

    let mut segmenter = Segmenter::new(max_size);
    for line in lines {
        segmenter.push_line(line);
    }
    segmenter.finish()
}
