//! Outline nodes and per-page content.

use serde::{Deserialize, Serialize};

/// A node of the extracted outline.
///
/// `section` and `subsection` are copies of the most recent top-level and
/// second-level heading text at the time the node was emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentNode {
    /// A heading line
    Heading {
        /// Heading text
        text: String,
        /// Active section (this heading's text for top-level headings)
        section: Option<String>,
        /// Active subsection (this heading's text for second-level headings)
        subsection: Option<String>,
        /// Rounded average glyph size
        size: f32,
    },

    /// Consecutive body lines joined with newlines
    Paragraph {
        /// Paragraph text
        text: String,
        /// Section active before the paragraph was flushed
        section: Option<String>,
        /// Subsection active before the paragraph was flushed
        subsection: Option<String>,
    },

    /// A detected table
    Table {
        /// Section active when the page finished segmenting
        section: Option<String>,
        /// Rows of cell strings; missing cells are empty strings
        #[serde(rename = "table_data")]
        rows: Vec<Vec<String>>,
    },

    /// An extracted image written to disk
    Image {
        /// Path of the written image file
        path: String,
        /// Width in source pixels
        width: Option<u32>,
        /// Height in source pixels
        height: Option<u32>,
    },
}

impl ContentNode {
    /// Create a heading node.
    pub fn heading(
        text: impl Into<String>,
        section: Option<String>,
        subsection: Option<String>,
        size: f32,
    ) -> Self {
        ContentNode::Heading {
            text: text.into(),
            section,
            subsection,
            size,
        }
    }

    /// Create a paragraph node.
    pub fn paragraph(
        text: impl Into<String>,
        section: Option<String>,
        subsection: Option<String>,
    ) -> Self {
        ContentNode::Paragraph {
            text: text.into(),
            section,
            subsection,
        }
    }

    /// Wire name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentNode::Heading { .. } => "heading",
            ContentNode::Paragraph { .. } => "paragraph",
            ContentNode::Table { .. } => "table",
            ContentNode::Image { .. } => "image",
        }
    }

    /// Text of heading and paragraph nodes.
    pub fn text(&self) -> Option<&str> {
        match self {
            ContentNode::Heading { text, .. } | ContentNode::Paragraph { text, .. } => Some(text),
            ContentNode::Table { .. } | ContentNode::Image { .. } => None,
        }
    }

    /// Section label carried by the node, if any.
    pub fn section(&self) -> Option<&str> {
        match self {
            ContentNode::Heading { section, .. }
            | ContentNode::Paragraph { section, .. }
            | ContentNode::Table { section, .. } => section.as_deref(),
            ContentNode::Image { .. } => None,
        }
    }

    /// Subsection label carried by the node, if any.
    pub fn subsection(&self) -> Option<&str> {
        match self {
            ContentNode::Heading { subsection, .. } | ContentNode::Paragraph { subsection, .. } => {
                subsection.as_deref()
            }
            ContentNode::Table { .. } | ContentNode::Image { .. } => None,
        }
    }

    /// Check if this node is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self, ContentNode::Heading { .. })
    }

    /// Check if this node is a paragraph.
    pub fn is_paragraph(&self) -> bool {
        matches!(self, ContentNode::Paragraph { .. })
    }

    /// Check if this node is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, ContentNode::Table { .. })
    }

    /// Check if this node is an image.
    pub fn is_image(&self) -> bool {
        matches!(self, ContentNode::Image { .. })
    }
}

/// Extracted content of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// 1-indexed page number
    pub page_number: u32,
    /// Text nodes in reading order, then tables, then images
    pub content: Vec<ContentNode>,
}

impl PageContent {
    /// Create an empty page.
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            content: Vec::new(),
        }
    }

    /// Append a node.
    pub fn push(&mut self, node: ContentNode) {
        self.content.push(node);
    }

    /// Check if the page has no nodes.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Iterate over heading nodes.
    pub fn headings(&self) -> impl Iterator<Item = &ContentNode> {
        self.content.iter().filter(|n| n.is_heading())
    }

    /// Count nodes of each kind as (headings, paragraphs, tables, images).
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        self.content
            .iter()
            .fold((0, 0, 0, 0), |(h, p, t, i), node| match node {
                ContentNode::Heading { .. } => (h + 1, p, t, i),
                ContentNode::Paragraph { .. } => (h, p + 1, t, i),
                ContentNode::Table { .. } => (h, p, t + 1, i),
                ContentNode::Image { .. } => (h, p, t, i + 1),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_wire_format() {
        let node = ContentNode::heading("Intro", Some("CHAPTER 1".into()), Some("Intro".into()), 16.0);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "heading");
        assert_eq!(json["section"], "CHAPTER 1");
        assert_eq!(json["subsection"], "Intro");
        assert_eq!(json["size"], 16.0);
    }

    #[test]
    fn test_missing_labels_serialize_as_null() {
        let node = ContentNode::paragraph("Body", None, None);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "paragraph");
        assert!(json["section"].is_null());
        assert!(json["subsection"].is_null());
    }

    #[test]
    fn test_table_uses_table_data_key() {
        let node = ContentNode::Table {
            section: None,
            rows: vec![vec!["a".into(), "".into()]],
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "table");
        assert_eq!(json["table_data"][0][1], "");
    }

    #[test]
    fn test_page_counts() {
        let mut page = PageContent::new(2);
        assert!(page.is_empty());
        page.push(ContentNode::heading("H", Some("H".into()), None, 20.0));
        page.push(ContentNode::paragraph("P", Some("H".into()), None));
        page.push(ContentNode::Image {
            path: "images/page2_img1.png".into(),
            width: Some(10),
            height: Some(10),
        });
        assert_eq!(page.counts(), (1, 1, 0, 1));
        assert_eq!(page.headings().count(), 1);
        assert_eq!(page.content[1].section(), Some("H"));
        assert_eq!(page.content[2].kind(), "image");
    }
}
