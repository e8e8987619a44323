//! Images written out during extraction.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ContentNode;

/// An embedded image that was written to the image directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedImage {
    /// 1-indexed page number
    pub page: u32,
    /// 1-indexed position among the page's distinct images
    pub sequence: u32,
    /// File extension (e.g., "png", "jpeg")
    pub ext: String,
    /// Where the file was written
    pub path: PathBuf,
    /// Width in source pixels
    pub width: Option<u32>,
    /// Height in source pixels
    pub height: Option<u32>,
}

impl ExtractedImage {
    /// Generated file name, `page{N}_img{M}.{ext}`.
    pub fn file_name(page: u32, sequence: u32, ext: &str) -> String {
        format!("page{}_img{}.{}", page, sequence, ext)
    }

    /// Convert into an outline node.
    pub fn into_node(self) -> ContentNode {
        ContentNode::Image {
            path: self.path.to_string_lossy().into_owned(),
            width: self.width,
            height: self.height,
        }
    }
}
