//! Error types for pdfoutline.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdfoutline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building a document outline.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading the document or creating the image directory.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The document could not be opened or decoded at all.
    #[error("Failed to open PDF document: {0}")]
    DocumentOpen(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// A PDF object or content stream could not be decoded.
    #[error("PDF decoding error: {0}")]
    Decode(String),

    /// Glyph, table or image extraction failed for one page.
    #[error("Failed to decode page {page}: {reason}")]
    PageDecode {
        /// 1-indexed page number
        page: u32,
        /// What went wrong
        reason: String,
    },

    /// An extracted image could not be written to disk.
    #[error("Failed to write image {}: {source}", path.display())]
    ImageWrite {
        /// Destination path of the image
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Error during rendering (JSON, text view).
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Wrap any error as a page-level decode failure.
    pub fn page_decode(page: u32, err: impl std::fmt::Display) -> Self {
        Error::PageDecode {
            page,
            reason: err.to_string(),
        }
    }

    /// Whether this error means the document itself could not be opened.
    ///
    /// Callers use this to tell a failed conversion apart from a valid but
    /// empty document.
    pub fn is_open_error(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::UnknownFormat
                | Error::UnsupportedVersion(_)
                | Error::DocumentOpen(_)
                | Error::Encrypted
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::DocumentOpen(err.to_string()),
        }
    }
}
