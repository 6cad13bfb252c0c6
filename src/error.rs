//! Error types for the pdfsplit library.

use std::io;
use thiserror::Error;

/// Result type alias for pdfsplit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while splitting a PDF into sections.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// The bookmark outline is missing or unusable. Fatal for the whole run.
    #[error("Malformed outline: {0}")]
    MalformedOutline(String),

    /// A section references a page outside the document.
    #[error("Page {page} is out of range (document has {page_count} pages)")]
    PageRange { page: usize, page_count: usize },

    /// A selection refers to a section that does not exist.
    #[error("Section not found: {0}")]
    SectionNotFound(String),

    /// Invalid configuration value or file.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error during Markdown rendering or serialization.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error aborts the whole run rather than a single section.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::PageRange { .. } | Error::SectionNotFound(_) | Error::Render(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Encrypted;
        assert_eq!(err.to_string(), "Document is encrypted");

        let err = Error::PageRange {
            page: 10,
            page_count: 5,
        };
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::MalformedOutline("no bookmarks".into()).is_fatal());
        assert!(Error::Encrypted.is_fatal());
        assert!(!Error::PageRange {
            page: 3,
            page_count: 2
        }
        .is_fatal());
        assert!(!Error::SectionNotFound("Intro".into()).is_fatal());
    }
}
