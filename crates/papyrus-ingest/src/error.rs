//! Error types for content resolution and fetching

use thiserror::Error;

/// Errors that can occur while turning a document into text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Document does not exist in the store
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Document has no usable content field
    #[error("Document has no content source: {0}")]
    NoContentSource(String),

    /// Download failed (transport error or non-2xx status)
    #[error("Fetch failed for {url}: {reason}")]
    Fetch {
        /// Requested URL
        url: String,
        /// Failure description
        reason: String,
    },

    /// PDF could not be parsed or no page yielded text
    #[error("PDF unreadable: {0}")]
    PdfUnreadable(String),

    /// Document store error
    #[error("Store error: {0}")]
    Store(String),

    /// Fetcher misconfigured
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl IngestError {
    /// Build a fetch error
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        IngestError::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;
