//! Error types for batch runs

use papyrus_extractor::ExtractorError;
use papyrus_ingest::IngestError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while processing a document or a run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchError {
    /// Resolution or download failed
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Extraction failed
    #[error(transparent)]
    Extraction(#[from] ExtractorError),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker error (task panics, closed channels)
    #[error("Worker error: {0}")]
    Worker(String),
}

impl BatchError {
    /// Classify the error for run statistics
    pub fn kind(&self) -> ErrorKind {
        match self {
            BatchError::Ingest(e) => match e {
                IngestError::NotFound(_) => ErrorKind::NotFound,
                IngestError::NoContentSource(_) => ErrorKind::NoContentSource,
                IngestError::Fetch { .. } => ErrorKind::Fetch,
                IngestError::PdfUnreadable(_) => ErrorKind::PdfUnreadable,
                IngestError::Store(_) => ErrorKind::Persistence,
                IngestError::Configuration(_) => ErrorKind::Internal,
            },
            BatchError::Extraction(e) => match e {
                ExtractorError::EmptyDocument => ErrorKind::NoContentSource,
                ExtractorError::Timeout => ErrorKind::Timeout,
                ExtractorError::Service(_) => ErrorKind::Service,
                ExtractorError::InvalidJson(_) => ErrorKind::InvalidResponse,
                ExtractorError::SchemaViolation(_) => ErrorKind::SchemaViolation,
                ExtractorError::TextTooLong(..) | ExtractorError::Config(_) => ErrorKind::Internal,
            },
            BatchError::Store(_) => ErrorKind::Persistence,
            BatchError::Config(_) | BatchError::Worker(_) => ErrorKind::Internal,
        }
    }
}

/// Classification of a per-document failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Document key not in the store
    NotFound,
    /// No inline body, PDF URL or HTML URL (counted apart from errors)
    NoContentSource,
    /// Download failed
    Fetch,
    /// No PDF page yielded text
    PdfUnreadable,
    /// Reasoning service failed
    Service,
    /// Reasoning service call timed out
    Timeout,
    /// Record outside its taxonomy under the reject policy
    SchemaViolation,
    /// Store read or write failed
    Persistence,
    /// Response was not JSON
    InvalidResponse,
    /// Anything else
    Internal,
}

impl ErrorKind {
    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::NoContentSource => "no_content_source",
            ErrorKind::Fetch => "fetch",
            ErrorKind::PdfUnreadable => "pdf_unreadable",
            ErrorKind::Service => "service",
            ErrorKind::Timeout => "timeout",
            ErrorKind::SchemaViolation => "schema_violation",
            ErrorKind::Persistence => "persistence",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
