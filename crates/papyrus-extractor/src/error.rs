//! Error types for the Extractor

use papyrus_gatekeeper::GatekeeperError;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractorError {
    /// Document body is empty after trimming
    #[error("Document has no content")]
    EmptyDocument,

    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// Reasoning-service call exceeded its timeout
    #[error("Extraction timeout")]
    Timeout,

    /// Reasoning service failed (transport, auth, rate limit)
    #[error("Service error: {0}")]
    Service(String),

    /// Response text is not valid JSON
    #[error("Invalid JSON in response: {0}")]
    InvalidJson(String),

    /// A record violates its taxonomy under the `Reject` policy
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::InvalidJson(e.to_string())
    }
}

impl From<GatekeeperError> for ExtractorError {
    fn from(e: GatekeeperError) -> Self {
        match e {
            GatekeeperError::SchemaViolation { .. } => ExtractorError::SchemaViolation(e.to_string()),
            GatekeeperError::Config(msg) => ExtractorError::Config(msg),
        }
    }
}
