//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document store error
    #[error("Store error: {0}")]
    Store(#[from] papyrus_store::StoreError),

    /// Reasoning service setup error
    #[error("Reasoning service error: {0}")]
    Llm(#[from] papyrus_llm::LlmError),

    /// Fetcher setup error
    #[error("Ingest error: {0}")]
    Ingest(#[from] papyrus_ingest::IngestError),

    /// Batch error
    #[error("Batch error: {0}")]
    Batch(#[from] papyrus_batch::BatchError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
