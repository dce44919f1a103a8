//! Gatekeeper error types

use thiserror::Error;

/// Errors that can occur during gatekeeper operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatekeeperError {
    /// A record violates its taxonomy and the policy is `Reject`
    #[error("Schema violation in record {index}: {details}")]
    SchemaViolation {
        /// Position of the offending record
        index: usize,
        /// Rendered rejection reasons
        details: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
