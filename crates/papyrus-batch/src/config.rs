//! Configuration for batch runs
//!
//! Defines worker-pool size, the courtesy delay between documents and the
//! re-extraction switch.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the batch Orchestrator
///
/// # Examples
///
/// ```
/// use papyrus_batch::BatchConfig;
///
/// // Default configuration (4 workers, 100 ms between documents)
/// let config = BatchConfig::default();
/// assert_eq!(config.concurrency, 4);
///
/// // One document at a time, long pauses
/// let config = BatchConfig::lenient();
/// assert_eq!(config.concurrency, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Documents processed concurrently
    /// Default: 4
    pub concurrency: usize,

    /// Pause after every document that reached the reasoning service (ms)
    /// Default: 100
    pub inter_document_delay_ms: u64,

    /// Re-extract documents that already carry a result
    /// Default: false
    pub force: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            inter_document_delay_ms: 100,
            force: false,
        }
    }
}

impl BatchConfig {
    /// More workers, shorter pauses
    pub fn aggressive() -> Self {
        Self {
            concurrency: 8,
            inter_document_delay_ms: 50,
            force: false,
        }
    }

    /// Sequential processing with generous pauses
    pub fn lenient() -> Self {
        Self {
            concurrency: 1,
            inter_document_delay_ms: 500,
            force: false,
        }
    }

    /// Get the inter-document delay as Duration
    pub fn inter_document_delay(&self) -> Duration {
        Duration::from_millis(self.inter_document_delay_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }
        if self.concurrency > 64 {
            return Err(format!("concurrency must be at most 64, got {}", self.concurrency));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
