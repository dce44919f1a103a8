//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum document body length (characters)
    pub max_text_length: usize,

    /// Maximum time for a single reasoning-service call (seconds)
    pub extraction_timeout_secs: u64,

    /// Reproducibility seed sent with every call
    pub seed: i64,

    /// Sampling temperature (dropped by providers whose models reject it)
    pub temperature: f32,
}

impl ExtractorConfig {
    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            ));
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration: seed 1, minimal temperature, 120s per call
    fn default() -> Self {
        Self {
            max_text_length: 1_000_000,
            extraction_timeout_secs: 120,
            seed: 1,
            temperature: 0.0,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: shorter timeout, smaller documents
    pub fn aggressive() -> Self {
        Self {
            max_text_length: 200_000,
            extraction_timeout_secs: 60,
            ..Self::default()
        }
    }

    /// Lenient preset: longer timeout for very large bulletins
    pub fn lenient() -> Self {
        Self {
            max_text_length: 2_000_000,
            extraction_timeout_secs: 300,
            ..Self::default()
        }
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
