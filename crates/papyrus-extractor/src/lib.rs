//! Papyrus Extractor
//!
//! Turns a normalized document body into validated extraction records.
//!
//! # Overview
//!
//! The Extractor renders a deterministic instruction text from a taxonomy
//! set, calls the reasoning service once per document with a fixed seed and
//! a JSON-only response format, parses the `iniciativas` list, and runs
//! every record through the validation gate before returning.
//!
//! # Architecture
//!
//! ```text
//! Body → PromptBuilder → ReasoningService → parser → Gatekeeper → ExtractionResult
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use papyrus_domain::TaxonomySet;
//! use papyrus_extractor::{Extractor, ExtractorConfig};
//! use papyrus_gatekeeper::ValidationConfig;
//! use papyrus_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = Extractor::new(
//!     MockProvider::default(),
//!     Arc::new(TaxonomySet::legislative()),
//!     ValidationConfig::default(),
//!     ExtractorConfig::default(),
//! );
//!
//! let result = extractor.extract("Texto del boletín", Some("BOCG-14-A-1")).await?;
//! println!("{} initiatives", result.record_count());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod parser;
mod prompt;

#[cfg(test)]
mod tests;

pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use parser::parse_response;
pub use prompt::{document_message, Prompt, PromptBuilder};
