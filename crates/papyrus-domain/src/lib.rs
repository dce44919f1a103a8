//! Papyrus Domain Layer
//!
//! Core value types and trait boundaries for the legal-document extraction
//! pipeline. Every other crate in the workspace depends on this one; it holds
//! no I/O of its own.
//!
//! ## Key Concepts
//!
//! - **Document**: a stored legal document addressed by collection + key, with
//!   at most one usable content source (inline text, PDF URL, HTML URL)
//! - **Taxonomy**: a closed, versioned set of allowed values for one
//!   classification dimension
//! - **ExtractionRecord**: one initiative / normative update pulled out of a
//!   document by the reasoning service
//! - **ExtractionResult**: the ordered records of one document plus metadata,
//!   persisted as `legal_initiatives`
//!
//! ## Architecture
//!
//! - Pure data and validation helpers only
//! - Infrastructure (SQLite, HTTP, OpenAI) lives in other crates
//! - `DocumentStore` and `ReasoningService` are the two seams the pipeline
//!   is tested through

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod record;
pub mod taxonomy;
pub mod traits;

// Re-exports for convenience
pub use document::{ContentSource, Document, DocumentRef};
pub use record::{ExtractionMetadata, ExtractionRecord, ExtractionResult, TokenUsage};
pub use taxonomy::{is_sentinel, Dimension, ExtractionVariant, Taxonomy, TaxonomySet, SENTINEL};
pub use traits::{Completion, CompletionRequest, DocumentQuery, DocumentStore, ReasoningService};
