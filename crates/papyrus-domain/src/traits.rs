//! Trait definitions for external interactions
//!
//! These traits define the boundaries between pipeline logic and
//! infrastructure. Implementations live in `papyrus-store` and `papyrus-llm`.

use crate::document::{Document, DocumentRef};
use crate::record::{ExtractionResult, TokenUsage};
use async_trait::async_trait;

/// Keyed document storage
///
/// Implemented by the infrastructure layer (papyrus-store)
pub trait DocumentStore {
    /// Error type for store operations
    type Error;

    /// Get a document by collection and key
    fn get_document(&self, doc: &DocumentRef) -> Result<Option<Document>, Self::Error>;

    /// List documents matching a query, in stable storage order
    fn find_documents(&self, query: &DocumentQuery) -> Result<Vec<DocumentRef>, Self::Error>;

    /// Set the extraction result of one document, replacing any previous one
    fn set_extraction(
        &mut self,
        doc: &DocumentRef,
        result: &ExtractionResult,
    ) -> Result<(), Self::Error>;

    /// All extraction results stored in a collection
    fn extraction_results(&self, collection: &str) -> Result<Vec<ExtractionResult>, Self::Error>;

    /// Insert or update a document's content fields
    ///
    /// Used by ingestion and tests; an existing extraction result survives
    /// unless the incoming document carries one.
    fn upsert_document(&mut self, document: &Document) -> Result<(), Self::Error>;
}

/// Query criteria for listing documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    /// Collection to scan
    pub collection: String,

    /// Inclusive lower bound on `fecha_publicacion` (ISO date)
    pub published_from: Option<String>,

    /// Inclusive upper bound on `fecha_publicacion` (ISO date)
    pub published_to: Option<String>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

impl DocumentQuery {
    /// Query every document of a collection
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            ..Self::default()
        }
    }

    /// Restrict to a publication date range (either bound optional)
    pub fn with_date_range(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.published_from = from;
        self.published_to = to;
        self
    }

    /// Cap the number of results
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

/// One call to the reasoning service
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instruction
    pub system: String,

    /// User payload
    pub user: String,

    /// Reproducibility seed
    pub seed: Option<i64>,

    /// Sampling temperature, when the model accepts one
    pub temperature: Option<f32>,

    /// Ask for a JSON object response
    pub json_only: bool,

    /// Free-form label passed as request metadata
    pub label: Option<String>,
}

/// Response of the reasoning service
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Raw response text
    pub text: String,

    /// Token usage, if reported
    pub usage: Option<TokenUsage>,
}

/// External text-completion service
///
/// Implemented by the infrastructure layer (papyrus-llm)
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Error type for service operations
    type Error: std::fmt::Display + Send + Sync + 'static;

    /// Run one completion
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, Self::Error>;

    /// Model identifier recorded in extraction metadata
    fn model_name(&self) -> &str;
}
