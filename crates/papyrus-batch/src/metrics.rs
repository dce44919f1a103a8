//! Run statistics for batch extraction

use crate::ErrorKind;
use papyrus_domain::DocumentRef;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// What happened to one document
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    /// Extracted and persisted in this run
    Extracted {
        /// Document
        doc: DocumentRef,
        /// Records persisted
        initiatives: usize,
        /// Tokens spent
        tokens: u64,
    },

    /// Already carried a result; counted without recomputation
    Skipped {
        /// Document
        doc: DocumentRef,
        /// Records in the existing result
        initiatives: usize,
    },

    /// Nothing to extract from
    NoContent {
        /// Document
        doc: DocumentRef,
    },

    /// Failed at some stage
    Failed {
        /// Document
        doc: DocumentRef,
        /// Failure class
        kind: ErrorKind,
        /// Rendered error
        message: String,
    },
}

impl DocumentOutcome {
    /// Document this outcome belongs to
    pub fn doc(&self) -> &DocumentRef {
        match self {
            DocumentOutcome::Extracted { doc, .. }
            | DocumentOutcome::Skipped { doc, .. }
            | DocumentOutcome::NoContent { doc }
            | DocumentOutcome::Failed { doc, .. } => doc,
        }
    }
}

/// Counters for one batch invocation
///
/// Owned by a single collector task; workers report outcomes over a channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStatistics {
    /// Identifier of the run, logged with every outcome
    pub run_id: Uuid,

    /// Collection processed
    pub collection: String,

    /// Documents handled, whatever their outcome
    pub documents_processed: usize,

    /// Records found, including those of skipped documents
    pub initiatives_found: usize,

    /// Documents with at least one record
    pub documents_with_initiatives: usize,

    /// Documents skipped because they already carried a result
    pub documents_skipped: usize,

    /// Documents without any content source
    pub documents_without_content: usize,

    /// Failed documents
    pub errors: usize,

    /// Failed documents per failure class
    pub errors_by_kind: BTreeMap<ErrorKind, usize>,

    /// Tokens spent in this run
    pub total_tokens: u64,

    /// Wall-clock duration (seconds)
    pub processing_time: f64,

    /// Whether the run stopped on a cancellation request
    pub cancelled: bool,
}

impl RunStatistics {
    /// Create empty statistics for a run
    pub fn new(run_id: Uuid, collection: impl Into<String>) -> Self {
        Self {
            run_id,
            collection: collection.into(),
            documents_processed: 0,
            initiatives_found: 0,
            documents_with_initiatives: 0,
            documents_skipped: 0,
            documents_without_content: 0,
            errors: 0,
            errors_by_kind: BTreeMap::new(),
            total_tokens: 0,
            processing_time: 0.0,
            cancelled: false,
        }
    }

    /// Fold one document outcome into the counters
    pub fn record(&mut self, outcome: &DocumentOutcome) {
        self.documents_processed += 1;
        match outcome {
            DocumentOutcome::Extracted {
                initiatives, tokens, ..
            } => {
                self.record_initiatives(*initiatives);
                self.total_tokens += tokens;
            }
            DocumentOutcome::Skipped { initiatives, .. } => {
                self.documents_skipped += 1;
                self.record_initiatives(*initiatives);
            }
            DocumentOutcome::NoContent { .. } => {
                self.documents_without_content += 1;
            }
            DocumentOutcome::Failed { kind, .. } => self.record_error(*kind),
        }
    }

    /// Record a failure not tied to a single document outcome
    pub fn record_error(&mut self, kind: ErrorKind) {
        self.errors += 1;
        *self.errors_by_kind.entry(kind).or_insert(0) += 1;
    }

    fn record_initiatives(&mut self, count: usize) {
        self.initiatives_found += count;
        if count > 0 {
            self.documents_with_initiatives += 1;
        }
    }

    /// Whether every handled document ended without error
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Extraction Run Summary".to_string(),
            "======================".to_string(),
            format!("Run: {}", self.run_id),
            format!("Collection: {}", self.collection),
            format!("Documents processed: {}", self.documents_processed),
            format!("Initiatives found: {}", self.initiatives_found),
            format!("Documents with initiatives: {}", self.documents_with_initiatives),
            format!("Skipped (already processed): {}", self.documents_skipped),
            format!("Without content: {}", self.documents_without_content),
            format!("Errors: {}", self.errors),
            format!("Total tokens: {}", self.total_tokens),
            format!("Processing time: {:.2}s", self.processing_time),
        ];

        if !self.errors_by_kind.is_empty() {
            lines.push(String::new());
            lines.push("Errors by kind:".to_string());
            for (kind, count) in &self.errors_by_kind {
                lines.push(format!("  {}: {}", kind, count));
            }
        }

        if self.cancelled {
            lines.push(String::new());
            lines.push("Run cancelled before the cursor was exhausted".to_string());
        }

        lines.join("\n")
    }
}
