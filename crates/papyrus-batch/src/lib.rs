//! Papyrus Batch
//!
//! Batch extraction over a document collection, and the distribution summary
//! of what was extracted.
//!
//! # Overview
//!
//! The Orchestrator is responsible for:
//! - **Cursor**: listing the documents of a collection, optionally filtered by
//!   publication date and capped by a limit
//! - **Per-document state machine**: Fetch → SkipIfProcessed → Extract →
//!   Persist → Advance
//! - **Partial-failure isolation**: a failing document is counted and the run
//!   moves on
//! - **Bounded concurrency**: a small worker pool with a courtesy delay after
//!   every service call
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────┐  DocumentOutcome  ┌───────────┐
//! cursor ──────▶  │ workers  │ ────────────────▶ │ collector │ ──▶ RunStatistics
//!  (semaphore)    └──────────┘      (mpsc)       └───────────┘
//! ```
//!
//! Workers never share mutable statistics; the collector task owns them.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use papyrus_batch::{summarize, BatchConfig, Orchestrator, Summary};
//! use papyrus_domain::{DocumentQuery, TaxonomySet};
//! use papyrus_extractor::{Extractor, ExtractorConfig};
//! use papyrus_gatekeeper::ValidationConfig;
//! use papyrus_ingest::{FetchConfig, HttpFetcher, SourceReader};
//! use papyrus_llm::OpenAiProvider;
//! use papyrus_store::SqliteStore;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = Extractor::new(
//!         OpenAiProvider::from_env("gpt-5-mini")?,
//!         Arc::new(TaxonomySet::legislative()),
//!         ValidationConfig::default(),
//!         ExtractorConfig::default(),
//!     );
//!     let orchestrator = Orchestrator::new(
//!         SqliteStore::new("papyrus.db")?,
//!         extractor,
//!         SourceReader::new(HttpFetcher::new(&FetchConfig::default())?),
//!         BatchConfig::default(),
//!     )?;
//!
//!     let query = DocumentQuery::collection("BOCG")
//!         .with_date_range(Some("2024-01-01".into()), None);
//!     let stats = orchestrator.run(&query, CancellationToken::new()).await;
//!     println!("{}", stats.summary());
//!
//!     let store = orchestrator.store().lock().map_err(|_| "store lock poisoned")?;
//!     if let Summary::Distribution(d) = summarize(&*store, "BOCG")? {
//!         println!("{} initiatives", d.total_initiatives);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [batch]
//! concurrency = 4
//! inter_document_delay_ms = 100
//! force = false
//! ```

#![warn(missing_docs)]

mod aggregator;
mod config;
mod error;
mod metrics;
mod orchestrator;

pub use aggregator::{ranked, summarize, DistributionSummary, Summary};
pub use config::BatchConfig;
pub use error::{BatchError, ErrorKind};
pub use metrics::{DocumentOutcome, RunStatistics};
pub use orchestrator::Orchestrator;
