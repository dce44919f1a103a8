//! Batch Orchestrator
//!
//! Drives every document of a cursor through Fetch → SkipIfProcessed →
//! Extract → Persist with a bounded worker pool. Workers never touch the
//! run statistics; they send one [`DocumentOutcome`] per document to a
//! collector task that owns them.

use crate::{BatchConfig, BatchError, DocumentOutcome, ErrorKind, RunStatistics};
use papyrus_domain::traits::{DocumentQuery, DocumentStore, ReasoningService};
use papyrus_domain::DocumentRef;
use papyrus_extractor::{Extractor, ExtractorError};
use papyrus_ingest::{resolve, ContentFetcher, IngestError, SourceReader};
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Runs extraction over a collection
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use papyrus_batch::{BatchConfig, Orchestrator};
/// use papyrus_domain::{DocumentQuery, TaxonomySet};
/// use papyrus_extractor::{Extractor, ExtractorConfig};
/// use papyrus_gatekeeper::ValidationConfig;
/// use papyrus_ingest::{MockFetcher, SourceReader};
/// use papyrus_llm::MockProvider;
/// use papyrus_store::SqliteStore;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = Extractor::new(
///     MockProvider::default(),
///     Arc::new(TaxonomySet::legislative()),
///     ValidationConfig::default(),
///     ExtractorConfig::default(),
/// );
/// let orchestrator = Orchestrator::new(
///     SqliteStore::new("papyrus.db")?,
///     extractor,
///     SourceReader::new(MockFetcher::new()),
///     BatchConfig::default(),
/// )?;
///
/// let stats = orchestrator
///     .run(&DocumentQuery::collection("BOCG"), CancellationToken::new())
///     .await;
/// println!("{}", stats.summary());
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator<S, R, F>
where
    R: ReasoningService,
{
    store: Arc<Mutex<S>>,
    extractor: Arc<Extractor<R>>,
    reader: Arc<SourceReader<F>>,
    config: BatchConfig,
}

impl<S, R, F> Orchestrator<S, R, F>
where
    S: DocumentStore + Send + 'static,
    S::Error: Display,
    R: ReasoningService + 'static,
    F: ContentFetcher + 'static,
{
    /// Create an Orchestrator owning its store
    pub fn new(
        store: S,
        extractor: Extractor<R>,
        reader: SourceReader<F>,
        config: BatchConfig,
    ) -> Result<Self, BatchError> {
        Self::with_shared_store(Arc::new(Mutex::new(store)), extractor, reader, config)
    }

    /// Create an Orchestrator over a store handle shared with the caller
    pub fn with_shared_store(
        store: Arc<Mutex<S>>,
        extractor: Extractor<R>,
        reader: SourceReader<F>,
        config: BatchConfig,
    ) -> Result<Self, BatchError> {
        config.validate().map_err(BatchError::Config)?;
        Ok(Self {
            store,
            extractor: Arc::new(extractor),
            reader: Arc::new(reader),
            config,
        })
    }

    /// Shared handle to the document store
    pub fn store(&self) -> &Arc<Mutex<S>> {
        &self.store
    }

    /// Active configuration
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// The extractor used for every document
    pub fn extractor(&self) -> &Extractor<R> {
        &self.extractor
    }

    /// Process every document matched by `query`
    ///
    /// Never fails: per-document errors, a failing cursor and worker panics
    /// all end up in the returned statistics. Cancellation is honored before
    /// each document is dispatched; documents already in flight finish.
    pub async fn run(&self, query: &DocumentQuery, cancel: CancellationToken) -> RunStatistics {
        let run_id = Uuid::now_v7();
        let started = Instant::now();

        info!(
            run_id = %run_id,
            collection = %query.collection,
            from = query.published_from.as_deref().unwrap_or("-"),
            to = query.published_to.as_deref().unwrap_or("-"),
            limit = ?query.limit,
            concurrency = self.config.concurrency,
            force = self.config.force,
            "Starting extraction run"
        );

        let (outcomes, mut received) = mpsc::channel::<DocumentOutcome>(self.config.concurrency * 2);
        let collection = query.collection.clone();
        let collector = tokio::spawn(async move {
            let mut stats = RunStatistics::new(run_id, collection);
            while let Some(outcome) = received.recv().await {
                log_outcome(run_id, &outcome);
                stats.record(&outcome);
            }
            stats
        });

        let mut report = DispatchReport::default();
        match self.worker(run_id).with_store(|store| store.find_documents(query)) {
            Ok(documents) => {
                info!(run_id = %run_id, documents = documents.len(), "Cursor opened");
                report = self.dispatch(run_id, documents, &outcomes, &cancel).await;
            }
            Err(e) => {
                error!(run_id = %run_id, error = %e, "Failed to list documents");
                report.failures.push(e.kind());
            }
        }
        drop(outcomes);

        let mut stats = match collector.await {
            Ok(stats) => stats,
            Err(e) => {
                error!(run_id = %run_id, error = %e, "Statistics collector failed");
                let mut stats = RunStatistics::new(run_id, query.collection.clone());
                stats.record_error(ErrorKind::Internal);
                stats
            }
        };

        for kind in report.failures {
            stats.record_error(kind);
        }
        stats.documents_processed += report.lost;
        stats.cancelled = report.cancelled;
        stats.processing_time = started.elapsed().as_secs_f64();

        info!(
            run_id = %run_id,
            processed = stats.documents_processed,
            initiatives = stats.initiatives_found,
            errors = stats.errors,
            tokens = stats.total_tokens,
            seconds = stats.processing_time,
            cancelled = stats.cancelled,
            "Extraction run finished"
        );

        stats
    }

    /// Run a single document through the state machine
    pub async fn process_document(&self, doc: &DocumentRef) -> DocumentOutcome {
        let worker = self.worker(Uuid::now_v7());
        let outcome = worker.process(doc).await;
        log_outcome(worker.run_id, &outcome);
        outcome
    }

    async fn dispatch(
        &self,
        run_id: Uuid,
        documents: Vec<DocumentRef>,
        outcomes: &mpsc::Sender<DocumentOutcome>,
        cancel: &CancellationToken,
    ) -> DispatchReport {
        let permits = Arc::new(Semaphore::new(self.config.concurrency));
        let mut workers = JoinSet::new();
        let mut report = DispatchReport::default();

        for doc in documents {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    report.cancelled = true;
                    break;
                }
                permit = Arc::clone(&permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let worker = self.worker(run_id);
            let sender = outcomes.clone();
            workers.spawn(async move {
                let outcome = worker.process(&doc).await;
                if sender.send(outcome).await.is_err() {
                    warn!(run_id = %worker.run_id, document = %doc, "Outcome dropped, collector gone");
                }
                drop(permit);
            });
        }

        if report.cancelled {
            info!(run_id = %run_id, in_flight = workers.len(), "Cancellation requested, draining workers");
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(run_id = %run_id, error = %e, "Worker task failed");
                report.lost += 1;
                report.failures.push(ErrorKind::Internal);
            }
        }

        report
    }

    fn worker(&self, run_id: Uuid) -> DocumentWorker<S, R, F> {
        DocumentWorker {
            run_id,
            store: Arc::clone(&self.store),
            extractor: Arc::clone(&self.extractor),
            reader: Arc::clone(&self.reader),
            force: self.config.force,
            delay: self.config.inter_document_delay(),
        }
    }
}

#[derive(Debug, Default)]
struct DispatchReport {
    cancelled: bool,
    /// Documents whose worker died before reporting
    lost: usize,
    failures: Vec<ErrorKind>,
}

struct DocumentWorker<S, R, F>
where
    R: ReasoningService,
{
    run_id: Uuid,
    store: Arc<Mutex<S>>,
    extractor: Arc<Extractor<R>>,
    reader: Arc<SourceReader<F>>,
    force: bool,
    delay: Duration,
}

impl<S, R, F> DocumentWorker<S, R, F>
where
    S: DocumentStore,
    S::Error: Display,
    R: ReasoningService,
    F: ContentFetcher,
{
    async fn process(&self, doc: &DocumentRef) -> DocumentOutcome {
        match self.try_process(doc).await {
            Ok(outcome) => outcome,
            Err(e) if e.kind() == ErrorKind::NoContentSource => DocumentOutcome::NoContent { doc: doc.clone() },
            Err(e) => DocumentOutcome::Failed {
                doc: doc.clone(),
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }

    async fn try_process(&self, doc: &DocumentRef) -> Result<DocumentOutcome, BatchError> {
        let document = self
            .with_store(|store| store.get_document(doc))?
            .ok_or_else(|| IngestError::NotFound(doc.to_string()))?;

        if !self.force {
            if let Some(existing) = &document.extraction {
                return Ok(DocumentOutcome::Skipped {
                    doc: doc.clone(),
                    initiatives: existing.record_count(),
                });
            }
        }

        let source = resolve(&document)?;
        debug!(run_id = %self.run_id, document = %doc, source = source.kind(), "Resolved content source");
        let body = self.reader.read(&source).await?;

        let extracted = self.extractor.extract(&body, Some(&doc.id)).await;
        if reached_service(&extracted) && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = extracted?;

        self.with_store(|store| store.set_extraction(doc, &result))?;

        Ok(DocumentOutcome::Extracted {
            doc: doc.clone(),
            initiatives: result.record_count(),
            tokens: result.total_tokens(),
        })
    }

    /// Run a store operation; the lock is never held across an await
    fn with_store<T>(&self, op: impl FnOnce(&mut S) -> Result<T, S::Error>) -> Result<T, BatchError> {
        let mut store = self
            .store
            .lock()
            .map_err(|_| BatchError::Worker("document store lock poisoned".to_string()))?;
        op(&mut store).map_err(|e| BatchError::Store(e.to_string()))
    }
}

fn reached_service<T>(result: &Result<T, ExtractorError>) -> bool {
    !matches!(
        result,
        Err(ExtractorError::EmptyDocument | ExtractorError::TextTooLong(..) | ExtractorError::Config(_))
    )
}

fn log_outcome(run_id: Uuid, outcome: &DocumentOutcome) {
    match outcome {
        DocumentOutcome::Extracted {
            doc,
            initiatives,
            tokens,
        } => info!(run_id = %run_id, document = %doc, initiatives, tokens, "Document extracted"),
        DocumentOutcome::Skipped { doc, initiatives } => {
            info!(run_id = %run_id, document = %doc, initiatives, "Already processed, skipping")
        }
        DocumentOutcome::NoContent { doc } => {
            warn!(run_id = %run_id, document = %doc, "Document has no content source")
        }
        DocumentOutcome::Failed { doc, kind, message } => {
            error!(run_id = %run_id, document = %doc, kind = %kind, error = %message, "Document failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use papyrus_domain::{Document, ExtractionResult, TaxonomySet};
    use papyrus_extractor::ExtractorConfig;
    use papyrus_gatekeeper::ValidationConfig;
    use papyrus_ingest::MockFetcher;
    use papyrus_llm::MockProvider;
    use std::collections::HashSet;

    const ONE_RECORD: &str = r#"{"iniciativas": [{"tipo_iniciativa": "Proyecto de ley", "sector": "Movilidad"}]}"#;

    #[derive(Default)]
    struct MockStore {
        documents: Vec<Document>,
        refuse_writes: HashSet<String>,
    }

    impl MockStore {
        fn with_bodies(count: usize) -> Self {
            let documents = (1..=count)
                .map(|n| Document::new("BOCG", n.to_string()).with_body(format!("Boletín número {}", n)))
                .collect();
            Self {
                documents,
                refuse_writes: HashSet::new(),
            }
        }

        fn position(&self, doc: &DocumentRef) -> Option<usize> {
            self.documents
                .iter()
                .position(|d| d.collection == doc.collection && d.id == doc.id)
        }
    }

    impl DocumentStore for MockStore {
        type Error = String;

        fn get_document(&self, doc: &DocumentRef) -> Result<Option<Document>, Self::Error> {
            Ok(self.position(doc).map(|i| self.documents[i].clone()))
        }

        fn find_documents(&self, query: &DocumentQuery) -> Result<Vec<DocumentRef>, Self::Error> {
            Ok(self
                .documents
                .iter()
                .filter(|d| d.collection == query.collection)
                .take(query.limit.unwrap_or(usize::MAX))
                .map(Document::doc_ref)
                .collect())
        }

        fn set_extraction(&mut self, doc: &DocumentRef, result: &ExtractionResult) -> Result<(), Self::Error> {
            if self.refuse_writes.contains(&doc.id) {
                return Err("write refused".to_string());
            }
            let i = self.position(doc).ok_or_else(|| format!("{} missing", doc))?;
            self.documents[i].extraction = Some(result.clone());
            Ok(())
        }

        fn extraction_results(&self, collection: &str) -> Result<Vec<ExtractionResult>, Self::Error> {
            Ok(self
                .documents
                .iter()
                .filter(|d| d.collection == collection)
                .filter_map(|d| d.extraction.clone())
                .collect())
        }

        fn upsert_document(&mut self, document: &Document) -> Result<(), Self::Error> {
            match self.position(&document.doc_ref()) {
                Some(i) => self.documents[i] = document.clone(),
                None => self.documents.push(document.clone()),
            }
            Ok(())
        }
    }

    fn quick_config() -> BatchConfig {
        BatchConfig {
            inter_document_delay_ms: 0,
            ..BatchConfig::default()
        }
    }

    fn orchestrator(
        store: MockStore,
        llm: MockProvider,
        config: BatchConfig,
    ) -> Orchestrator<MockStore, MockProvider, MockFetcher> {
        let extractor = Extractor::new(
            llm,
            Arc::new(TaxonomySet::legislative()),
            ValidationConfig::default(),
            ExtractorConfig::default(),
        );
        Orchestrator::new(store, extractor, SourceReader::new(MockFetcher::new()), config).unwrap()
    }

    fn persisted(orchestrator: &Orchestrator<MockStore, MockProvider, MockFetcher>) -> Vec<String> {
        let store = orchestrator.store().lock().unwrap();
        let mut ids: Vec<String> = store
            .documents
            .iter()
            .filter(|d| d.is_processed())
            .map(|d| d.id.clone())
            .collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_one_failing_document_does_not_abort_the_batch() {
        let mut llm = MockProvider::new(ONE_RECORD);
        llm.add_error("número 3");
        let orchestrator = orchestrator(MockStore::with_bodies(5), llm.clone(), quick_config());

        let stats = orchestrator
            .run(&DocumentQuery::collection("BOCG"), CancellationToken::new())
            .await;

        assert_eq!(stats.documents_processed, 5);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.errors_by_kind.get(&ErrorKind::Service), Some(&1));
        assert_eq!(stats.initiatives_found, 4);
        assert_eq!(stats.documents_with_initiatives, 4);
        assert!(!stats.cancelled);
        assert_eq!(llm.call_count(), 5);
        assert_eq!(persisted(&orchestrator), vec!["1", "2", "4", "5"]);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_counted() {
        let mut store = MockStore::with_bodies(2);
        store.refuse_writes.insert("2".to_string());
        let orchestrator = orchestrator(store, MockProvider::new(ONE_RECORD), quick_config());

        let stats = orchestrator
            .run(&DocumentQuery::collection("BOCG"), CancellationToken::new())
            .await;

        assert_eq!(stats.documents_processed, 2);
        assert_eq!(stats.errors_by_kind.get(&ErrorKind::Persistence), Some(&1));
        assert_eq!(persisted(&orchestrator), vec!["1"]);
    }

    #[tokio::test]
    async fn test_missing_document() {
        let orchestrator = orchestrator(MockStore::default(), MockProvider::default(), quick_config());
        let outcome = orchestrator
            .process_document(&DocumentRef::new("BOCG", "nope"))
            .await;

        match outcome {
            DocumentOutcome::Failed { kind, .. } => assert_eq!(kind, ErrorKind::NotFound),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_document_counts_as_no_content() {
        let mut store = MockStore::default();
        store.documents.push(Document::new("BOCG", "1").with_body("   "));
        let llm = MockProvider::default();
        let orchestrator = orchestrator(store, llm.clone(), quick_config());

        let stats = orchestrator
            .run(&DocumentQuery::collection("BOCG"), CancellationToken::new())
            .await;

        assert_eq!(stats.documents_processed, 1);
        assert_eq!(stats.documents_without_content, 1);
        assert_eq!(stats.errors, 0);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let llm = MockProvider::default();
        let orchestrator = orchestrator(MockStore::with_bodies(3), llm.clone(), quick_config());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let stats = orchestrator.run(&DocumentQuery::collection("BOCG"), cancel).await;

        assert!(stats.cancelled);
        assert_eq!(stats.documents_processed, 0);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_limit_is_applied_at_the_cursor() {
        let llm = MockProvider::default();
        let orchestrator = orchestrator(MockStore::with_bodies(5), llm.clone(), quick_config());

        let stats = orchestrator
            .run(
                &DocumentQuery::collection("BOCG").with_limit(Some(2)),
                CancellationToken::new(),
            )
            .await;

        assert_eq!(stats.documents_processed, 2);
        assert_eq!(llm.call_count(), 2);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let extractor = Extractor::new(
            MockProvider::default(),
            Arc::new(TaxonomySet::legislative()),
            ValidationConfig::default(),
            ExtractorConfig::default(),
        );
        let config = BatchConfig {
            concurrency: 0,
            ..BatchConfig::default()
        };
        let result = Orchestrator::new(
            MockStore::default(),
            extractor,
            SourceReader::new(MockFetcher::new()),
            config,
        );
        assert!(matches!(result, Err(BatchError::Config(_))));
    }
}
