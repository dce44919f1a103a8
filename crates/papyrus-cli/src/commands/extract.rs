//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use chrono::NaiveDate;
use papyrus_batch::{summarize, BatchConfig, Orchestrator, RunStatistics};
use papyrus_domain::traits::{DocumentQuery, DocumentStore, ReasoningService};
use papyrus_extractor::Extractor;
use papyrus_ingest::{ContentFetcher, HttpFetcher, SourceReader};
use papyrus_llm::OpenAiProvider;
use papyrus_store::SqliteStore;
use std::fmt::Display;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<RunStatistics> {
    let query = document_query(&args)?;
    let batch = batch_config(&args, config)?;
    let taxonomies = Arc::new(config.taxonomies(args.variant.map(Into::into))?);

    let extractor = Extractor::new(
        OpenAiProvider::from_config(&config.llm)?,
        taxonomies,
        config.validation.clone(),
        config.extractor.clone(),
    );
    let reader = SourceReader::new(HttpFetcher::new(&config.fetch)?);

    if let Some(parent) = config.store.path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteStore::new(&config.store.path)?;
    info!(path = %config.store.path.display(), "Opened document store");

    let orchestrator = Orchestrator::new(store, extractor, reader, batch)?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing documents in flight");
            trigger.cancel();
        }
    });

    run_extraction(&orchestrator, &query, args.summary, cancel, formatter).await
}

/// Run a prepared Orchestrator and print its statistics (and optionally the summary).
pub async fn run_extraction<S, R, F>(
    orchestrator: &Orchestrator<S, R, F>,
    query: &DocumentQuery,
    with_summary: bool,
    cancel: CancellationToken,
    formatter: &Formatter,
) -> Result<RunStatistics>
where
    S: DocumentStore + Send + 'static,
    S::Error: Display,
    R: ReasoningService + 'static,
    F: ContentFetcher + 'static,
{
    let stats = orchestrator.run(query, cancel).await;
    println!("{}", formatter.format_stats(&stats)?);

    if with_summary {
        let summary = {
            let store = orchestrator
                .store()
                .lock()
                .map_err(|_| CliError::Config("document store lock poisoned".to_string()))?;
            summarize(&*store, &query.collection)?
        };
        println!();
        println!("{}", formatter.format_summary(&summary)?);
    }

    Ok(stats)
}

fn document_query(args: &ExtractArgs) -> Result<DocumentQuery> {
    for date in [&args.from, &args.to].into_iter().flatten() {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| CliError::InvalidInput(format!("'{}' is not a YYYY-MM-DD date", date)))?;
    }
    if let (Some(from), Some(to)) = (&args.from, &args.to) {
        if from > to {
            return Err(CliError::InvalidInput(format!("--from {} is after --to {}", from, to)));
        }
    }
    if args.limit == Some(0) {
        return Err(CliError::InvalidInput("--limit must be greater than 0".to_string()));
    }

    Ok(DocumentQuery::collection(&args.collection)
        .with_date_range(args.from.clone(), args.to.clone())
        .with_limit(args.limit))
}

fn batch_config(args: &ExtractArgs, config: &Config) -> Result<BatchConfig> {
    let mut batch = config.batch.clone();
    if args.force {
        batch.force = true;
    }
    if let Some(concurrency) = args.concurrency {
        batch.concurrency = concurrency;
    }
    batch.validate().map_err(CliError::InvalidInput)?;
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use papyrus_domain::{Document, TaxonomySet};
    use papyrus_extractor::ExtractorConfig;
    use papyrus_gatekeeper::ValidationConfig;
    use papyrus_ingest::MockFetcher;
    use papyrus_llm::MockProvider;

    fn args(collection: &str) -> ExtractArgs {
        ExtractArgs {
            collection: collection.to_string(),
            from: None,
            to: None,
            limit: None,
            force: false,
            concurrency: None,
            variant: None,
            summary: false,
        }
    }

    #[test]
    fn test_query_from_args() {
        let mut a = args("BOCG");
        a.from = Some("2024-01-01".to_string());
        a.limit = Some(25);

        let query = document_query(&a).unwrap();
        assert_eq!(query.collection, "BOCG");
        assert_eq!(query.published_from.as_deref(), Some("2024-01-01"));
        assert!(query.published_to.is_none());
        assert_eq!(query.limit, Some(25));
    }

    #[test]
    fn test_invalid_dates_are_rejected() {
        let mut a = args("BOCG");
        a.to = Some("01/02/2024".to_string());
        assert!(matches!(document_query(&a), Err(CliError::InvalidInput(_))));

        let mut a = args("BOCG");
        a.from = Some("2024-06-01".to_string());
        a.to = Some("2024-01-01".to_string());
        assert!(matches!(document_query(&a), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_flags_override_config() {
        let mut a = args("BOCG");
        a.force = true;
        a.concurrency = Some(2);

        let batch = batch_config(&a, &Config::default()).unwrap();
        assert!(batch.force);
        assert_eq!(batch.concurrency, 2);

        a.concurrency = Some(0);
        assert!(batch_config(&a, &Config::default()).is_err());
    }

    #[tokio::test]
    async fn test_run_extraction_with_summary() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store
            .upsert_document(&Document::new("BOCG", "1").with_body("Boletín número 1"))
            .unwrap();

        let extractor = Extractor::new(
            MockProvider::new(r#"{"iniciativas": [{"tipo_iniciativa": "Proyecto de ley"}]}"#),
            Arc::new(TaxonomySet::legislative()),
            ValidationConfig::default(),
            ExtractorConfig::default(),
        );
        let orchestrator = Orchestrator::new(
            store,
            extractor,
            SourceReader::new(MockFetcher::new()),
            BatchConfig {
                inter_document_delay_ms: 0,
                ..BatchConfig::default()
            },
        )
        .unwrap();

        let formatter = Formatter::new(OutputFormat::Json, false);
        let stats = run_extraction(
            &orchestrator,
            &DocumentQuery::collection("BOCG"),
            true,
            CancellationToken::new(),
            &formatter,
        )
        .await
        .unwrap();

        assert_eq!(stats.documents_processed, 1);
        assert_eq!(stats.initiatives_found, 1);
        assert!(stats.is_clean());
    }
}
