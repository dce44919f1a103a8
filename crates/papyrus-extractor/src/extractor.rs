//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::parse_response;
use crate::prompt::PromptBuilder;
use papyrus_domain::traits::{CompletionRequest, ReasoningService};
use papyrus_domain::{ExtractionMetadata, ExtractionResult, TaxonomySet};
use papyrus_gatekeeper::{Gatekeeper, ValidationConfig};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// The Extractor turns a document body into validated extraction records
pub struct Extractor<R>
where
    R: ReasoningService,
{
    service: R,
    prompts: PromptBuilder,
    gatekeeper: Gatekeeper,
    config: ExtractorConfig,
}

impl<R> Extractor<R>
where
    R: ReasoningService,
{
    /// Create a new Extractor
    ///
    /// The prompt and the validation gate are both derived from `taxonomies`.
    pub fn new(
        service: R,
        taxonomies: Arc<TaxonomySet>,
        validation: ValidationConfig,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            service,
            prompts: PromptBuilder::new(Arc::clone(&taxonomies)),
            gatekeeper: Gatekeeper::new(validation, taxonomies),
            config,
        }
    }

    /// Model identifier reported by the service
    pub fn model_name(&self) -> &str {
        self.service.model_name()
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Taxonomy set driving the prompt and the gate
    pub fn taxonomies(&self) -> &TaxonomySet {
        self.prompts.taxonomies()
    }

    /// Hex SHA-256 of the instruction text
    pub fn prompt_hash(&self) -> &str {
        self.prompts.hash()
    }

    /// The underlying reasoning service
    pub fn service(&self) -> &R {
        &self.service
    }

    /// Extract records from one document body
    ///
    /// Makes exactly one service call. Failures are returned, never retried
    /// here; transport retries belong to the service implementation.
    pub async fn extract(
        &self,
        body: &str,
        document_id: Option<&str>,
    ) -> Result<ExtractionResult, ExtractorError> {
        let doc = document_id.unwrap_or("unknown");

        if body.trim().is_empty() {
            warn!(document = doc, "Document has no content");
            return Err(ExtractorError::EmptyDocument);
        }

        let length = body.chars().count();
        if length > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(length, self.config.max_text_length));
        }

        let prompt = self.prompts.build(body);
        debug!(
            document = doc,
            chars = length,
            prompt_hash = %prompt.hash,
            "Built extraction prompt"
        );

        let taxonomies = self.prompts.taxonomies();
        let request = CompletionRequest {
            system: prompt.system,
            user: prompt.user,
            seed: Some(self.config.seed),
            temperature: Some(self.config.temperature),
            json_only: true,
            label: Some(taxonomies.variant.label().to_string()),
        };

        let completion = timeout(self.config.extraction_timeout(), self.service.complete(&request))
            .await
            .map_err(|_| ExtractorError::Timeout)?
            .map_err(|e| ExtractorError::Service(e.to_string()))?;

        debug!(document = doc, chars = completion.text.len(), "Service responded");

        let records = parse_response(&completion.text)?;
        let report = self.gatekeeper.apply(records)?;

        if report.fields_coerced > 0 {
            warn!(
                document = doc,
                fields = report.fields_coerced,
                records = report.repaired,
                "Coerced invalid classification values"
            );
        }
        if report.fields_canonicalized > 0 {
            debug!(
                document = doc,
                fields = report.fields_canonicalized,
                "Canonicalized classification values"
            );
        }

        let total_initiatives = report.records.len();
        let metadata = ExtractionMetadata {
            document_id: document_id.map(str::to_string),
            extraction_date: chrono::Utc::now().to_rfc3339(),
            model: self.service.model_name().to_string(),
            total_initiatives,
            tokens: completion.usage,
            taxonomy_version: Some(taxonomies.version.clone()),
            prompt_hash: Some(prompt.hash),
        };

        info!(
            document = doc,
            initiatives = total_initiatives,
            tokens = completion.usage.map(|u| u.total).unwrap_or(0),
            "Extraction complete"
        );

        Ok(ExtractionResult {
            iniciativas: report.records,
            extraction_metadata: metadata,
        })
    }
}
