//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{Extractor, ExtractorConfig, ExtractorError, PromptBuilder};
    use async_trait::async_trait;
    use papyrus_domain::traits::{Completion, CompletionRequest, ReasoningService};
    use papyrus_domain::{TaxonomySet, TokenUsage, SENTINEL};
    use papyrus_gatekeeper::ValidationConfig;
    use papyrus_llm::{LlmError, MockProvider, OpenAiConfig, RetryPolicy};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const TWO_INITIATIVES: &str = r#"{
        "iniciativas": [
            {
                "id": "121/000023",
                "tipo_iniciativa": "proyecto_de_ley",
                "titulo_iniciativa": "Ley de Movilidad Sostenible",
                "sector": "Movilidad",
                "subsector": "Movilidad - VTC",
                "tema": "Vehículos",
                "marco_geografico": "Nacional",
                "fuente": "Congreso",
                "proponente": "Gobierno",
                "fecha": "2024-02-20"
            },
            {
                "id": "162/000101",
                "tipo_iniciativa": "Proposición no de ley",
                "titulo_iniciativa": "Sobre el lince ibérico",
                "sector": "Fauna exótica",
                "subsector": "Fauna exótica - Felinos",
                "tema": "Biodiversidad",
                "marco_geografico": "Autonómico",
                "fuente": "Congreso",
                "proponente": "Grupo Popular",
                "fecha": "2024-02-21"
            }
        ]
    }"#;

    fn extractor_with(llm: MockProvider, validation: ValidationConfig) -> Extractor<MockProvider> {
        Extractor::new(
            llm,
            Arc::new(TaxonomySet::legislative()),
            validation,
            ExtractorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_full_extraction_flow() {
        let llm = MockProvider::new(TWO_INITIATIVES)
            .with_model("gpt-5-mini")
            .with_usage(TokenUsage {
                input: 1200,
                output: 300,
                total: 1500,
            });
        let extractor = extractor_with(llm, ValidationConfig::default());

        let result = extractor
            .extract("Boletín Oficial de las Cortes Generales", Some("BOCG-14-A-1"))
            .await
            .unwrap();

        assert_eq!(result.record_count(), 2);
        // lenient match canonicalized
        assert_eq!(result.iniciativas[0].tipo_iniciativa, "Proyecto de ley");
        // unknown sector coerced, subsector follows it
        assert_eq!(result.iniciativas[1].sector, SENTINEL);
        assert_eq!(result.iniciativas[1].subsector, SENTINEL);

        let metadata = &result.extraction_metadata;
        assert_eq!(metadata.model, "gpt-5-mini");
        assert_eq!(metadata.total_initiatives, 2);
        assert_eq!(result.total_tokens(), 1500);
        assert_eq!(metadata.taxonomy_version.as_deref(), Some("legislative-2025.1"));
        assert_eq!(metadata.prompt_hash.as_deref(), Some(extractor.prompt_hash()));
        assert!(chrono::DateTime::parse_from_rfc3339(&metadata.extraction_date).is_ok());
    }

    #[tokio::test]
    async fn test_extraction_with_invalid_json() {
        let extractor = extractor_with(MockProvider::new("This is not JSON"), ValidationConfig::default());
        let result = extractor.extract("Some text", None).await;
        assert!(matches!(result, Err(ExtractorError::InvalidJson(_))));
    }

    #[tokio::test]
    async fn test_extraction_without_initiatives_key() {
        let extractor = extractor_with(MockProvider::new(r#"{"otra_cosa": 1}"#), ValidationConfig::default());
        let result = extractor.extract("Some text", None).await.unwrap();
        assert!(!result.has_records());
    }

    #[tokio::test]
    async fn test_service_error_is_reported() {
        let mut llm = MockProvider::default();
        llm.add_error("falla");
        let extractor = extractor_with(llm.clone(), ValidationConfig::default());

        let result = extractor.extract("este documento falla", None).await;
        assert!(matches!(result, Err(ExtractorError::Service(_))));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout() {
        let llm = MockProvider::default().with_delay(Duration::from_secs(5));
        let extractor = Extractor::new(
            llm,
            Arc::new(TaxonomySet::legislative()),
            ValidationConfig::default(),
            ExtractorConfig {
                extraction_timeout_secs: 1,
                ..ExtractorConfig::default()
            },
        );

        let result = extractor.extract("Some text", None).await;
        assert_eq!(result, Err(ExtractorError::Timeout));
    }

    /// Service whose first attempt never answers
    struct StallingService {
        policy: RetryPolicy,
        attempts: AtomicU32,
    }

    #[async_trait]
    impl ReasoningService for StallingService {
        type Error = LlmError;

        async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, LlmError> {
            self.policy
                .run("stalling", || async {
                    if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        std::future::pending::<()>().await;
                    }
                    Ok(Completion {
                        text: TWO_INITIATIVES.to_string(),
                        usage: None,
                    })
                })
                .await
        }

        fn model_name(&self) -> &str {
            "stalling"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_attempt_is_retried_within_deadline() {
        let llm = OpenAiConfig::default();
        let config = ExtractorConfig::default();
        assert!(llm.call_budget() <= config.extraction_timeout());

        let service = StallingService {
            policy: llm.retry_policy(),
            attempts: AtomicU32::new(0),
        };
        let extractor = Extractor::new(
            service,
            Arc::new(TaxonomySet::legislative()),
            ValidationConfig::default(),
            config,
        );

        let result = extractor.extract("Boletín con respuesta lenta", None).await.unwrap();
        assert_eq!(result.record_count(), 2);
        assert_eq!(extractor.service().attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reject_policy_fails_document() {
        let extractor = extractor_with(MockProvider::new(TWO_INITIATIVES), ValidationConfig::strict());
        let result = extractor.extract("Some text", None).await;
        assert!(matches!(result, Err(ExtractorError::SchemaViolation(_))));
    }

    #[tokio::test]
    async fn test_disabled_gate_keeps_raw_values() {
        let extractor = extractor_with(MockProvider::new(TWO_INITIATIVES), ValidationConfig::disabled());
        let result = extractor.extract("Some text", None).await.unwrap();
        assert_eq!(result.iniciativas[1].sector, "Fauna exótica");
    }

    #[tokio::test]
    async fn test_normative_variant() {
        let llm = MockProvider::new(
            r#"{"iniciativas": [{"tipo_iniciativa": "Orden", "proponente": "Gobierno de España"}]}"#,
        );
        let extractor = Extractor::new(
            llm.clone(),
            Arc::new(TaxonomySet::normative()),
            ValidationConfig::default(),
            ExtractorConfig::default(),
        );

        let result = extractor.extract("BOE núm. 1", Some("BOE-1")).await.unwrap();
        let record = &result.iniciativas[0];
        assert_eq!(record.proponente, "Gobierno de España");
        assert_eq!(record.subgrupo.as_deref(), Some(SENTINEL));

        let requests = llm.requests();
        assert_eq!(requests[0].label.as_deref(), Some("normative_updates"));
        assert!(requests[0].system.contains("<EJEMPLOS_DE_SUBGRUPO>"));
    }

    #[tokio::test]
    async fn test_same_body_same_request() {
        let llm = MockProvider::default();
        let extractor = extractor_with(llm.clone(), ValidationConfig::default());
        extractor.extract("mismo texto", None).await.unwrap();
        extractor.extract("mismo texto", None).await.unwrap();

        let requests = llm.requests();
        assert_eq!(requests[0], requests[1]);
        assert_eq!(
            PromptBuilder::new(Arc::new(TaxonomySet::legislative())).hash(),
            extractor.prompt_hash()
        );
    }
}
