//! Configuration management for the CLI.
//!
//! One TOML file, one section per component:
//!
//! ```toml
//! [store]
//! path = "/var/lib/papyrus/papyrus.db"
//!
//! [llm]
//! model = "gpt-5-mini"
//! api_key_env = "OPENAI_API_KEY"
//!
//! [batch]
//! concurrency = 4
//!
//! [taxonomy]
//! variant = "legislative_initiatives"
//! ```

use crate::error::{CliError, Result};
use papyrus_batch::BatchConfig;
use papyrus_domain::{ExtractionVariant, TaxonomySet};
use papyrus_extractor::ExtractorConfig;
use papyrus_gatekeeper::ValidationConfig;
use papyrus_ingest::FetchConfig;
use papyrus_llm::OpenAiConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document store location
    pub store: StoreSettings,

    /// Reasoning service
    pub llm: OpenAiConfig,

    /// Remote PDF/HTML downloads
    pub fetch: FetchConfig,

    /// Extraction client
    pub extractor: ExtractorConfig,

    /// Validation gate
    pub validation: ValidationConfig,

    /// Batch orchestrator
    pub batch: BatchConfig,

    /// Taxonomy selection
    pub taxonomy: TaxonomySettings,

    /// Output settings
    pub settings: Settings,
}

/// Document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// SQLite database file
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        let path = dirs::home_dir()
            .map(|home| home.join(".papyrus").join("papyrus.db"))
            .unwrap_or_else(|| PathBuf::from("papyrus.db"));
        Self { path }
    }
}

/// Taxonomy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomySettings {
    /// Built-in taxonomy set to use
    pub variant: ExtractionVariant,

    /// TOML file holding a custom taxonomy set; replaces the built-in one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for TaxonomySettings {
    fn default() -> Self {
        Self {
            variant: ExtractionVariant::LegislativeInitiatives,
            file: None,
        }
    }
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".papyrus").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. The default path falls back to
    /// built-in defaults when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!("{} does not exist", path.display())));
                }
                path.to_path_buf()
            }
            None => match Self::path() {
                Ok(path) if path.exists() => path,
                _ => {
                    debug!("No configuration file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!(path = %path.display(), "Loading configuration");
        Self::from_toml(&fs::read_to_string(&path)?)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        let sections = [
            ("llm", self.llm.validate()),
            ("fetch", self.fetch.validate()),
            ("extractor", self.extractor.validate()),
            ("batch", self.batch.validate()),
        ];
        for (section, outcome) in sections {
            outcome.map_err(|e| CliError::Config(format!("[{}] {}", section, e)))?;
        }

        // every retry must fit inside the extraction deadline
        let budget = self.llm.call_budget();
        if budget > self.extractor.extraction_timeout() {
            return Err(CliError::Config(format!(
                "[llm] {} attempts of {}s need up to {}s, more than [extractor] extraction_timeout_secs = {}",
                self.llm.max_retries,
                self.llm.timeout_secs,
                budget.as_secs(),
                self.extractor.extraction_timeout_secs
            )));
        }
        Ok(())
    }

    /// Taxonomy set for a run.
    ///
    /// A configured file wins over the built-in sets; otherwise the variant
    /// override, then the configured variant, picks the built-in set.
    pub fn taxonomies(&self, variant: Option<ExtractionVariant>) -> Result<TaxonomySet> {
        let set = match &self.taxonomy.file {
            Some(file) => {
                let set: TaxonomySet = toml::from_str(&fs::read_to_string(file)?)?;
                if let Some(requested) = variant {
                    if requested != set.variant {
                        return Err(CliError::Config(format!(
                            "{} holds {} taxonomies, {} requested",
                            file.display(),
                            set.variant.label(),
                            requested.label()
                        )));
                    }
                }
                set
            }
            None => TaxonomySet::for_variant(variant.unwrap_or(self.taxonomy.variant)),
        };

        set.validate()
            .map_err(|e| CliError::Config(format!("[taxonomy] {}", e)))?;
        debug!(version = %set.version, "Taxonomy loaded");
        Ok(set)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.settings.color);
        assert_eq!(config.settings.format, OutputFormat::Table);
        assert_eq!(config.batch, BatchConfig::default());
        assert!(config.store.path.ends_with("papyrus.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [store]
            path = "/tmp/bulletins.db"

            [llm]
            model = "gpt-4o-mini"

            [batch]
            concurrency = 2

            [taxonomy]
            variant = "normative_updates"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.path, PathBuf::from("/tmp/bulletins.db"));
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.batch.concurrency, 2);
        assert_eq!(config.batch.inter_document_delay_ms, 100);
        assert_eq!(config.taxonomy.variant, ExtractionVariant::NormativeUpdates);
    }

    #[test]
    fn test_invalid_section_is_reported() {
        let config = Config::from_toml("[batch]\nconcurrency = 0\n").unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("[batch]"));
    }

    #[test]
    fn test_retries_must_fit_extraction_timeout() {
        let config = Config::default();
        assert!(config.llm.call_budget() <= config.extractor.extraction_timeout());

        let config = Config::from_toml("[llm]\ntimeout_secs = 120\n").unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("extraction_timeout_secs"));

        let config = Config::from_toml(
            "[llm]\ntimeout_secs = 120\n\n[extractor]\nextraction_timeout_secs = 400\n",
        )
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/papyrus.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.batch.force = true;
        config.settings.format = OutputFormat::Json;
        config.save(&path).unwrap();

        let loaded = Config::load(Some(path.as_path())).unwrap();
        assert!(loaded.batch.force);
        assert_eq!(loaded.settings.format, OutputFormat::Json);
    }

    #[test]
    fn test_variant_override() {
        let config = Config::default();
        assert_eq!(config.taxonomies(None).unwrap().version, "legislative-2025.1");
        assert_eq!(
            config
                .taxonomies(Some(ExtractionVariant::NormativeUpdates))
                .unwrap()
                .version,
            "normative-2025.1"
        );
    }

    #[test]
    fn test_taxonomy_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("taxonomy.toml");
        let mut custom = TaxonomySet::legislative();
        custom.version = "legislative-custom".to_string();
        fs::write(&file, toml::to_string(&custom).unwrap()).unwrap();

        let mut config = Config::default();
        config.taxonomy.file = Some(file);

        assert_eq!(config.taxonomies(None).unwrap().version, "legislative-custom");
        assert!(config
            .taxonomies(Some(ExtractionVariant::NormativeUpdates))
            .is_err());
    }
}
