//! Extraction records and results
//!
//! These types are the persisted wire contract:
//!
//! ```text
//! {"iniciativas": [ {id, tipo_iniciativa, ..., fecha} ],
//!  "extraction_metadata": {document_id, extraction_date, model, total_initiatives, tokens?}}
//! ```
//!
//! Deserialization is lenient on purpose: results written by older runs and
//! raw model output both pass through here, so missing, null, empty or
//! non-string field values become the sentinel instead of an error.

use crate::taxonomy::{Dimension, SENTINEL};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

fn sentinel() -> String {
    SENTINEL.to_string()
}

/// Read any JSON value as a field string, mapping blanks and nulls to the sentinel
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_field(value).unwrap_or_else(sentinel))
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(value_to_field(value).unwrap_or_else(sentinel)))
}

fn value_to_field(value: Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// One extracted initiative or normative update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Official reference or sentinel
    #[serde(default = "sentinel", deserialize_with = "lenient_string")]
    pub id: String,

    /// Closed list
    #[serde(default = "sentinel", deserialize_with = "lenient_string")]
    pub tipo_iniciativa: String,

    /// Free text
    #[serde(default = "sentinel", deserialize_with = "lenient_string")]
    pub titulo_iniciativa: String,

    /// Closed list
    #[serde(default = "sentinel", deserialize_with = "lenient_string")]
    pub sector: String,

    /// Free text in the form `"{sector} - {subsector}"`
    #[serde(default = "sentinel", deserialize_with = "lenient_string")]
    pub subsector: String,

    /// Free text
    #[serde(default = "sentinel", deserialize_with = "lenient_string")]
    pub tema: String,

    /// Closed list
    #[serde(default = "sentinel", deserialize_with = "lenient_string")]
    pub marco_geografico: String,

    /// Closed list
    #[serde(default = "sentinel", deserialize_with = "lenient_string")]
    pub fuente: String,

    /// Free text, or closed list for normative updates
    #[serde(default = "sentinel", deserialize_with = "lenient_string")]
    pub proponente: String,

    /// Promoting body within the proponent (normative updates only)
    #[serde(
        default,
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub subgrupo: Option<String>,

    /// ISO date or sentinel
    #[serde(default = "sentinel", deserialize_with = "lenient_string")]
    pub fecha: String,
}

impl ExtractionRecord {
    /// A record with every field set to the sentinel
    pub fn unspecified() -> Self {
        Self {
            id: sentinel(),
            tipo_iniciativa: sentinel(),
            titulo_iniciativa: sentinel(),
            sector: sentinel(),
            subsector: sentinel(),
            tema: sentinel(),
            marco_geografico: sentinel(),
            fuente: sentinel(),
            proponente: sentinel(),
            subgrupo: None,
            fecha: sentinel(),
        }
    }

    /// Value of a classification dimension
    pub fn value(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::TipoIniciativa => &self.tipo_iniciativa,
            Dimension::Sector => &self.sector,
            Dimension::MarcoGeografico => &self.marco_geografico,
            Dimension::Fuente => &self.fuente,
            Dimension::Proponente => &self.proponente,
        }
    }

    /// Replace the value of a classification dimension
    pub fn set_value(&mut self, dimension: Dimension, value: impl Into<String>) {
        let value = value.into();
        match dimension {
            Dimension::TipoIniciativa => self.tipo_iniciativa = value,
            Dimension::Sector => self.sector = value,
            Dimension::MarcoGeografico => self.marco_geografico = value,
            Dimension::Fuente => self.fuente = value,
            Dimension::Proponente => self.proponente = value,
        }
    }
}

impl Default for ExtractionRecord {
    fn default() -> Self {
        Self::unspecified()
    }
}

/// Token counts reported by the reasoning service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    #[serde(default)]
    pub input: u64,

    /// Completion tokens
    #[serde(default)]
    pub output: u64,

    /// Total tokens billed
    #[serde(default)]
    pub total: u64,
}

/// Metadata attached to every extraction result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Source document key
    #[serde(default)]
    pub document_id: Option<String>,

    /// ISO-8601 timestamp of the extraction
    #[serde(default)]
    pub extraction_date: String,

    /// Model identifier
    #[serde(default)]
    pub model: String,

    /// Number of records in the result
    #[serde(default)]
    pub total_initiatives: usize,

    /// Token usage, when the service reported it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenUsage>,

    /// Taxonomy version the records were validated against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy_version: Option<String>,

    /// SHA-256 of the instruction text sent to the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_hash: Option<String>,
}

/// The persisted outcome of extracting one document
///
/// Never mutated after creation; re-extraction replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted records, in service order
    #[serde(default)]
    pub iniciativas: Vec<ExtractionRecord>,

    /// Extraction metadata
    #[serde(default)]
    pub extraction_metadata: ExtractionMetadata,
}

impl ExtractionResult {
    /// Number of records
    pub fn record_count(&self) -> usize {
        self.iniciativas.len()
    }

    /// Whether the result carries at least one record
    pub fn has_records(&self) -> bool {
        !self.iniciativas.is_empty()
    }

    /// Total tokens spent, zero when unreported
    pub fn total_tokens(&self) -> u64 {
        self.extraction_metadata
            .tokens
            .map(|t| t.total)
            .unwrap_or(0)
    }
}
