//! Distribution summary over persisted extraction results

use crate::BatchError;
use papyrus_domain::traits::DocumentStore;
use papyrus_domain::{Dimension, ExtractionRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::debug;

/// Result of [`summarize`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Summary {
    /// No document of the collection carries a record
    NoData {
        /// Collection scanned
        collection: String,
    },

    /// Frequency counts over every record of the collection
    Distribution(DistributionSummary),
}

impl Summary {
    /// Collection scanned
    pub fn collection(&self) -> &str {
        match self {
            Summary::NoData { collection } => collection,
            Summary::Distribution(d) => &d.collection,
        }
    }

    /// The distribution, when there was data
    pub fn distribution(&self) -> Option<&DistributionSummary> {
        match self {
            Summary::NoData { .. } => None,
            Summary::Distribution(d) => Some(d),
        }
    }
}

/// Frequency counts per classification dimension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistributionSummary {
    /// Collection scanned
    pub collection: String,

    /// Records across all documents
    pub total_initiatives: usize,

    /// Documents contributing at least one record
    pub documents: usize,

    /// Counts by `tipo_iniciativa`
    pub by_type: BTreeMap<String, usize>,

    /// Counts by `sector`
    pub by_sector: BTreeMap<String, usize>,

    /// Counts by `proponente`
    pub by_proponente: BTreeMap<String, usize>,

    /// Counts by `marco_geografico`
    pub by_marco_geografico: BTreeMap<String, usize>,
}

impl DistributionSummary {
    fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            ..Self::default()
        }
    }

    fn add(&mut self, record: &ExtractionRecord) {
        self.total_initiatives += 1;
        bump(&mut self.by_type, record.value(Dimension::TipoIniciativa));
        bump(&mut self.by_sector, record.value(Dimension::Sector));
        bump(&mut self.by_proponente, record.value(Dimension::Proponente));
        bump(&mut self.by_marco_geografico, record.value(Dimension::MarcoGeografico));
    }

    /// Counts for one dimension, if summarized
    ///
    /// `fuente` is not part of the distribution.
    pub fn counts(&self, dimension: Dimension) -> Option<&BTreeMap<String, usize>> {
        match dimension {
            Dimension::TipoIniciativa => Some(&self.by_type),
            Dimension::Sector => Some(&self.by_sector),
            Dimension::Proponente => Some(&self.by_proponente),
            Dimension::MarcoGeografico => Some(&self.by_marco_geografico),
            Dimension::Fuente => None,
        }
    }
}

fn bump(counts: &mut BTreeMap<String, usize>, value: &str) {
    *counts.entry(value.to_string()).or_insert(0) += 1;
}

/// Entries ordered by descending count, ties by value
pub fn ranked(counts: &BTreeMap<String, usize>) -> Vec<(&str, usize)> {
    let mut entries: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}

/// Summarize the extraction results of a collection
///
/// Pure read. Documents whose result has no records contribute nothing.
pub fn summarize<S>(store: &S, collection: &str) -> Result<Summary, BatchError>
where
    S: DocumentStore,
    S::Error: Display,
{
    let results = store
        .extraction_results(collection)
        .map_err(|e| BatchError::Store(e.to_string()))?;

    let mut distribution = DistributionSummary::new(collection);
    for result in results.iter().filter(|r| r.has_records()) {
        distribution.documents += 1;
        for record in &result.iniciativas {
            distribution.add(record);
        }
    }

    debug!(
        collection,
        results = results.len(),
        documents = distribution.documents,
        initiatives = distribution.total_initiatives,
        "Summarized collection"
    );

    if distribution.total_initiatives == 0 {
        return Ok(Summary::NoData {
            collection: collection.to_string(),
        });
    }
    Ok(Summary::Distribution(distribution))
}
