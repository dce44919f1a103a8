//! Record validation logic

use crate::{GatekeeperError, ValidationConfig, ValidationPolicy};
use chrono::NaiveDate;
use papyrus_domain::{is_sentinel, Dimension, ExtractionRecord, TaxonomySet, SENTINEL};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Result of record validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Outcome for the record
    pub status: ValidationStatus,

    /// Violations found (if any)
    pub reasons: Vec<RejectionReason>,

    /// Field rewrites applied
    pub corrections: Vec<Correction>,
}

impl ValidationResult {
    /// Whether the record may be persisted
    pub fn is_accepted(&self) -> bool {
        self.status != ValidationStatus::Rejected
    }

    /// Number of rewrites of the given kind
    pub fn count(&self, kind: CorrectionKind) -> usize {
        self.corrections.iter().filter(|c| c.kind == kind).count()
    }
}

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Record valid as received
    Accepted,

    /// Record valid after rewriting one or more fields
    Repaired,

    /// Record violates its taxonomy and the policy forbids repair
    Rejected,
}

/// Reasons for rejection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// Closed-list field holds a value outside the taxonomy
    NotInTaxonomy {
        /// Dimension checked
        dimension: Dimension,
        /// Offending value
        value: String,
    },

    /// Subsector does not follow `"{sector} - {text}"`
    InvalidSubsectorFormat {
        /// Sector of the record
        sector: String,
        /// Offending subsector
        subsector: String,
    },

    /// Date is neither ISO `YYYY-MM-DD` nor the sentinel
    InvalidDate(String),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::NotInTaxonomy { dimension, value } => {
                write!(f, "{} '{}' is not in the taxonomy", dimension, value)
            }
            RejectionReason::InvalidSubsectorFormat { sector, subsector } => {
                write!(f, "subsector '{}' does not match sector '{}'", subsector, sector)
            }
            RejectionReason::InvalidDate(value) => write!(f, "fecha '{}' is not an ISO date", value),
        }
    }
}

/// Why a field was rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionKind {
    /// Lenient match rewritten to the canonical taxonomy member
    Canonicalized,

    /// Invalid value replaced by the sentinel
    Coerced,

    /// Missing field, or a variant spelling of the sentinel, set to the sentinel
    Defaulted,
}

/// One field rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    /// Record field name
    pub field: &'static str,
    /// Kind of rewrite
    pub kind: CorrectionKind,
    /// Value as received
    pub from: String,
    /// Value after the rewrite
    pub to: String,
}

/// Records after the gate, with counters for logging and statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateReport {
    /// Records to persist, in input order
    pub records: Vec<ExtractionRecord>,

    /// Records that needed at least one rewrite
    pub repaired: usize,

    /// Fields replaced by the sentinel
    pub fields_coerced: usize,

    /// Fields rewritten to their canonical taxonomy member
    pub fields_canonicalized: usize,
}

/// Case, accent and separator folding used for lenient matching
pub fn fold(value: &str) -> String {
    let folded: String = value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c == '_' { ' ' } else { c })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The Gatekeeper validates extraction records before persistence
pub struct Gatekeeper {
    config: ValidationConfig,
    taxonomies: Arc<TaxonomySet>,
    lookup: HashMap<Dimension, HashMap<String, String>>,
}

impl Gatekeeper {
    /// Create a new Gatekeeper over a taxonomy set
    pub fn new(config: ValidationConfig, taxonomies: Arc<TaxonomySet>) -> Self {
        let lookup = taxonomies
            .taxonomies
            .iter()
            .map(|taxonomy| {
                let mut folded = HashMap::new();
                folded.insert(fold(SENTINEL), SENTINEL.to_string());
                for value in &taxonomy.values {
                    folded.entry(fold(value)).or_insert_with(|| value.clone());
                }
                (taxonomy.dimension, folded)
            })
            .collect();

        Self {
            config,
            taxonomies,
            lookup,
        }
    }

    /// Create a Gatekeeper with default configuration
    pub fn default_config(taxonomies: Arc<TaxonomySet>) -> Self {
        Self::new(ValidationConfig::default(), taxonomies)
    }

    /// Active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Taxonomy set records are checked against
    pub fn taxonomies(&self) -> &TaxonomySet {
        &self.taxonomies
    }

    /// Check a record without keeping the rewrites
    pub fn validate(&self, record: &ExtractionRecord) -> ValidationResult {
        self.repair(record.clone()).1
    }

    /// Validate a record and rewrite it according to the policy
    ///
    /// Under `Reject` the returned record is the input, unchanged, whenever
    /// the status is `Rejected`.
    pub fn repair(&self, record: ExtractionRecord) -> (ExtractionRecord, ValidationResult) {
        let original = record.clone();
        let mut record = record;
        let mut reasons = Vec::new();
        let mut corrections = Vec::new();

        for dimension in self.taxonomies.closed_dimensions().collect::<Vec<_>>() {
            let value = record.value(dimension).to_string();
            if self.taxonomies.admits(dimension, &value) {
                continue;
            }

            if let Some(canonical) = self.canonical(dimension, &value) {
                let kind = if is_sentinel(&canonical) {
                    CorrectionKind::Defaulted
                } else {
                    CorrectionKind::Canonicalized
                };
                corrections.push(Correction {
                    field: dimension.field_name(),
                    kind,
                    from: value,
                    to: canonical.clone(),
                });
                record.set_value(dimension, canonical);
                continue;
            }

            reasons.push(RejectionReason::NotInTaxonomy {
                dimension,
                value: value.clone(),
            });
            corrections.push(Correction {
                field: dimension.field_name(),
                kind: CorrectionKind::Coerced,
                from: value,
                to: SENTINEL.to_string(),
            });
            record.set_value(dimension, SENTINEL);
        }

        if self.config.validate_subsector {
            self.check_subsector(&mut record, &mut reasons, &mut corrections);
        }

        if self.config.validate_fecha {
            self.check_fecha(&mut record, &mut reasons, &mut corrections);
        }

        self.shape_subgroup(&mut record, &mut corrections);

        let status = if !reasons.is_empty() && self.config.policy == ValidationPolicy::Reject {
            ValidationStatus::Rejected
        } else if corrections.is_empty() {
            ValidationStatus::Accepted
        } else {
            ValidationStatus::Repaired
        };

        let record = if status == ValidationStatus::Rejected {
            original
        } else {
            record
        };

        (
            record,
            ValidationResult {
                status,
                reasons,
                corrections,
            },
        )
    }

    /// Run every record of one document through the gate
    ///
    /// # Errors
    ///
    /// Returns `SchemaViolation` for the first rejected record.
    pub fn apply(&self, records: Vec<ExtractionRecord>) -> Result<GateReport, GatekeeperError> {
        if !self.config.enabled {
            return Ok(GateReport {
                records,
                ..GateReport::default()
            });
        }

        let mut report = GateReport {
            records: Vec::with_capacity(records.len()),
            ..GateReport::default()
        };

        for (index, record) in records.into_iter().enumerate() {
            let (record, result) = self.repair(record);

            if !result.is_accepted() {
                let details = result
                    .reasons
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(GatekeeperError::SchemaViolation { index, details });
            }

            for reason in &result.reasons {
                warn!(record = index, id = %record.id, reason = %reason, "Coerced field to sentinel");
            }
            for correction in result
                .corrections
                .iter()
                .filter(|c| c.kind == CorrectionKind::Canonicalized)
            {
                debug!(record = index, field = correction.field, from = %correction.from, to = %correction.to, "Canonicalized field");
            }

            if result.status == ValidationStatus::Repaired {
                report.repaired += 1;
            }
            report.fields_coerced += result.count(CorrectionKind::Coerced);
            report.fields_canonicalized += result.count(CorrectionKind::Canonicalized);
            report.records.push(record);
        }

        Ok(report)
    }

    fn canonical(&self, dimension: Dimension, value: &str) -> Option<String> {
        if !self.config.lenient_matching {
            return None;
        }
        self.lookup.get(&dimension)?.get(&fold(value)).cloned()
    }

    fn check_subsector(
        &self,
        record: &mut ExtractionRecord,
        reasons: &mut Vec<RejectionReason>,
        corrections: &mut Vec<Correction>,
    ) {
        let subsector = record.subsector.clone();
        if is_sentinel(&subsector) {
            return;
        }

        let sector = record.sector.clone();
        let parsed = subsector
            .split_once(" - ")
            .filter(|(_, rest)| !rest.trim().is_empty());

        if let (false, Some((prefix, rest))) = (is_sentinel(&sector), parsed) {
            if prefix == sector {
                return;
            }
            if self.config.lenient_matching && fold(prefix) == fold(&sector) {
                let canonical = format!("{} - {}", sector, rest);
                corrections.push(Correction {
                    field: "subsector",
                    kind: CorrectionKind::Canonicalized,
                    from: subsector,
                    to: canonical.clone(),
                });
                record.subsector = canonical;
                return;
            }
        }

        reasons.push(RejectionReason::InvalidSubsectorFormat {
            sector,
            subsector: subsector.clone(),
        });
        corrections.push(Correction {
            field: "subsector",
            kind: CorrectionKind::Coerced,
            from: subsector,
            to: SENTINEL.to_string(),
        });
        record.subsector = SENTINEL.to_string();
    }

    fn check_fecha(
        &self,
        record: &mut ExtractionRecord,
        reasons: &mut Vec<RejectionReason>,
        corrections: &mut Vec<Correction>,
    ) {
        let fecha = record.fecha.clone();
        if is_sentinel(&fecha) || NaiveDate::parse_from_str(&fecha, "%Y-%m-%d").is_ok() {
            return;
        }
        if self.config.lenient_matching && fold(&fecha) == fold(SENTINEL) {
            corrections.push(Correction {
                field: "fecha",
                kind: CorrectionKind::Defaulted,
                from: fecha,
                to: SENTINEL.to_string(),
            });
            record.fecha = SENTINEL.to_string();
            return;
        }

        reasons.push(RejectionReason::InvalidDate(fecha.clone()));
        corrections.push(Correction {
            field: "fecha",
            kind: CorrectionKind::Coerced,
            from: fecha,
            to: SENTINEL.to_string(),
        });
        record.fecha = SENTINEL.to_string();
    }

    /// `subgrupo` exists only in variants that define it
    fn shape_subgroup(&self, record: &mut ExtractionRecord, corrections: &mut Vec<Correction>) {
        let has_subgroup = self.taxonomies.variant.has_subgroup();
        match (&record.subgrupo, has_subgroup) {
            (Some(value), false) => {
                debug!(subgrupo = %value, "Dropping subgrupo from a variant without it");
                record.subgrupo = None;
            }
            (None, true) => {
                corrections.push(Correction {
                    field: "subgrupo",
                    kind: CorrectionKind::Defaulted,
                    from: String::new(),
                    to: SENTINEL.to_string(),
                });
                record.subgrupo = Some(SENTINEL.to_string());
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn legislative() -> Gatekeeper {
        Gatekeeper::default_config(Arc::new(TaxonomySet::legislative()))
    }

    fn valid_record() -> ExtractionRecord {
        ExtractionRecord {
            id: "121/000023".to_string(),
            tipo_iniciativa: "Proyecto de ley".to_string(),
            titulo_iniciativa: "Ley de Movilidad Sostenible".to_string(),
            sector: "Movilidad".to_string(),
            subsector: "Movilidad - VTC".to_string(),
            tema: "Vehículos".to_string(),
            marco_geografico: "Nacional".to_string(),
            fuente: "Congreso".to_string(),
            proponente: "Gobierno".to_string(),
            subgrupo: None,
            fecha: "2024-02-20".to_string(),
        }
    }

    #[test]
    fn test_valid_record() {
        let result = legislative().validate(&valid_record());
        assert_eq!(result.status, ValidationStatus::Accepted);
        assert!(result.reasons.is_empty());
        assert!(result.corrections.is_empty());
    }

    #[test]
    fn test_sentinel_is_always_valid() {
        let result = legislative().validate(&ExtractionRecord::unspecified());
        assert_eq!(result.status, ValidationStatus::Accepted);
    }

    #[test]
    fn test_invalid_value_coerced_to_sentinel() {
        let mut record = valid_record();
        record.fuente = "Ayuntamiento".to_string();

        let (repaired, result) = legislative().repair(record);
        assert_eq!(result.status, ValidationStatus::Repaired);
        assert_eq!(repaired.fuente, SENTINEL);
        assert_eq!(
            result.reasons,
            vec![RejectionReason::NotInTaxonomy {
                dimension: Dimension::Fuente,
                value: "Ayuntamiento".to_string()
            }]
        );
        assert_eq!(result.count(CorrectionKind::Coerced), 1);
        assert_eq!(result.count(CorrectionKind::Canonicalized), 0);
    }

    #[test]
    fn test_lenient_match_is_canonicalized() {
        let mut record = valid_record();
        record.tipo_iniciativa = "proyecto_de_ley".to_string();
        record.marco_geografico = "NACIONAL".to_string();
        record.sector = "movilidad".to_string();

        let (repaired, result) = legislative().repair(record);
        assert!(result.reasons.is_empty());
        assert_eq!(result.status, ValidationStatus::Repaired);
        assert_eq!(repaired.tipo_iniciativa, "Proyecto de ley");
        assert_eq!(repaired.marco_geografico, "Nacional");
        assert_eq!(repaired.sector, "Movilidad");
        assert_eq!(repaired.subsector, "Movilidad - VTC");
    }

    #[test]
    fn test_accent_folding() {
        let mut record = valid_record();
        record.sector = "Energia".to_string();
        record.subsector = "energía - Renovables".to_string();

        let (repaired, result) = legislative().repair(record);
        assert!(result.reasons.is_empty());
        assert_eq!(repaired.sector, "Energía");
        assert_eq!(repaired.subsector, "Energía - Renovables");
    }

    #[test]
    fn test_exact_matching_when_not_lenient() {
        let config = ValidationConfig {
            lenient_matching: false,
            ..ValidationConfig::default()
        };
        let gate = Gatekeeper::new(config, Arc::new(TaxonomySet::legislative()));
        let mut record = valid_record();
        record.tipo_iniciativa = "proyecto_de_ley".to_string();

        let (repaired, result) = gate.repair(record);
        assert_eq!(repaired.tipo_iniciativa, SENTINEL);
        assert_eq!(result.reasons.len(), 1);
    }

    #[test]
    fn test_subsector_must_follow_sector() {
        let mut record = valid_record();
        record.subsector = "Salud - Dental".to_string();

        let (repaired, result) = legislative().repair(record);
        assert_eq!(repaired.subsector, SENTINEL);
        assert!(matches!(
            result.reasons[0],
            RejectionReason::InvalidSubsectorFormat { .. }
        ));
    }

    #[test]
    fn test_subsector_invalidated_with_coerced_sector() {
        let mut record = valid_record();
        record.sector = "Astronáutica".to_string();
        record.subsector = "Astronáutica - Cohetes".to_string();

        let (repaired, result) = legislative().repair(record);
        assert_eq!(repaired.sector, SENTINEL);
        assert_eq!(repaired.subsector, SENTINEL);
        assert_eq!(result.reasons.len(), 2);
    }

    #[test]
    fn test_invalid_date() {
        let mut record = valid_record();
        record.fecha = "20/02/2024".to_string();

        let (repaired, result) = legislative().repair(record);
        assert_eq!(repaired.fecha, SENTINEL);
        assert_eq!(result.reasons, vec![RejectionReason::InvalidDate("20/02/2024".to_string())]);
    }

    #[test]
    fn test_permissive_config_skips_format_checks() {
        let gate = Gatekeeper::new(ValidationConfig::permissive(), Arc::new(TaxonomySet::legislative()));
        let mut record = valid_record();
        record.fecha = "ayer".to_string();
        record.subsector = "libre".to_string();

        let result = gate.validate(&record);
        assert_eq!(result.status, ValidationStatus::Accepted);
    }

    #[test]
    fn test_reject_policy_keeps_record_and_fails_apply() {
        let gate = Gatekeeper::new(ValidationConfig::strict(), Arc::new(TaxonomySet::legislative()));
        let mut record = valid_record();
        record.sector = "Astronáutica".to_string();

        let (kept, result) = gate.repair(record.clone());
        assert_eq!(result.status, ValidationStatus::Rejected);
        assert_eq!(kept, record);

        let err = gate.apply(vec![valid_record(), record]).unwrap_err();
        assert!(matches!(err, GatekeeperError::SchemaViolation { index: 1, .. }));
    }

    #[test]
    fn test_apply_counts() {
        let mut bad = valid_record();
        bad.fuente = "Ayuntamiento".to_string();
        let mut lenient = valid_record();
        lenient.fuente = "congreso".to_string();

        let report = legislative().apply(vec![valid_record(), bad, lenient]).unwrap();
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.repaired, 2);
        assert_eq!(report.fields_coerced, 1);
        assert_eq!(report.fields_canonicalized, 1);
        assert_eq!(report.records[2].fuente, "Congreso");
    }

    #[test]
    fn test_only_taxonomy_matches_count_as_canonicalized() {
        let gate = Gatekeeper::default_config(Arc::new(TaxonomySet::normative()));
        let mut record = ExtractionRecord::unspecified();
        record.tipo_iniciativa = "Orden".to_string();
        record.fecha = "no_especificado".to_string();

        let (repaired, result) = gate.repair(record.clone());
        assert_eq!(repaired.fecha, SENTINEL);
        assert_eq!(repaired.subgrupo.as_deref(), Some(SENTINEL));
        assert_eq!(result.count(CorrectionKind::Defaulted), 2);
        assert_eq!(result.count(CorrectionKind::Canonicalized), 0);

        let report = gate.apply(vec![record]).unwrap();
        assert_eq!(report.repaired, 1);
        assert_eq!(report.fields_canonicalized, 0);
        assert_eq!(report.fields_coerced, 0);
    }

    #[test]
    fn test_disabled_gate_passes_through() {
        let gate = Gatekeeper::new(ValidationConfig::disabled(), Arc::new(TaxonomySet::legislative()));
        let mut record = valid_record();
        record.fuente = "Ayuntamiento".to_string();

        let report = gate.apply(vec![record.clone()]).unwrap();
        assert_eq!(report.records, vec![record]);
        assert_eq!(report.fields_coerced, 0);
    }

    #[test]
    fn test_normative_proponente_is_closed_and_subgroup_shaped() {
        let gate = Gatekeeper::default_config(Arc::new(TaxonomySet::normative()));
        let mut record = ExtractionRecord::unspecified();
        record.tipo_iniciativa = "Orden".to_string();
        record.proponente = "Grupo Popular".to_string();

        let (repaired, result) = gate.repair(record);
        assert_eq!(repaired.proponente, SENTINEL);
        assert_eq!(repaired.subgrupo.as_deref(), Some(SENTINEL));
        assert_eq!(result.reasons.len(), 1);
    }

    #[test]
    fn test_legislative_drops_subgroup() {
        let mut record = valid_record();
        record.subgrupo = Some("Consejería de Salud".to_string());
        let (repaired, _) = legislative().repair(record);
        assert!(repaired.subgrupo.is_none());
    }

    #[test]
    fn test_fold() {
        assert_eq!(fold("  Proyecto_de_LEY "), "proyecto de ley");
        assert_eq!(fold("Energía"), fold("energia"));
        assert_eq!(fold("No Especificado"), fold(SENTINEL));
    }

    proptest! {
        #[test]
        fn coerced_records_only_hold_members_or_sentinel(
            sector in "\\PC{0,12}",
            fuente in "\\PC{0,12}",
            tipo in "\\PC{0,12}",
            marco in "\\PC{0,12}",
        ) {
            let gate = legislative();
            let mut record = valid_record();
            record.sector = sector;
            record.fuente = fuente;
            record.tipo_iniciativa = tipo;
            record.marco_geografico = marco;

            let (repaired, result) = gate.repair(record);
            prop_assert!(result.is_accepted());
            let taxonomies = gate.taxonomies();
            for dimension in taxonomies.closed_dimensions().collect::<Vec<_>>() {
                prop_assert!(taxonomies.admits(dimension, repaired.value(dimension)));
            }
        }
    }
}
