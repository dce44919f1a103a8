//! Papyrus Gatekeeper
//!
//! Validates extraction records against the closed taxonomies before they
//! are persisted.
//!
//! The Gatekeeper provides:
//! - Closed-list membership checks per dimension
//! - Lenient canonicalization (case, accents, `_` for spaces)
//! - Subsector format and ISO date checks
//! - Coerce-to-sentinel or reject policies
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use papyrus_domain::{ExtractionRecord, TaxonomySet, SENTINEL};
//! use papyrus_gatekeeper::{Gatekeeper, ValidationConfig, ValidationStatus};
//!
//! let gatekeeper = Gatekeeper::new(ValidationConfig::default(), Arc::new(TaxonomySet::legislative()));
//!
//! let mut record = ExtractionRecord::unspecified();
//! record.fuente = "Ayuntamiento".to_string();
//!
//! let (record, result) = gatekeeper.repair(record);
//! assert_eq!(result.status, ValidationStatus::Repaired);
//! assert_eq!(record.fuente, SENTINEL);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod validator;

pub use config::{ValidationConfig, ValidationPolicy};
pub use error::GatekeeperError;
pub use validator::{
    fold, Correction, CorrectionKind, GateReport, Gatekeeper, RejectionReason, ValidationResult, ValidationStatus,
};
