//! Gatekeeper configuration

use serde::{Deserialize, Serialize};

/// What to do with a field that violates its taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Replace the value with the sentinel and log it
    Coerce,

    /// Fail the whole document as a schema violation
    Reject,
}

/// Configuration for validation rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Enable the gate at all
    pub enabled: bool,

    /// Handling of invalid closed-list values
    pub policy: ValidationPolicy,

    /// Accept taxonomy members modulo case, accents and `_` (canonicalized)
    pub lenient_matching: bool,

    /// Check `subsector` against the `"{sector} - {text}"` format
    pub validate_subsector: bool,

    /// Check `fecha` is an ISO date (`YYYY-MM-DD`)
    pub validate_fecha: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: ValidationPolicy::Coerce,
            lenient_matching: true,
            validate_subsector: true,
            validate_fecha: true,
        }
    }
}

impl ValidationConfig {
    /// Create a permissive configuration (closed lists only, coerced)
    pub fn permissive() -> Self {
        Self {
            enabled: true,
            policy: ValidationPolicy::Coerce,
            lenient_matching: true,
            validate_subsector: false,
            validate_fecha: false,
        }
    }

    /// Create a strict configuration (exact matching, violations fail the document)
    pub fn strict() -> Self {
        Self {
            enabled: true,
            policy: ValidationPolicy::Reject,
            lenient_matching: false,
            validate_subsector: true,
            validate_fecha: true,
        }
    }

    /// Pass every record through untouched
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidationConfig::default();
        assert!(config.enabled);
        assert_eq!(config.policy, ValidationPolicy::Coerce);
        assert!(config.lenient_matching);
    }

    #[test]
    fn test_permissive_config() {
        let config = ValidationConfig::permissive();
        assert!(!config.validate_subsector);
        assert!(!config.validate_fecha);
    }

    #[test]
    fn test_strict_config() {
        let config = ValidationConfig::strict();
        assert_eq!(config.policy, ValidationPolicy::Reject);
        assert!(!config.lenient_matching);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ValidationConfig = toml::from_str("policy = \"reject\"").unwrap();
        assert_eq!(config.policy, ValidationPolicy::Reject);
        assert!(config.enabled);
        assert!(config.validate_fecha);
    }
}
