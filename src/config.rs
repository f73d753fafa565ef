//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Configuration for an [`crate::InferenceEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Symmetric discretization threshold: belief above `threshold` is +1,
    /// below `-threshold` is -1, anything else is 0.
    pub threshold: f64,
    /// Number of decimal digits kept by certainty-factor arithmetic.
    pub cf_precision: u32,
    /// Atom-name prefixes that mark an already-negated literal.
    pub negation_markers: Vec<String>,
    /// Prefix used when a negative partner has to be synthesized.
    pub negation_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            cf_precision: 3,
            negation_markers: vec!["not-".to_string(), "non-".to_string(), "pas-".to_string()],
            negation_prefix: "non-".to_string(),
        }
    }
}

impl EngineConfig {
    const MAX_PRECISION: u32 = 9;

    /// Validate the configuration, returning it unchanged on success.
    ///
    /// # Errors
    ///
    /// - `InvalidThreshold` if `threshold` is not in `[0.0, 1.0)`
    /// - `InvalidConfig` if the precision is too large, a marker is blank,
    ///   or the synthesis prefix is not one of the markers
    pub fn validate(self) -> Result<Self, ValidationError> {
        if !(0.0..1.0).contains(&self.threshold) || self.threshold.is_nan() {
            return Err(ValidationError::InvalidThreshold {
                value: self.threshold,
            });
        }

        if self.cf_precision > Self::MAX_PRECISION {
            return Err(ValidationError::InvalidConfig {
                reason: format!(
                    "cf_precision must be at most {} (got {})",
                    Self::MAX_PRECISION,
                    self.cf_precision
                ),
            });
        }

        if self.negation_markers.is_empty() {
            return Err(ValidationError::InvalidConfig {
                reason: "negation_markers cannot be empty".to_string(),
            });
        }

        if self.negation_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(ValidationError::InvalidConfig {
                reason: "negation markers cannot be blank".to_string(),
            });
        }

        if !self.negation_markers.contains(&self.negation_prefix) {
            return Err(ValidationError::InvalidConfig {
                reason: format!(
                    "negation_prefix '{}' must be one of the negation markers",
                    self.negation_prefix
                ),
            });
        }

        Ok(self)
    }

    /// Parse and validate a JSON configuration. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on malformed JSON, or any `validate` error.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| ValidationError::InvalidConfig {
            reason: format!("failed to parse configuration: {e}"),
        })?;
        cfg.validate()
    }

    /// Returns the negation marker `atom` starts with, if any.
    #[must_use]
    pub fn negation_marker_of(&self, atom: &str) -> Option<&str> {
        self.negation_markers
            .iter()
            .map(String::as_str)
            .find(|m| atom.starts_with(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let cfg = EngineConfig::default().validate().unwrap();
        assert!((cfg.threshold - 0.2).abs() < f64::EPSILON);
        assert_eq!(cfg.cf_precision, 3);
        assert_eq!(cfg.negation_markers.len(), 3);
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let cfg = EngineConfig {
            threshold: 1.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ValidationError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_rejects_prefix_outside_markers() {
        let cfg = EngineConfig {
            negation_prefix: "no-".to_string(),
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let cfg = EngineConfig::from_json(r#"{"threshold": 0.5}"#).unwrap();
        assert!((cfg.threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(cfg.negation_prefix, "non-");
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(EngineConfig::from_json("{threshold").is_err());
    }

    #[test]
    fn test_marker_lookup() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.negation_marker_of("pas-pressé"), Some("pas-"));
        assert_eq!(cfg.negation_marker_of("pressé"), None);
    }
}
