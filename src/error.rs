//! Error types for KyroInfer.
//!
//! All errors in KyroInfer are strongly typed using thiserror.
//! Conditions that are ordinary inference outcomes (an unreachable goal,
//! a detected loop, a contradiction raised by forward chaining) are *not*
//! errors: they are reported through [`crate::Resolution`].

use thiserror::Error;

use crate::mode::Regime;

/// Validation errors that occur during input validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Belief value {value} is out of range [-1.0, 1.0]")]
    BeliefOutOfRange {
        value: f64,
    },

    #[error("Reliability {value} is out of range [0.0, 1.0]")]
    ReliabilityOutOfRange {
        value: f64,
    },

    #[error("Atom name cannot be empty")]
    EmptyAtom,

    #[error("Malformed rule '{rule}': {reason}")]
    MalformedRule {
        rule: String,
        reason: String,
    },

    #[error("Discretization threshold {value} is out of range [0.0, 1.0)")]
    InvalidThreshold {
        value: f64,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },

    #[error("Unknown resolution mode code {code}")]
    UnknownModeCode {
        code: u8,
    },
}

/// Execution errors that occur while running the engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Atom not found: {atom}")]
    UnknownAtom {
        atom: String,
    },

    #[error("Resolution regime '{regime}' is not provided by this engine")]
    UnsupportedRegime {
        regime: Regime,
    },
}

/// Top-level error type for KyroInfer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl InferError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Shorthand for an unknown-atom execution error.
    #[must_use]
    pub fn unknown_atom(atom: impl Into<String>) -> Self {
        Self::Execution(ExecutionError::UnknownAtom { atom: atom.into() })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Result type alias for KyroInfer operations.
pub type InferResult<T> = Result<T, InferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_belief() {
        let err = ValidationError::BeliefOutOfRange { value: 1.5 };
        let msg = format!("{err}");
        assert!(msg.contains("1.5"));
        assert!(msg.contains("out of range"));
    }

    #[test]
    fn test_malformed_rule_message() {
        let err = ValidationError::MalformedRule {
            rule: "a ->".to_string(),
            reason: "missing consequent".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("a ->"));
        assert!(msg.contains("missing consequent"));
    }

    #[test]
    fn test_unsupported_regime_message() {
        let err = ExecutionError::UnsupportedRegime { regime: Regime::Mixed };
        assert!(format!("{err}").contains("mixed"));
    }

    #[test]
    fn test_infer_error_from_validation() {
        let err: InferError = ValidationError::EmptyAtom.into();
        assert!(err.is_validation());
        assert!(!err.is_execution());
    }

    #[test]
    fn test_infer_error_from_execution() {
        let err = InferError::unknown_atom("zeta");
        assert!(err.is_execution());
        assert!(format!("{err}").contains("zeta"));
    }

    #[test]
    fn test_infer_error_internal() {
        let err = InferError::internal("unexpected state");
        assert!(err.is_internal());
        assert!(format!("{err}").contains("unexpected state"));
    }
}
