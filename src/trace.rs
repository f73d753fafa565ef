//! Proof trace.
//!
//! An append-only, stack-structured log of rule firings and failures. It is
//! rebuilt at the start of every resolution and can be rolled back one entry
//! at a time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rule::RuleId;

/// One rule attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TraceEntry {
    /// The rule concluded `atom` with `value`.
    Fired {
        /// Rule used.
        rule: RuleId,
        /// Concluded atom.
        atom: String,
        /// Value attached to the conclusion.
        value: f64,
    },
    /// The rule could not conclude `atom`.
    Failed {
        /// Rule tried.
        rule: RuleId,
        /// Atom the rule failed to establish.
        atom: String,
    },
}

impl TraceEntry {
    /// Rule concerned by this entry.
    #[must_use]
    pub const fn rule(&self) -> RuleId {
        match self {
            Self::Fired { rule, .. } | Self::Failed { rule, .. } => *rule,
        }
    }

    /// True for a successful firing.
    #[must_use]
    pub const fn is_fired(&self) -> bool {
        matches!(self, Self::Fired { .. })
    }
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fired { rule, atom, value } => write!(f, "Using {rule} {atom} is {value}"),
            Self::Failed { rule, atom } => write!(f, "{rule} failed for {atom}"),
        }
    }
}

/// Ordered log of [`TraceEntry`] values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProofTrace {
    entries: Vec<TraceEntry>,
}

impl ProofTrace {
    /// Creates an empty trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful firing.
    pub fn add(&mut self, rule: RuleId, atom: impl Into<String>, value: f64) {
        self.entries.push(TraceEntry::Fired {
            rule,
            atom: atom.into(),
            value,
        });
    }

    /// Record a failed attempt.
    pub fn add_failure(&mut self, rule: RuleId, atom: impl Into<String>) {
        self.entries.push(TraceEntry::Failed {
            rule,
            atom: atom.into(),
        });
    }

    /// Pop the most recent entry.
    pub fn remove(&mut self) -> Option<TraceEntry> {
        self.entries.pop()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rules that fired, in firing order.
    pub fn fired_rules(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.entries.iter().filter(|e| e.is_fired()).map(TraceEntry::rule)
    }
}

impl fmt::Display for ProofTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}
