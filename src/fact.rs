//! Facts: the atomic unit of knowledge.
//!
//! A fact is created the first time its atom is referenced and lives as long
//! as the engine that created it. Its belief is a continuous value in
//! `[-1.0, 1.0]`; reasoning over it mostly happens through the tri-state
//! [`Discrete`] view.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rule::RuleId;

/// Engine-scoped fact identifier, assigned at first reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactId(u32);

impl FactId {
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{:02}", self.0)
    }
}

/// Tri-state view of a belief.
///
/// Variants are ordered so that `min` over antecedents implements conjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discrete {
    /// Belief below `-threshold`.
    Negative,
    /// Belief within `[-threshold, threshold]`.
    Unknown,
    /// Belief above `threshold`.
    Positive,
}

impl Discrete {
    /// Returns -1, 0 or +1.
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        match self {
            Self::Negative => -1,
            Self::Unknown => 0,
            Self::Positive => 1,
        }
    }
}

/// Map a belief onto the tri-state scale using symmetric thresholds.
#[must_use]
pub fn discretize(belief: f64, threshold: f64) -> Discrete {
    if belief > threshold {
        Discrete::Positive
    } else if belief < -threshold {
        Discrete::Negative
    } else {
        Discrete::Unknown
    }
}

/// A named proposition with a belief value and its rule memberships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    id: FactId,
    pub(crate) belief: f64,
    pub(crate) antecedent_of: Vec<RuleId>,
    pub(crate) consequent_of: Vec<RuleId>,
}

impl Fact {
    pub(crate) fn new(id: FactId) -> Self {
        Self {
            id,
            belief: 0.0,
            antecedent_of: Vec::new(),
            consequent_of: Vec::new(),
        }
    }

    /// Unique id of this fact.
    #[must_use]
    pub const fn id(&self) -> FactId {
        self.id
    }

    /// Current belief value.
    #[must_use]
    pub const fn belief(&self) -> f64 {
        self.belief
    }

    /// Rules where this fact appears on the left-hand side.
    #[must_use]
    pub fn antecedent_of(&self) -> &[RuleId] {
        &self.antecedent_of
    }

    /// Rules concluding this fact.
    #[must_use]
    pub fn consequent_of(&self) -> &[RuleId] {
        &self.consequent_of
    }

    /// A fact is provable when at least one rule concludes it.
    #[must_use]
    pub fn provable(&self) -> bool {
        !self.consequent_of.is_empty()
    }

    /// Tri-state view of the belief.
    #[must_use]
    pub fn discretize(&self, threshold: f64) -> Discrete {
        discretize(self.belief, threshold)
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} belief {:+.2}", self.id, self.belief)
    }
}
