//! Immutable production rules.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::fact::FactId;

/// Engine-scoped rule identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(u32);

impl RuleId {
    /// Wraps a raw id. Ids are assigned in declaration order, starting at 0.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
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

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{:02}", self.0)
    }
}

/// Rule weight in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reliability(f64);

impl Reliability {
    /// A fully reliable rule.
    pub const CERTAIN: Self = Self(1.0);

    /// Creates a validated reliability.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ReliabilityOutOfRange` if the value is not in [0.0, 1.0].
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !(0.0..=1.0).contains(&value) || value.is_nan() {
            return Err(ValidationError::ReliabilityOutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// True for a reliability of exactly 1.
    #[must_use]
    pub fn is_certain(self) -> bool {
        self.0 >= 1.0
    }
}

impl Default for Reliability {
    fn default() -> Self {
        Self::CERTAIN
    }
}

/// `a1 & a2 & ... & an -> c`, weighted by a reliability.
///
/// Every field is fixed at construction so that a recorded proof can be replayed
/// against the same rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    id: RuleId,
    antecedents: BTreeSet<FactId>,
    consequent: FactId,
    reliability: Reliability,
}

impl Rule {
    pub(crate) fn new(
        id: RuleId,
        antecedents: BTreeSet<FactId>,
        consequent: FactId,
        reliability: Reliability,
    ) -> Self {
        Self {
            id,
            antecedents,
            consequent,
            reliability,
        }
    }

    /// Unique id of the rule.
    #[must_use]
    pub const fn id(&self) -> RuleId {
        self.id
    }

    /// Left-hand side fact ids, deduplicated, in id order.
    #[must_use]
    pub const fn antecedents(&self) -> &BTreeSet<FactId> {
        &self.antecedents
    }

    /// Right-hand side fact id.
    #[must_use]
    pub const fn consequent(&self) -> FactId {
        self.consequent
    }

    /// Rule weight.
    #[must_use]
    pub const fn reliability(&self) -> Reliability {
        self.reliability
    }

    /// True if every antecedent belongs to `known`.
    #[must_use]
    pub fn is_fireable(&self, known: &BTreeSet<FactId>) -> bool {
        self.antecedents.is_subset(known)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let left: Vec<String> = self.antecedents.iter().map(ToString::to_string).collect();
        write!(f, "{}: {} -> {}", self.id, left.join(","), self.consequent)?;
        if !self.reliability.is_certain() {
            write!(f, " ({})", self.reliability.value())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> BTreeSet<FactId> {
        raw.iter().map(|&r| FactId::new(r)).collect()
    }

    #[test]
    fn test_reliability_range() {
        assert!(Reliability::new(0.0).is_ok());
        assert!(Reliability::new(1.0).unwrap().is_certain());
        assert!(matches!(
            Reliability::new(1.2),
            Err(ValidationError::ReliabilityOutOfRange { .. })
        ));
        assert!(Reliability::new(f64::NAN).is_err());
    }

    #[test]
    fn test_rule_fireable_when_antecedents_known() {
        let rule = Rule::new(RuleId::new(0), ids(&[0, 1]), FactId::new(2), Reliability::CERTAIN);
        assert!(rule.is_fireable(&ids(&[0, 1, 5])));
        assert!(!rule.is_fireable(&ids(&[0])));
    }

    #[test]
    fn test_rule_display() {
        let rule = Rule::new(
            RuleId::new(4),
            ids(&[1, 0]),
            FactId::new(2),
            Reliability::new(0.7).unwrap(),
        );
        assert_eq!(format!("{rule}"), "R04: F00,F01 -> F02 (0.7)");
    }
}
