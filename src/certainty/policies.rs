use std::fmt;

use serde::{Deserialize, Serialize};

/// How concurrent fireable rules concluding the same atom are reconciled.
///
/// Every strategy is pure with respect to the rule base, so a certainty run
/// is reproducible given the same Base and beliefs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    /// Keep the first rule discovered for each consequent.
    Naive,

    /// Keep one rule per consequent: highest reliability, then fewest
    /// antecedents, then strongest left-hand side. Remaining ties keep the
    /// earliest declared rule.
    #[default]
    BestRule,

    /// Keep every fireable rule; their contributions are folded with
    /// [`crate::aggregate`].
    AllRules,
}

impl ConflictStrategy {
    /// All strategies, in legacy index order.
    pub const ALL: [Self; 3] = [Self::Naive, Self::BestRule, Self::AllRules];

    /// Short name used in resolution reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Naive => "naive",
            Self::BestRule => "best_rule",
            Self::AllRules => "all_rules",
        }
    }

    /// True when at most one rule per consequent is applied.
    #[must_use]
    pub const fn is_selective(self) -> bool {
        !matches!(self, Self::AllRules)
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_serde() {
        assert_eq!(ConflictStrategy::BestRule.to_string(), "best_rule");
        let s: ConflictStrategy = serde_json::from_str("\"all_rules\"").unwrap();
        assert_eq!(s, ConflictStrategy::AllRules);
        assert!(!s.is_selective());
        assert_eq!(ConflictStrategy::default(), ConflictStrategy::BestRule);
    }
}
