//! Resolution reports.
//!
//! Every resolution returns a [`Resolution`] rather than a bare
//! `(rules_fired, success)` pair: the caller also gets the inconsistency
//! flag, the derived facts, and the proof trace of the run.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rule::RuleId;
use crate::trace::ProofTrace;

/// Outcome of one resolution call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Short name of the procedure that ran (`forward_dfs`, `certainty_best_rule`, ...).
    pub method: String,
    /// Rules evaluated (forward) or attempted (backward).
    pub rules_fired: usize,
    /// Saturation mode: at least one new fact. Goal mode: every goal resolved.
    pub success: bool,
    /// A derivation contradicted an established opposite.
    pub inconsistent: bool,
    /// Atoms newly established, in derivation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_facts: Vec<String>,
    /// Goals still open when the run ended.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remaining_goals: Vec<String>,
    /// Successful firings per rule.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fire_counts: BTreeMap<RuleId, usize>,
    /// Rules memoized as already fired.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub memorized_rules: Vec<RuleId>,
    /// Goals memoized with their proof outcome.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub memorized_goals: BTreeMap<String, bool>,
    /// Rules still queued when the run stopped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending: Vec<RuleId>,
    /// Proof trace of this run.
    pub trace: ProofTrace,
    /// Fingerprint of the rule base the run used.
    pub fingerprint: String,
}

impl Resolution {
    pub(crate) fn empty(method: impl Into<String>, fingerprint: String) -> Self {
        Self {
            method: method.into(),
            rules_fired: 0,
            success: false,
            inconsistent: false,
            new_facts: Vec::new(),
            remaining_goals: Vec::new(),
            fire_counts: BTreeMap::new(),
            memorized_rules: Vec::new(),
            memorized_goals: BTreeMap::new(),
            pending: Vec::new(),
            trace: ProofTrace::new(),
            fingerprint,
        }
    }

    /// The legacy `(rules_fired, success)` pair.
    #[must_use]
    pub const fn as_tuple(&self) -> (usize, bool) {
        (self.rules_fired, self.success)
    }

    /// Combine a first run with its retry: counts add up, the retry decides success.
    #[must_use]
    pub fn followed_by(self, retry: Self) -> Self {
        let mut new_facts = self.new_facts;
        new_facts.extend(retry.new_facts);
        let mut fire_counts = self.fire_counts;
        for (rule, n) in retry.fire_counts {
            *fire_counts.entry(rule).or_insert(0) += n;
        }
        Self {
            method: retry.method,
            rules_fired: self.rules_fired + retry.rules_fired,
            success: retry.success,
            inconsistent: retry.inconsistent,
            new_facts,
            remaining_goals: retry.remaining_goals,
            fire_counts,
            memorized_rules: retry.memorized_rules,
            memorized_goals: retry.memorized_goals,
            pending: retry.pending,
            trace: retry.trace,
            fingerprint: retry.fingerprint,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total: usize = self.fire_counts.values().sum();
        writeln!(f, "------- Summary {} -------", self.method)?;
        writeln!(f, "rules fired: {} (successful: {total})", self.rules_fired)?;
        writeln!(f, "new facts: {:?}", self.new_facts)?;
        writeln!(f, "goals left: {:?}", self.remaining_goals)?;
        writeln!(f, "=== firing order ===")?;
        write!(f, "{}", self.trace)?;
        let pending: Vec<String> = self.pending.iter().map(ToString::to_string).collect();
        writeln!(f, "pending: [{}]", pending.join(", "))?;
        let memo: Vec<String> = self.memorized_rules.iter().map(ToString::to_string).collect();
        writeln!(f, "memory: [{}] total {}", memo.join(", "), memo.len())?;
        write!(
            f,
            "{}",
            if self.inconsistent {
                "result: inconsistent"
            } else if self.success {
                "result: success"
            } else {
                "result: failure"
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_followed_by_sums_counts() {
        let mut first = Resolution::empty("forward_dfs", "fp".to_string());
        first.rules_fired = 3;
        first.new_facts.push("b".to_string());
        first.fire_counts.insert(RuleId::new(0), 1);

        let mut retry = Resolution::empty("forward_dfs", "fp".to_string());
        retry.rules_fired = 2;
        retry.success = true;
        retry.fire_counts.insert(RuleId::new(0), 1);

        let merged = first.followed_by(retry);
        assert_eq!(merged.as_tuple(), (5, true));
        assert_eq!(merged.fire_counts[&RuleId::new(0)], 2);
        assert_eq!(merged.new_facts, vec!["b"]);
    }

    #[test]
    fn test_summary_mentions_outcome() {
        let mut r = Resolution::empty("backward_dfs", String::new());
        r.inconsistent = true;
        let text = r.to_string();
        assert!(text.contains("Summary backward_dfs"));
        assert!(text.ends_with("result: inconsistent"));
    }
}
