//! Rule selection helpers.
//!
//! Each helper scans the rule base once and reports, per rule, what the
//! chaining engines or the remedial strategies could use from it.

use std::collections::{BTreeMap, BTreeSet};

use super::InferenceEngine;
use crate::fact::{Discrete, FactId};
use crate::parser::RuleSpec;
use crate::rule::{Rule, RuleId};

impl InferenceEngine {
    /// Rules whose every antecedent is in the Base, in declaration order.
    #[must_use]
    pub fn selectable_rules(&self) -> Vec<RuleId> {
        self.store
            .rules()
            .iter()
            .filter(|r| r.is_fireable(&self.base))
            .map(Rule::id)
            .collect()
    }

    /// Rules concluding one of the current goals, in declaration order.
    #[must_use]
    pub fn selectable_proofs(&self) -> Vec<RuleId> {
        self.store
            .rules()
            .iter()
            .filter(|r| self.goals.contains(&r.consequent()))
            .map(Rule::id)
            .collect()
    }

    /// For every rule, the askable antecedents still unknown.
    ///
    /// Negative antecedents are looked up through their opposite. A rule is
    /// cancelled (empty set) when one antecedent is already false, or is
    /// provable but not yet true.
    #[must_use]
    pub fn selectable_queries(&self) -> Vec<(RuleId, BTreeSet<String>)> {
        let askable: BTreeSet<String> = self.askable_facts().into_iter().collect();
        self.store
            .rules()
            .iter()
            .map(|r| (r.id(), self.queries_for(r, &askable)))
            .collect()
    }

    fn queries_for(&self, rule: &Rule, askable: &BTreeSet<String>) -> BTreeSet<String> {
        let mut store = BTreeSet::new();
        for &id in rule.antecedents() {
            let id = if self.is_negative_id(id) {
                match self.opposite_id(id) {
                    Some(opp) => opp,
                    None => continue,
                }
            } else {
                id
            };
            let d = self.discrete_id(id);
            if d == Discrete::Negative {
                return BTreeSet::new();
            }
            let provable = self.fact_ref(id).is_some_and(|f| f.provable());
            if provable && d <= Discrete::Unknown {
                return BTreeSet::new();
            }
            let name = self.name(id);
            if d == Discrete::Unknown && askable.contains(&name) {
                store.insert(name);
            }
        }
        store
    }

    /// For every rule, its contrapositive when applicable.
    ///
    /// Only certain single-antecedent rules qualify, and only when the
    /// consequent is false and the antecedent unknown. The contrapositive of
    /// `a -> b` is `opp(b) -> opp(a)`.
    #[must_use]
    pub fn selectable_contrapositives(&self) -> Vec<(RuleId, Option<RuleSpec>)> {
        self.store
            .rules()
            .iter()
            .map(|r| (r.id(), self.contrapositive_of(r)))
            .collect()
    }

    fn contrapositive_of(&self, rule: &Rule) -> Option<RuleSpec> {
        if rule.antecedents().len() != 1 || !rule.reliability().is_certain() {
            return None;
        }
        let antecedent = *rule.antecedents().iter().next()?;
        let consequent = rule.consequent();
        if self.discrete_id(consequent) != Discrete::Negative
            || self.discrete_id(antecedent) != Discrete::Unknown
        {
            return None;
        }
        let left = self.opposed_literal_name(&self.name(consequent));
        let right = self.opposed_literal_name(&self.name(antecedent));
        RuleSpec::new([left], right, 1.0).ok()
    }

    /// For every rule, the positive literals whose negation would enable it.
    ///
    /// A rule is cancelled when an antecedent is false or a positive
    /// antecedent is still unknown; each unknown negative antecedent
    /// contributes its opposed positive literal.
    #[must_use]
    pub fn selectable_negations(&self) -> Vec<(RuleId, BTreeSet<String>)> {
        self.store
            .rules()
            .iter()
            .map(|r| (r.id(), self.negations_for(r)))
            .collect()
    }

    fn negations_for(&self, rule: &Rule) -> BTreeSet<String> {
        let mut store = BTreeSet::new();
        for &id in rule.antecedents() {
            let d = self.discrete_id(id);
            if d == Discrete::Negative {
                return BTreeSet::new();
            }
            if d == Discrete::Unknown {
                if self.is_negative_id(id) {
                    store.insert(self.opposed_literal_name(&self.name(id)));
                } else {
                    return BTreeSet::new();
                }
            }
        }
        store
    }

    /// Positive atoms that no rule concludes, and whose opposite (if any)
    /// no rule concludes either. Only these may be asked to an oracle.
    #[must_use]
    pub fn askable_facts(&self) -> Vec<String> {
        self.store
            .facts()
            .filter(|(name, fact)| {
                self.config.negation_marker_of(name).is_none()
                    && !fact.provable()
                    && self
                        .opposite_id(fact.id())
                        .and_then(|opp| self.fact_ref(opp))
                        .map_or(true, |opp| !opp.provable())
            })
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Each askable atom with the rules that use it or its opposite.
    #[must_use]
    pub fn askable_with_rules(&self) -> BTreeMap<String, BTreeSet<RuleId>> {
        self.askable_facts()
            .into_iter()
            .map(|atom| {
                let mut rules = BTreeSet::new();
                if let Some(id) = self.fact_id(&atom) {
                    rules.extend(self.rules_using(id));
                    if let Some(opp) = self.opposite_id(id) {
                        rules.extend(self.rules_using(opp));
                    }
                }
                (atom, rules)
            })
            .collect()
    }

    fn rules_using(&self, id: FactId) -> Vec<RuleId> {
        self.fact_ref(id)
            .map(|f| f.antecedent_of().to_vec())
            .unwrap_or_default()
    }

    fn is_negative_id(&self, id: FactId) -> bool {
        self.atom_name(id)
            .is_some_and(|name| self.config.negation_marker_of(name).is_some())
    }
}
