//! Fact and rule storage.
//!
//! The store owns the symbol table (atom name <-> [`FactId`]), the fact arena
//! and the rule arena. Ids are handed out by the store itself, so two engines
//! never share a counter; [`FactStore::clear`] is the only way to restart them.

use std::collections::{BTreeSet, HashMap};

use blake3::Hasher;

use crate::error::ValidationError;
use crate::fact::{Fact, FactId};
use crate::parser::RuleSpec;
use crate::rule::{Reliability, Rule, RuleId};

/// Arena of facts and rules keyed by atom name.
#[derive(Debug, Default, Clone)]
pub struct FactStore {
    symbols: HashMap<String, FactId>,
    names: Vec<String>,
    facts: Vec<Fact>,
    rules: Vec<Rule>,
}

impl FactStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `atom`, creating a fact with belief 0 on first reference.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyAtom` for an empty or blank name.
    pub fn lookup_or_create(&mut self, atom: &str) -> Result<FactId, ValidationError> {
        if let Some(&id) = self.symbols.get(atom) {
            return Ok(id);
        }
        if atom.trim().is_empty() {
            return Err(ValidationError::EmptyAtom);
        }
        #[allow(clippy::cast_possible_truncation)]
        let id = FactId::new(self.facts.len() as u32);
        self.symbols.insert(atom.to_string(), id);
        self.names.push(atom.to_string());
        self.facts.push(Fact::new(id));
        Ok(id)
    }

    /// Declare a new immutable rule, creating facts for unseen atoms.
    ///
    /// # Errors
    ///
    /// Fails when `antecedents` is empty or an atom is blank.
    pub fn declare_rule<S: AsRef<str>>(
        &mut self,
        antecedents: &[S],
        consequent: &str,
        reliability: Reliability,
    ) -> Result<RuleId, ValidationError> {
        if antecedents.is_empty() {
            return Err(ValidationError::MalformedRule {
                rule: format!("-> {consequent}"),
                reason: "a rule needs at least one antecedent".to_string(),
            });
        }

        let mut left = BTreeSet::new();
        for atom in antecedents {
            left.insert(self.lookup_or_create(atom.as_ref())?);
        }
        let right = self.lookup_or_create(consequent)?;

        #[allow(clippy::cast_possible_truncation)]
        let id = RuleId::new(self.rules.len() as u32);
        for fid in &left {
            self.facts[fid.index()].antecedent_of.push(id);
        }
        self.facts[right.index()].consequent_of.push(id);
        self.rules.push(Rule::new(id, left, right, reliability));
        Ok(id)
    }

    /// Declare a rule from a parsed spec.
    ///
    /// # Errors
    ///
    /// See [`FactStore::declare_rule`].
    pub fn declare(&mut self, spec: &RuleSpec) -> Result<RuleId, ValidationError> {
        self.declare_rule(&spec.antecedents, &spec.consequent, spec.reliability)
    }

    /// True if a rule with exactly these sides is already declared.
    #[must_use]
    pub fn contains_rule(&self, antecedents: &BTreeSet<FactId>, consequent: FactId) -> bool {
        self.facts
            .get(consequent.index())
            .is_some_and(|f| {
                f.consequent_of
                    .iter()
                    .any(|rid| self.rules[rid.index()].antecedents() == antecedents)
            })
    }

    /// Id of an existing atom.
    #[must_use]
    pub fn id_of(&self, atom: &str) -> Option<FactId> {
        self.symbols.get(atom).copied()
    }

    /// Name of a fact.
    #[must_use]
    pub fn name_of(&self, id: FactId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    /// Fact by id.
    #[must_use]
    pub fn fact(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(id.index())
    }

    /// Fact by atom name.
    #[must_use]
    pub fn fact_by_name(&self, atom: &str) -> Option<&Fact> {
        self.id_of(atom).and_then(|id| self.fact(id))
    }

    pub(crate) fn fact_mut(&mut self, id: FactId) -> Option<&mut Fact> {
        self.facts.get_mut(id.index())
    }

    /// Belief of a fact, 0 for an unknown id.
    #[must_use]
    pub fn belief(&self, id: FactId) -> f64 {
        self.fact(id).map_or(0.0, Fact::belief)
    }

    pub(crate) fn set_belief(&mut self, id: FactId, value: f64) {
        if let Some(f) = self.fact_mut(id) {
            f.belief = value;
        }
    }

    /// Rule by id.
    #[must_use]
    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.index())
    }

    /// All rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// All `(atom, fact)` pairs in creation order.
    pub fn facts(&self) -> impl Iterator<Item = (&str, &Fact)> {
        self.names.iter().map(String::as_str).zip(self.facts.iter())
    }

    /// Number of facts.
    #[must_use]
    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    /// Number of rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Render a rule with atom names instead of fact ids.
    #[must_use]
    pub fn describe_rule(&self, id: RuleId) -> String {
        let Some(rule) = self.rule(id) else {
            return format!("{id}: <unknown>");
        };
        let left: Vec<&str> = rule
            .antecedents()
            .iter()
            .filter_map(|f| self.name_of(*f))
            .collect();
        let right = self.name_of(rule.consequent()).unwrap_or("?");
        if rule.reliability().is_certain() {
            format!("{id}: {} -> {right}", left.join(" & "))
        } else {
            format!("{id}: {} -> {right} {}", left.join(" & "), rule.reliability().value())
        }
    }

    /// Stable blake3 hash of the rule base, independent of atom creation order.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut h = Hasher::new();
        for rule in &self.rules {
            let mut left: Vec<&str> = rule
                .antecedents()
                .iter()
                .filter_map(|f| self.name_of(*f))
                .collect();
            left.sort_unstable();
            let right = self.name_of(rule.consequent()).unwrap_or_default();
            h.update(left.join("&").as_bytes());
            h.update(b"->");
            h.update(right.as_bytes());
            h.update(&rule.reliability().value().to_le_bytes());
            h.update(b"\n");
        }
        h.finalize().to_hex().to_string()
    }

    /// Drop every fact and rule and restart both id counters at zero.
    pub fn clear(&mut self) {
        self.symbols.clear();
        self.names.clear();
        self.facts.clear();
        self.rules.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_rule;

    #[test]
    fn test_lookup_is_idempotent() {
        let mut store = FactStore::new();
        let a = store.lookup_or_create("a").unwrap();
        let b = store.lookup_or_create("b").unwrap();
        assert_eq!(store.lookup_or_create("a").unwrap(), a);
        assert_ne!(a, b);
        assert_eq!(store.fact_count(), 2);
        assert!(store.lookup_or_create("  ").is_err());
    }

    #[test]
    fn test_declare_updates_memberships() {
        let mut store = FactStore::new();
        let r = store.declare(&parse_rule("a & b & a -> c").unwrap()).unwrap();
        let a = store.fact_by_name("a").unwrap();
        assert_eq!(a.antecedent_of(), &[r]);
        let c = store.fact_by_name("c").unwrap();
        assert_eq!(c.consequent_of(), &[r]);
        assert!(c.provable());
        assert_eq!(store.rule(r).unwrap().antecedents().len(), 2);
        assert_eq!(store.describe_rule(r), "R00: a & b -> c");
    }

    #[test]
    fn test_clear_resets_ids() {
        let mut store = FactStore::new();
        store.declare(&parse_rule("x -> y").unwrap()).unwrap();
        store.clear();
        assert_eq!(store.fact_count(), 0);
        assert_eq!(store.lookup_or_create("z").unwrap().get(), 0);
        let rid = store.declare(&parse_rule("z -> w").unwrap()).unwrap();
        assert_eq!(rid.get(), 0);
    }

    #[test]
    fn test_independent_stores_do_not_share_counters() {
        let mut s1 = FactStore::new();
        let mut s2 = FactStore::new();
        s1.lookup_or_create("a").unwrap();
        s1.lookup_or_create("b").unwrap();
        assert_eq!(s2.lookup_or_create("q").unwrap().get(), 0);
    }

    #[test]
    fn test_contains_rule() {
        let mut store = FactStore::new();
        store.declare(&parse_rule("a -> b").unwrap()).unwrap();
        let a = store.id_of("a").unwrap();
        let b = store.id_of("b").unwrap();
        assert!(store.contains_rule(&BTreeSet::from([a]), b));
        assert!(!store.contains_rule(&BTreeSet::from([b]), a));
    }

    #[test]
    fn test_fingerprint_ignores_creation_order() {
        let mut s1 = FactStore::new();
        s1.lookup_or_create("b").unwrap();
        s1.declare(&parse_rule("a & b -> c .5").unwrap()).unwrap();

        let mut s2 = FactStore::new();
        s2.declare(&parse_rule("b & a -> c .5").unwrap()).unwrap();
        assert_eq!(s1.fingerprint(), s2.fingerprint());

        s2.declare(&parse_rule("c -> d").unwrap()).unwrap();
        assert_ne!(s1.fingerprint(), s2.fingerprint());
    }
}
