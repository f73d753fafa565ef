use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::combine::{aggregate, round_to};
use super::policies::ConflictStrategy;
use crate::engine::InferenceEngine;
use crate::fact::{discretize, Discrete, FactId};
use crate::resolution::Resolution;
use crate::rule::RuleId;

impl InferenceEngine {
    /// Left-hand strength of a rule on raw beliefs: the minimum belief of its
    /// antecedents.
    #[must_use]
    pub fn left_strength(&self, rule: RuleId) -> f64 {
        self.store.rule(rule).map_or(0.0, |r| {
            r.antecedents()
                .iter()
                .map(|id| self.store.belief(*id))
                .fold(f64::INFINITY, f64::min)
        })
    }

    /// Fireable rules (antecedents in the Base) retained by `strategy`, in
    /// declaration order of the retained rule's first competitor.
    #[must_use]
    pub fn resolve_conflicts(&self, strategy: ConflictStrategy) -> Vec<RuleId> {
        self.select_rules(strategy, &self.selectable_rules())
    }

    fn select_rules(&self, strategy: ConflictStrategy, candidates: &[RuleId]) -> Vec<RuleId> {
        if !strategy.is_selective() {
            return candidates.to_vec();
        }

        let mut order: Vec<FactId> = Vec::new();
        let mut chosen: BTreeMap<FactId, RuleId> = BTreeMap::new();
        for &rid in candidates {
            let Some(rule) = self.store.rule(rid) else {
                continue;
            };
            let atom = rule.consequent();
            match chosen.get(&atom).copied() {
                None => {
                    order.push(atom);
                    chosen.insert(atom, rid);
                }
                Some(current) => {
                    if strategy == ConflictStrategy::BestRule
                        && self.compare_rules(rid, current) == Ordering::Greater
                    {
                        chosen.insert(atom, rid);
                    }
                }
            }
        }
        order.iter().filter_map(|atom| chosen.get(atom).copied()).collect()
    }

    /// Best-rule ranking: reliability, then fewer antecedents, then left strength.
    fn compare_rules(&self, a: RuleId, b: RuleId) -> Ordering {
        let (Some(ra), Some(rb)) = (self.store.rule(a), self.store.rule(b)) else {
            return Ordering::Equal;
        };
        ra.reliability()
            .value()
            .partial_cmp(&rb.reliability().value())
            .unwrap_or(Ordering::Equal)
            .then_with(|| rb.antecedents().len().cmp(&ra.antecedents().len()))
            .then_with(|| {
                self.left_strength(a)
                    .partial_cmp(&self.left_strength(b))
                    .unwrap_or(Ordering::Equal)
            })
    }

    /// Forward certainty-factor run.
    ///
    /// Each fireable rule is applied at most once. Per round, `strategy`
    /// picks among the fireable rules; a picked rule whose left strength is
    /// true contributes `left_strength * reliability` to its consequent.
    /// Atoms present in the Base before the run, or whose opposite was, are
    /// evidence and are never overwritten. A contribution to an atom whose
    /// opposite was already concluded in this run is folded into the current
    /// belief with [`aggregate`]. A derived atom whose belief discretizes to 0
    /// leaves the Base again.
    pub fn resolve_certainty(&mut self, strategy: ConflictStrategy) -> Resolution {
        let span = tracing::debug_span!("certainty", engine = %self.id(), strategy = %strategy);
        let _guard = span.enter();

        self.inconsistent = false;
        self.trace.clear();
        let mut res = self.new_resolution(&format!("certainty_{}", strategy.name()));
        let precision = self.config.cf_precision;
        let threshold = self.config.threshold;
        let evidence: BTreeSet<FactId> = self.base.clone();
        let saturation = self.goals.is_empty();
        let mut applied: BTreeSet<RuleId> = BTreeSet::new();
        let mut derived: BTreeSet<FactId> = BTreeSet::new();

        loop {
            if !saturation && self.goals.is_empty() {
                break;
            }
            let fireable: Vec<RuleId> = self
                .selectable_rules()
                .into_iter()
                .filter(|rid| !applied.contains(rid))
                .collect();
            if fireable.is_empty() {
                break;
            }

            let picked = self.select_rules(strategy, &fireable);
            // competitors of a picked rule are settled for this run
            applied.extend(fireable.iter().copied());

            for rid in picked {
                let Some(atom) = self.store.rule(rid).map(|r| r.consequent()) else {
                    continue;
                };
                let name = self.name(atom);
                res.rules_fired += 1;

                let left = self.left_strength(rid);
                if discretize(left, threshold) != Discrete::Positive {
                    self.trace.add_failure(rid, name);
                    continue;
                }
                let opposite = self.opposite_id(atom);
                if evidence.contains(&atom) || opposite.is_some_and(|o| evidence.contains(&o)) {
                    tracing::debug!(rule = %rid, atom = %name, "conclusion is asserted evidence, kept");
                    self.trace.add_failure(rid, name);
                    continue;
                }

                let reliability = self.store.rule(rid).map_or(1.0, |r| r.reliability().value());
                let contribution = round_to(left * reliability, precision);
                let same_side = derived.contains(&atom);
                let other_side = opposite.is_some_and(|o| derived.contains(&o));
                let value = match (same_side, other_side) {
                    (true, _) if strategy.is_selective() && self.in_base(atom) => {
                        tracing::debug!(rule = %rid, atom = %name, "already concluded in this run");
                        self.trace.add_failure(rid, name);
                        continue;
                    }
                    (true, _) if strategy.is_selective() => contribution,
                    (false, false) => contribution,
                    _ => aggregate(self.store.belief(atom), contribution, precision),
                };

                let first = derived.insert(atom);
                self.assign_certainty(atom, value);
                self.trace.add(rid, name.clone(), value);
                *res.fire_counts.entry(rid).or_insert(0) += 1;
                tracing::debug!(rule = %rid, atom = %name, value, "certainty contribution");
                if first {
                    res.new_facts.push(name);
                }
            }
        }

        res.success = if saturation {
            !res.new_facts.is_empty()
        } else {
            self.goals.is_empty()
        };
        res.remaining_goals = self.get_goals();
        res.memorized_rules = applied.into_iter().collect();
        res.trace = self.trace.clone();
        tracing::info!(
            method = %res.method,
            rules_fired = res.rules_fired,
            success = res.success,
            "certainty run finished"
        );
        res
    }

    /// Put `atom` in the Base with belief `value`, unless it discretizes to 0.
    fn assign_certainty(&mut self, atom: FactId, value: f64) {
        let was_goal = self.goals.contains(&atom);
        self.add_knowledge_id(atom);
        self.change_knowledge_id(atom, value);
        if self.discrete_id(atom) == Discrete::Unknown {
            self.del_knowledge_id(atom);
            if was_goal {
                self.goals.insert(atom);
                if let Some(opp) = self.opposite_id(atom) {
                    self.goals.insert(opp);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{ConflictStrategy, InferenceEngine, RuleId};

    const RULES: &str = "a -> b .7\na -> c .5\nb -> e .5\nc -> e .8\n";

    fn engine() -> InferenceEngine {
        let mut engine = InferenceEngine::new();
        engine.load_rules(RULES).unwrap();
        engine.add_knowledge("a").unwrap();
        engine.change_knowledge("a", 1.0).unwrap();
        engine
    }

    #[test]
    fn test_resolve_conflicts_strategies() {
        let mut e = engine();
        for atom in ["b", "c"] {
            e.add_knowledge(atom).unwrap();
        }
        e.change_knowledge("b", 0.7).unwrap();
        e.change_knowledge("c", 0.5).unwrap();

        let ids = |v: Vec<RuleId>| v.into_iter().map(RuleId::get).collect::<Vec<_>>();
        assert_eq!(ids(e.resolve_conflicts(ConflictStrategy::Naive)), vec![0, 1, 2]);
        assert_eq!(ids(e.resolve_conflicts(ConflictStrategy::BestRule)), vec![0, 1, 3]);
        assert_eq!(ids(e.resolve_conflicts(ConflictStrategy::AllRules)), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_best_rule_tie_breaks() {
        let mut e = InferenceEngine::new();
        e.load_rules("x & y -> z .5\nx -> z .5\ny -> z .5\n").unwrap();
        for (atom, v) in [("x", 0.4), ("y", 0.9)] {
            e.add_knowledge(atom).unwrap();
            e.change_knowledge(atom, v).unwrap();
        }
        // fewer antecedents beats the conjunction, then y's stronger belief wins
        assert_eq!(e.resolve_conflicts(ConflictStrategy::BestRule), vec![RuleId::new(2)]);
    }

    #[test]
    fn test_best_rule_run() {
        let mut e = engine();
        let res = e.resolve_certainty(ConflictStrategy::BestRule);
        assert!(res.success);
        assert_eq!(res.method, "certainty_best_rule");
        assert_eq!(e.belief("b"), Some(0.7));
        assert_eq!(e.belief("c"), Some(0.5));
        assert_eq!(e.belief("e"), Some(0.4));
        assert_eq!(res.new_facts, vec!["b", "c", "e"]);
        assert!(res.fire_counts.contains_key(&RuleId::new(3)));
        assert!(!res.fire_counts.contains_key(&RuleId::new(2)));
    }

    #[test]
    fn test_naive_and_all_rules_runs() {
        let mut e = engine();
        e.resolve_certainty(ConflictStrategy::Naive);
        assert_eq!(e.belief("e"), Some(0.35));

        let mut e = engine();
        e.resolve_certainty(ConflictStrategy::AllRules);
        assert_eq!(e.belief("e"), Some(0.61));
    }

    #[test]
    fn test_weak_conclusion_leaves_base() {
        let mut e = InferenceEngine::new();
        e.load_rules("a -> b .1\n").unwrap();
        e.add_knowledge("a").unwrap();
        e.change_knowledge("a", 1.0).unwrap();
        let res = e.resolve_certainty(ConflictStrategy::Naive);
        assert_eq!(e.belief("b"), Some(0.1));
        assert!(!e.check_knowledge("b"));
        assert_eq!(res.rules_fired, 1);
    }

    #[test]
    fn test_evidence_is_not_overwritten() {
        let mut e = engine();
        e.add_knowledge("b").unwrap();
        e.change_knowledge("b", 0.9).unwrap();
        e.resolve_certainty(ConflictStrategy::BestRule);
        assert_eq!(e.belief("b"), Some(0.9));
    }

    #[test]
    fn test_opposed_conclusions_fold_in_either_order() {
        for rules in ["x -> non-e .6\ny -> e .5\n", "y -> e .5\nx -> non-e .6\n"] {
            for strategy in [ConflictStrategy::BestRule, ConflictStrategy::AllRules] {
                let mut e = InferenceEngine::new();
                e.load_rules(rules).unwrap();
                e.add_opposition("e", "non-e").unwrap();
                for atom in ["x", "y"] {
                    e.add_knowledge(atom).unwrap();
                    e.change_knowledge(atom, 1.0).unwrap();
                }

                e.resolve_certainty(strategy);

                assert_eq!(e.belief("e"), Some(-0.2), "{strategy}: {rules}");
                assert_eq!(e.belief("non-e"), Some(0.2), "{strategy}: {rules}");
                assert!(!e.check_knowledge("e"));
            }
        }
    }

    #[test]
    fn test_opposite_of_evidence_is_not_overwritten() {
        let mut e = InferenceEngine::new();
        e.load_rules("a -> non-b .8\n").unwrap();
        e.add_opposition("b", "non-b").unwrap();
        for (atom, v) in [("a", 1.0), ("b", 0.9)] {
            e.add_knowledge(atom).unwrap();
            e.change_knowledge(atom, v).unwrap();
        }

        let res = e.resolve_certainty(ConflictStrategy::Naive);

        assert_eq!(e.belief("b"), Some(0.9));
        assert_eq!(e.belief("non-b"), Some(-0.9));
        assert!(res.new_facts.is_empty());
        assert_eq!(e.trace().len(), 1);
        assert!(!e.trace().entries()[0].is_fired());
    }

    #[test]
    fn test_repeated_runs_are_deterministic() {
        let beliefs: Vec<Option<f64>> = (0..3)
            .map(|_| {
                let mut e = engine();
                e.resolve_certainty(ConflictStrategy::BestRule);
                e.belief("e")
            })
            .collect();
        assert!(beliefs.iter().all(|b| *b == Some(0.4)));
    }
}
