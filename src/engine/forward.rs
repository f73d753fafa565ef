//! Forward chaining.
//!
//! Two traversals share the same commit step: a rule whose left-hand side
//! discretizes to +1 concludes its consequent, which enters the Base with
//! belief 1 unless it is already known true. Deriving an atom that is known
//! false raises the inconsistency flag and stops the run.
//!
//! Without goals the run saturates: it stops when nothing is left to try and
//! succeeds if at least one fact was established. With goals it stops as soon
//! as every goal has been established.

use std::collections::{BTreeSet, VecDeque};

use super::InferenceEngine;
use crate::fact::{Discrete, FactId};
use crate::resolution::Resolution;
use crate::rule::RuleId;

/// What committing a conclusion did to the Base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Commit {
    /// Newly established, or upgraded from unknown.
    New,
    /// Already known true.
    Unchanged,
    /// Already known false.
    Contradiction,
}

impl InferenceEngine {
    /// Conjunction of the discretized antecedents.
    pub(crate) fn eval_left(&self, antecedents: &BTreeSet<FactId>) -> Discrete {
        antecedents
            .iter()
            .map(|id| self.discrete_id(*id))
            .min()
            .unwrap_or(Discrete::Unknown)
    }

    fn commit(&mut self, atom: FactId) -> Commit {
        let mut new = false;
        if !self.in_base(atom) {
            self.add_knowledge_id(atom);
            new = true;
        }
        match self.discrete_id(atom) {
            Discrete::Negative => {
                tracing::warn!(atom = %self.name(atom), "derived an atom known to be false");
                self.inconsistent = true;
                return Commit::Contradiction;
            }
            Discrete::Unknown => new = true,
            Discrete::Positive => {}
        }
        if new {
            self.change_knowledge_id(atom, 1.0);
            Commit::New
        } else {
            Commit::Unchanged
        }
    }

    fn saturation_done(&self, todo_empty: bool, saturation: bool) -> bool {
        if saturation {
            todo_empty
        } else {
            self.goals.is_empty()
        }
    }

    fn finish(&self, res: &mut Resolution, saturation: bool, memory: &BTreeSet<RuleId>) {
        res.success = !res.inconsistent
            && if saturation {
                !res.new_facts.is_empty()
            } else {
                self.goals.is_empty()
            };
        res.remaining_goals = self.get_goals();
        res.memorized_rules = memory.iter().copied().collect();
        res.trace = self.trace.clone();
    }

    /// Depth-first forward chaining over a rule stack.
    pub(crate) fn forward_dfs(&mut self, use_memory: bool) -> Resolution {
        let mut res = self.new_resolution("forward_dfs");
        let mut memory: BTreeSet<RuleId> = BTreeSet::new();
        let mut todo: VecDeque<RuleId> = self.selectable_rules().into();
        let saturation = self.goals.is_empty();
        self.trace.clear();

        while !self.saturation_done(todo.is_empty(), saturation) {
            let Some(rid) = todo.pop_front() else {
                break;
            };
            if memory.contains(&rid) {
                tracing::trace!(rule = %rid, "already applied, skipped");
                continue;
            }
            let Some(rule) = self.store.rule(rid) else {
                continue;
            };
            let (left, atom) = (rule.antecedents().clone(), rule.consequent());
            let name = self.name(atom);
            res.rules_fired += 1;

            if self.eval_left(&left) != Discrete::Positive {
                self.trace.add_failure(rid, name);
                continue;
            }

            tracing::trace!(rule = %rid, atom = %name, "rule fired");
            self.trace.add(rid, name.clone(), 1.0);
            *res.fire_counts.entry(rid).or_insert(0) += 1;
            if use_memory {
                memory.insert(rid);
            }

            match self.commit(atom) {
                Commit::Contradiction => {
                    res.inconsistent = true;
                    break;
                }
                Commit::Unchanged => {}
                Commit::New => {
                    res.new_facts.push(name);
                    self.push_enabled(atom, &mut todo, &memory);
                }
            }
        }

        res.pending = todo.into_iter().collect();
        self.finish(&mut res, saturation, &memory);
        res
    }

    /// Put the rules `atom` just enabled at the top of the stack, in declaration order.
    fn push_enabled(&self, atom: FactId, todo: &mut VecDeque<RuleId>, memory: &BTreeSet<RuleId>) {
        let Some(fact) = self.fact_ref(atom) else {
            return;
        };
        let enabled: Vec<RuleId> = fact
            .antecedent_of()
            .iter()
            .copied()
            .filter(|rid| !memory.contains(rid))
            .filter(|rid| self.store.rule(*rid).is_some_and(|r| r.is_fireable(&self.base)))
            .collect();
        todo.retain(|rid| !enabled.contains(rid));
        for rid in enabled.into_iter().rev() {
            todo.push_front(rid);
        }
    }

    /// Breadth-first forward chaining: evaluate a whole level, then commit
    /// every conclusion, then reselect.
    pub(crate) fn forward_bfs(&mut self, use_memory: bool) -> Resolution {
        let mut res = self.new_resolution("forward_bfs");
        let mut memory: BTreeSet<RuleId> = BTreeSet::new();
        let mut todo = self.selectable_rules();
        let saturation = self.goals.is_empty();
        self.trace.clear();
        let mut level = 0_usize;

        while !todo.is_empty() && !self.saturation_done(false, saturation) {
            level += 1;
            tracing::trace!(level, rules = todo.len(), "forward level");

            let mut found = Vec::new();
            for &rid in &todo {
                if memory.contains(&rid) {
                    continue;
                }
                let Some(rule) = self.store.rule(rid) else {
                    continue;
                };
                let atom = rule.consequent();
                let positive = self.eval_left(rule.antecedents()) == Discrete::Positive;
                let name = self.name(atom);
                res.rules_fired += 1;
                if positive {
                    self.trace.add(rid, name, 1.0);
                    *res.fire_counts.entry(rid).or_insert(0) += 1;
                    if use_memory {
                        memory.insert(rid);
                    }
                    found.push(atom);
                } else {
                    self.trace.add_failure(rid, name);
                }
            }

            let mut changed = false;
            for atom in found {
                match self.commit(atom) {
                    Commit::Contradiction => {
                        res.inconsistent = true;
                        break;
                    }
                    Commit::Unchanged => {}
                    Commit::New => {
                        changed = true;
                        res.new_facts.push(self.name(atom));
                    }
                }
            }
            if res.inconsistent {
                break;
            }

            todo = if changed { self.selectable_rules() } else { Vec::new() };
        }

        res.pending = todo;
        self.finish(&mut res, saturation, &memory);
        res
    }
}

#[cfg(test)]
mod tests {
    use crate::{InferenceEngine, ResolutionMode};

    fn engine(rules: &str, known: &[&str]) -> InferenceEngine {
        let mut engine = InferenceEngine::new();
        engine.load_rules(rules).unwrap();
        for atom in known {
            engine.add_knowledge(atom).unwrap();
            engine.change_knowledge(atom, 1.0).unwrap();
        }
        engine
    }

    #[test]
    fn test_dfs_pushes_only_enabled_rules() {
        let mut e = engine("a -> b\na & b -> c\n", &["a"]);
        let res = e.resolve(ResolutionMode::FORWARD_DFS, false).unwrap();
        assert_eq!(res.as_tuple(), (2, true));
        assert_eq!(res.new_facts, vec!["b", "c"]);
        assert_eq!(e.trace().to_string(), "Using R00 b is 1\nUsing R01 c is 1\n");
    }

    #[test]
    fn test_bfs_levels() {
        let mut e = engine("a -> b\nb -> c\nx -> y\n", &["a"]);
        let res = e.resolve(ResolutionMode::FORWARD_BFS, false).unwrap();
        assert!(res.success);
        assert_eq!(res.new_facts, vec!["b", "c"]);
        // level 1: R00; level 2: R00, R01; level 3: R00, R01
        assert_eq!(res.rules_fired, 5);
        assert!(!e.check_knowledge("y"));
    }

    #[test]
    fn test_bfs_with_memory_skips_fired_rules() {
        let mut e = engine("a -> b\nb -> c\n", &["a"]);
        let res = e.resolve(ResolutionMode::FORWARD_BFS, true).unwrap();
        assert_eq!(res.rules_fired, 2);
        assert_eq!(res.memorized_rules.len(), 2);
    }

    #[test]
    fn test_goal_mode_stops_early() {
        let mut e = engine("a -> b\nb -> c\nc -> d\n", &["a"]);
        assert!(e.add_goal("b"));
        let res = e.resolve(ResolutionMode::FORWARD_DFS, false).unwrap();
        assert_eq!(res.as_tuple(), (1, true));
        assert!(res.remaining_goals.is_empty());
        assert!(!e.check_knowledge("c"));
    }

    #[test]
    fn test_goal_mode_failure_keeps_goals() {
        let mut e = engine("a -> b\nz -> c\n", &["a"]);
        assert!(e.add_goal("c"));
        let res = e.resolve(ResolutionMode::FORWARD_BFS, false).unwrap();
        assert!(!res.success);
        assert_eq!(res.remaining_goals, vec!["c"]);
    }

    #[test]
    fn test_unknown_antecedent_fails_rule() {
        let mut e = engine("a -> b\n", &[]);
        e.add_knowledge("a").unwrap();
        let res = e.resolve(ResolutionMode::FORWARD_DFS, false).unwrap();
        assert_eq!(res.as_tuple(), (1, false));
        assert_eq!(e.trace().to_string(), "R00 failed for b\n");
    }

    #[test]
    fn test_contradiction_sets_flag() {
        let mut e = engine("d -> non-a\n", &["d", "a"]);
        e.add_opposition("a", "non-a").unwrap();
        let res = e.resolve(ResolutionMode::FORWARD_DFS, false).unwrap();
        assert!(res.inconsistent);
        assert!(!res.success);
        assert!(e.is_inconsistent());

        e.reset_knowledge();
        let res = e.resolve(ResolutionMode::FORWARD_BFS, false).unwrap();
        assert!(!res.inconsistent);
        assert!(!e.is_inconsistent());
    }
}
