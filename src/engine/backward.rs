//! Backward chaining.
//!
//! Goal-directed AND/OR search. An AND node succeeds when all of its goals
//! succeed; an OR node succeeds when the goal is known true, or when one of
//! the rules concluding it has an AND node of antecedents that succeeds.
//!
//! The search runs on an explicit work stack so that deep rule chains never
//! grow the native call stack. Termination is guaranteed two ways: a rule is
//! never retried on the branch that introduced it, and an OR node deeper than
//! the number of rules is reported as a loop and fails.

use std::collections::BTreeMap;

use super::InferenceEngine;
use crate::fact::{Discrete, FactId};
use crate::resolution::Resolution;
use crate::rule::RuleId;

#[derive(Debug)]
enum Frame {
    And {
        goals: Vec<FactId>,
        next: usize,
        depth: usize,
        branch: Vec<RuleId>,
    },
    Or {
        goal: FactId,
        candidates: Vec<RuleId>,
        next: usize,
        depth: usize,
        branch: Vec<RuleId>,
        trying: Option<RuleId>,
    },
}

/// What the top frame asks the driver loop to do.
enum Step {
    Push(Frame),
    Return(bool),
    Continue,
}

/// Mutable state of one backward search.
struct Search {
    use_memory: bool,
    rule_count: usize,
    attempts: usize,
    memo: BTreeMap<FactId, bool>,
}

impl InferenceEngine {
    /// Backward chaining over the current goals. The Base is never modified.
    pub(crate) fn backward(&mut self, use_memory: bool) -> Resolution {
        let mut res = self.new_resolution("backward_dfs");
        self.trace.clear();

        let mut effective = Vec::new();
        for &goal in &self.goals {
            if self.fact_ref(goal).is_some_and(|f| f.provable()) {
                effective.push(goal);
            } else if self.opposite_id(goal).is_none() {
                tracing::debug!(goal = %self.name(goal), "unprovable goal without opposite");
                res.remaining_goals = self.get_goals();
                return res;
            }
        }
        tracing::debug!(
            goals = ?self.get_goals(),
            effective = ?self.names(&effective),
            "backward search"
        );

        let mut search = Search {
            use_memory,
            rule_count: self.store.rule_count(),
            attempts: 0,
            memo: BTreeMap::new(),
        };
        let success = self.and_or(effective.clone(), &mut search);

        res.rules_fired = search.attempts;
        res.success = success;
        res.remaining_goals = self.names(&effective);
        res.memorized_goals = search
            .memo
            .iter()
            .map(|(id, ok)| (self.name(*id), *ok))
            .collect();
        res.trace = self.trace.clone();
        res
    }

    fn and_or(&mut self, goals: Vec<FactId>, search: &mut Search) -> bool {
        let mut stack = vec![Frame::And {
            goals,
            next: 0,
            depth: 0,
            branch: Vec::new(),
        }];
        let mut ret: Option<bool> = None;

        while let Some(top) = stack.last_mut() {
            let step = match top {
                Frame::And {
                    goals,
                    next,
                    depth,
                    branch,
                } => match ret.take() {
                    Some(false) => Step::Return(false),
                    resumed => {
                        if resumed.is_some() {
                            *next += 1;
                        }
                        match goals.get(*next).copied() {
                            None => Step::Return(true),
                            Some(goal) => match self.or_entry(goal, *depth, search) {
                                Some(known) => {
                                    ret = Some(known);
                                    Step::Continue
                                }
                                None => Step::Push(Frame::Or {
                                    goal,
                                    candidates: self
                                        .fact_ref(goal)
                                        .map(|f| f.consequent_of().to_vec())
                                        .unwrap_or_default(),
                                    next: 0,
                                    depth: *depth,
                                    branch: branch.clone(),
                                    trying: None,
                                }),
                            },
                        }
                    }
                },
                Frame::Or {
                    goal,
                    candidates,
                    next,
                    depth,
                    branch,
                    trying,
                } => {
                    let mut proven = false;
                    if let (Some(ok), Some(rid)) = (ret.take(), trying.take()) {
                        if search.use_memory {
                            search.memo.insert(*goal, ok);
                        }
                        let name = self.name(*goal);
                        if ok {
                            self.trace.add(rid, name, 1.0);
                        } else {
                            self.trace.add_failure(rid, name);
                        }
                        proven = ok;
                    }

                    if proven {
                        Step::Return(true)
                    } else {
                        let candidate = candidates[*next..]
                            .iter()
                            .position(|rid| !branch.contains(rid))
                            .map(|offset| *next + offset);
                        match candidate {
                            None => Step::Return(false),
                            Some(idx) => {
                                let rid = candidates[idx];
                                *next = idx + 1;
                                *trying = Some(rid);
                                search.attempts += 1;
                                tracing::trace!(rule = %rid, depth = *depth + 1, "trying rule");
                                let antecedents = self
                                    .store
                                    .rule(rid)
                                    .map(|r| r.antecedents().iter().copied().collect())
                                    .unwrap_or_default();
                                let mut sub_branch = branch.clone();
                                sub_branch.push(rid);
                                Step::Push(Frame::And {
                                    goals: antecedents,
                                    next: 0,
                                    depth: *depth + 1,
                                    branch: sub_branch,
                                })
                            }
                        }
                    }
                }
            };

            match step {
                Step::Push(frame) => stack.push(frame),
                Step::Return(ok) => {
                    stack.pop();
                    ret = Some(ok);
                }
                Step::Continue => {}
            }
        }

        ret.unwrap_or(false)
    }

    /// Checks made before an OR node explores any rule. `None` means "search".
    fn or_entry(&self, goal: FactId, depth: usize, search: &Search) -> Option<bool> {
        if self.in_base(goal) {
            return Some(self.discrete_id(goal) == Discrete::Positive);
        }
        if search.use_memory {
            if let Some(&known) = search.memo.get(&goal) {
                return Some(known);
            }
        }
        if depth >= search.rule_count {
            tracing::debug!(goal = %self.name(goal), depth, "loop detected");
            return Some(false);
        }
        None
    }
}
