//! Remedial strategies.
//!
//! When a base resolution fails without an inconsistency, a [`RemedyPipeline`]
//! consults its strategies in order. The first strategy that contributes new
//! knowledge (a fact or a rule) stops the consultation, and the base
//! resolution is retried exactly once.

use std::fmt;

use crate::engine::InferenceEngine;
use crate::error::InferResult;
use crate::fact::Discrete;
use crate::mode::{ResolutionMode, ResolveRequest};
use crate::resolution::Resolution;

/// Source of answers for unknown atoms, typically a user prompt.
pub trait Oracle {
    /// Belief in `[-1, 1]` for `atom`, or `None` when no answer is given.
    fn ask(&mut self, atom: &str) -> Option<f64>;
}

impl<F> Oracle for F
where
    F: FnMut(&str) -> Option<f64>,
{
    fn ask(&mut self, atom: &str) -> Option<f64> {
        self(atom)
    }
}

/// A hook invoked after a failed base resolution.
pub trait RemedialStrategy {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Add knowledge to `engine`. Returns how many facts or rules were
    /// contributed; zero means the strategy had nothing to offer.
    ///
    /// # Errors
    ///
    /// Propagates engine errors; a strategy that merely finds nothing returns `Ok(0)`.
    fn apply(&mut self, engine: &mut InferenceEngine) -> InferResult<usize>;
}

/// Ask the oracle for the first unknown askable atom a rule is waiting on.
pub struct Interrogation<O> {
    oracle: O,
}

impl<O: Oracle> Interrogation<O> {
    /// Creates the strategy around an oracle.
    pub const fn new(oracle: O) -> Self {
        Self { oracle }
    }
}

impl<O> fmt::Debug for Interrogation<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interrogation").finish_non_exhaustive()
    }
}

impl<O: Oracle> RemedialStrategy for Interrogation<O> {
    fn name(&self) -> &'static str {
        "interrogation"
    }

    fn apply(&mut self, engine: &mut InferenceEngine) -> InferResult<usize> {
        let candidate = engine
            .selectable_queries()
            .into_iter()
            .filter_map(|(_, atoms)| atoms.into_iter().next())
            .find(|atom| engine.discrete(atom) == Some(Discrete::Unknown));
        let Some(atom) = candidate else {
            return Ok(0);
        };

        match self.oracle.ask(&atom) {
            Some(value) if value != 0.0 && (-1.0..=1.0).contains(&value) => {
                engine.add_knowledge(&atom)?;
                engine.change_knowledge(&atom, value)?;
                tracing::debug!(atom = %atom, value, "oracle answered");
                Ok(1)
            }
            answer => {
                tracing::warn!(atom = %atom, answer = ?answer, "oracle answer rejected");
                Ok(0)
            }
        }
    }
}

/// Declare the contrapositive of every certain single-antecedent rule whose
/// consequent is false and antecedent unknown.
#[derive(Debug, Default, Clone, Copy)]
pub struct Contraposition;

impl RemedialStrategy for Contraposition {
    fn name(&self) -> &'static str {
        "contraposition"
    }

    fn apply(&mut self, engine: &mut InferenceEngine) -> InferResult<usize> {
        let mut added = 0;
        for (rid, spec) in engine.selectable_contrapositives() {
            let Some(spec) = spec else {
                continue;
            };
            let sides = engine.store().rule(rid).and_then(|r| {
                let antecedent = r.antecedents().iter().next()?;
                Some((
                    engine.atom_name(*antecedent)?.to_string(),
                    engine.atom_name(r.consequent())?.to_string(),
                ))
            });
            if let Some((antecedent, consequent)) = sides {
                engine.opposed_literal(&consequent)?;
                engine.opposed_literal(&antecedent)?;
            }
            if engine.contains_rule_spec(&spec) {
                continue;
            }
            let id = engine.add_rule_spec(&spec)?;
            tracing::debug!(from = %rid, rule = %engine.store().describe_rule(id), "contrapositive declared");
            added += 1;
        }
        Ok(added)
    }
}

/// Treat a missing negative literal as true: its positive atom is asserted
/// with belief -1.
#[derive(Debug, Default, Clone, Copy)]
pub struct NegationAsMissing;

impl RemedialStrategy for NegationAsMissing {
    fn name(&self) -> &'static str {
        "negation_as_missing"
    }

    fn apply(&mut self, engine: &mut InferenceEngine) -> InferResult<usize> {
        engine.pair_negative_literals()?;
        let mut asserted = 0;
        for (_, atoms) in engine.selectable_negations() {
            let Some(atom) = atoms.into_iter().next() else {
                continue;
            };
            engine.add_knowledge(&atom)?;
            engine.change_knowledge(&atom, -1.0)?;
            asserted += 1;
        }
        Ok(asserted)
    }
}

/// Try to prove each missing positive literal by backward chaining; assert
/// it with belief -1 when the proof fails. The caller's goals are restored
/// afterwards.
#[derive(Debug, Default, Clone, Copy)]
pub struct NegationAsFailure;

impl RemedialStrategy for NegationAsFailure {
    fn name(&self) -> &'static str {
        "negation_as_failure"
    }

    fn apply(&mut self, engine: &mut InferenceEngine) -> InferResult<usize> {
        engine.pair_negative_literals()?;
        let saved = engine.get_goals();
        engine.reset_goal();

        let outcome = Self::refute_unprovable(engine);

        engine.reset_goal();
        for goal in &saved {
            engine.add_goal(goal);
        }
        outcome
    }
}

impl NegationAsFailure {
    fn refute_unprovable(engine: &mut InferenceEngine) -> InferResult<usize> {
        let mut asserted = 0;
        for (_, atoms) in engine.selectable_negations() {
            let Some(atom) = atoms.into_iter().next() else {
                continue;
            };
            let known: Vec<String> = [atom.clone(), engine.opposed_literal_name(&atom)]
                .into_iter()
                .filter(|name| engine.check_knowledge(name))
                .collect();
            let proven = engine.add_goal(&atom)
                && engine.resolve(ResolutionMode::BACKWARD_DFS, true)?.success;
            engine.reset_goal();
            if proven {
                // posing the goal took these out of the Base
                for name in &known {
                    engine.add_knowledge(name)?;
                }
            } else {
                tracing::debug!(atom = %atom, "not provable, asserted false");
                engine.add_knowledge(&atom)?;
                engine.change_knowledge(&atom, -1.0)?;
                asserted += 1;
            }
        }
        Ok(asserted)
    }
}

/// Ordered list of remedial strategies.
#[derive(Default)]
pub struct RemedyPipeline {
    strategies: Vec<Box<dyn RemedialStrategy>>,
}

impl fmt::Debug for RemedyPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl RemedyPipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interrogation, contraposition, negation as missing, negation as failure.
    #[must_use]
    pub fn standard<O: Oracle + 'static>(oracle: O) -> Self {
        Self::new()
            .with(Interrogation::new(oracle))
            .with(Contraposition)
            .with(NegationAsMissing)
            .with(NegationAsFailure)
    }

    /// A pipeline holding a single strategy.
    #[must_use]
    pub fn only<S: RemedialStrategy + 'static>(strategy: S) -> Self {
        Self::new().with(strategy)
    }

    /// Append a strategy.
    #[must_use]
    pub fn with<S: RemedialStrategy + 'static>(mut self, strategy: S) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Strategy names, in consultation order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Number of strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// True when no strategy is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl InferenceEngine {
    /// Run a resolution request.
    ///
    /// A remediated request that fails without inconsistency consults
    /// `pipeline`; if a strategy contributes, the base resolution is retried
    /// once and both runs are combined with [`Resolution::followed_by`].
    ///
    /// # Errors
    ///
    /// Propagates `resolve` and strategy errors.
    pub fn execute(
        &mut self,
        request: ResolveRequest,
        pipeline: &mut RemedyPipeline,
    ) -> InferResult<Resolution> {
        let first = self.resolve(request.mode, request.use_memory)?;
        if !request.remediate || first.success || first.inconsistent {
            return Ok(first);
        }

        for strategy in &mut pipeline.strategies {
            let contributed = strategy.apply(self)?;
            if contributed == 0 {
                tracing::debug!(strategy = strategy.name(), "nothing to contribute");
                continue;
            }
            tracing::info!(strategy = strategy.name(), contributed, "retrying after remedy");
            let retry = self.resolve(request.mode, request.use_memory)?;
            return Ok(first.followed_by(retry));
        }
        Ok(first)
    }
}
