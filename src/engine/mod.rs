//! Inference engine.
//!
//! [`InferenceEngine`] owns every piece of reasoning state: the fact/rule
//! store, the Base (known atoms), the goal set, the opposition pairs, the
//! proof trace and the inconsistency flag. All of it is exclusively owned and
//! mutated through `&mut self`, so resolutions against one engine are
//! serialized by construction.

mod backward;
mod forward;
mod opposition;
mod selection;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{ExecutionError, InferError, InferResult, ValidationError};
use crate::fact::{Discrete, Fact, FactId};
use crate::mode::{Regime, ResolutionMode, Traversal};
use crate::parser::{parse_rule, parse_rule_set, RuleSpec};
use crate::resolution::Resolution;
use crate::rule::RuleId;
use crate::store::FactStore;
use crate::trace::ProofTrace;

pub use opposition::OppositionOutcome;

/// Identifier of one engine instance, carried in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineId(Uuid);

impl EngineId {
    /// Creates a new random engine ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EngineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Production-rule inference engine.
///
/// # Example
///
/// ```
/// use kyroinfer::{InferenceEngine, ResolutionMode};
///
/// let mut engine = InferenceEngine::new();
/// engine.add_rule("a -> b").unwrap();
/// engine.add_rule("a & b -> c").unwrap();
/// engine.add_knowledge("a").unwrap();
/// engine.change_knowledge("a", 1.0).unwrap();
///
/// let res = engine.resolve(ResolutionMode::FORWARD_DFS, false).unwrap();
/// assert_eq!(res.as_tuple(), (2, true));
/// assert!(engine.check_knowledge("c"));
/// ```
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    id: EngineId,
    pub(crate) config: EngineConfig,
    pub(crate) store: FactStore,
    pub(crate) base: BTreeSet<FactId>,
    pub(crate) goals: BTreeSet<FactId>,
    opposition: opposition::OppositionTable,
    pub(crate) trace: ProofTrace,
    pub(crate) inconsistent: bool,
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceEngine {
    /// Creates an engine with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_valid_config(EngineConfig::default())
    }

    /// Creates an engine with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns the `EngineConfig::validate` error for an invalid configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, ValidationError> {
        Ok(Self::from_valid_config(config.validate()?))
    }

    fn from_valid_config(config: EngineConfig) -> Self {
        let id = EngineId::new();
        tracing::debug!(engine = %id, threshold = config.threshold, "creating inference engine");
        Self {
            id,
            config,
            store: FactStore::new(),
            base: BTreeSet::new(),
            goals: BTreeSet::new(),
            opposition: opposition::OppositionTable::default(),
            trace: ProofTrace::new(),
            inconsistent: false,
        }
    }

    /// Engine instance id.
    #[must_use]
    pub const fn id(&self) -> EngineId {
        self.id
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read access to the fact/rule store.
    #[must_use]
    pub const fn store(&self) -> &FactStore {
        &self.store
    }

    /// Proof trace of the most recent resolution.
    #[must_use]
    pub const fn trace(&self) -> &ProofTrace {
        &self.trace
    }

    /// Sticky flag raised when forward chaining hits a contradiction.
    /// Reset at the start of every resolution.
    #[must_use]
    pub const fn is_inconsistent(&self) -> bool {
        self.inconsistent
    }

    /// Discard all facts, rules, Base, goals and oppositions, and restart the id counters.
    pub fn clear(&mut self) {
        self.store.clear();
        self.base.clear();
        self.goals.clear();
        self.opposition.clear();
        self.trace.clear();
        self.inconsistent = false;
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    /// Declare a rule written in the textual grammar (`a & b -> c .7`).
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed line.
    pub fn add_rule(&mut self, line: &str) -> InferResult<RuleId> {
        let spec = parse_rule(line)?;
        self.add_rule_spec(&spec)
    }

    /// Declare an already parsed rule.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty left-hand side or blank atom.
    pub fn add_rule_spec(&mut self, spec: &RuleSpec) -> InferResult<RuleId> {
        let id = self.store.declare(spec)?;
        tracing::trace!(engine = %self.id, rule = %self.store.describe_rule(id), "rule declared");
        Ok(id)
    }

    /// Declare a rule from its parts.
    ///
    /// # Errors
    ///
    /// Fails for an empty left-hand side, a malformed atom or an out-of-range
    /// reliability, exactly as [`InferenceEngine::add_rule`] does.
    pub fn declare_rule<S: AsRef<str>>(
        &mut self,
        antecedents: &[S],
        consequent: &str,
        reliability: f64,
    ) -> InferResult<RuleId> {
        let antecedents = antecedents.iter().map(|a| a.as_ref().to_string());
        let spec = RuleSpec::new(antecedents, consequent, reliability)?;
        self.add_rule_spec(&spec)
    }

    /// True if a rule with the same sides as `spec` is already declared.
    #[must_use]
    pub fn contains_rule_spec(&self, spec: &RuleSpec) -> bool {
        let Some(consequent) = self.fact_id(&spec.consequent) else {
            return false;
        };
        let antecedents: Option<BTreeSet<FactId>> =
            spec.antecedents.iter().map(|a| self.fact_id(a)).collect();
        antecedents.is_some_and(|left| self.store.contains_rule(&left, consequent))
    }

    /// Declare every rule of a multi-line rule set.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed line; nothing is declared in that case.
    pub fn load_rules(&mut self, text: &str) -> InferResult<Vec<RuleId>> {
        let specs = parse_rule_set(text)?;
        let mut ids = Vec::with_capacity(specs.len());
        for spec in &specs {
            ids.push(self.add_rule_spec(spec)?);
        }
        Ok(ids)
    }

    // ------------------------------------------------------------------
    // Facts
    // ------------------------------------------------------------------

    /// Fact for `atom`, if it was ever referenced.
    #[must_use]
    pub fn fact(&self, atom: &str) -> Option<&Fact> {
        self.store.fact_by_name(atom)
    }

    /// Id for `atom`.
    #[must_use]
    pub fn fact_id(&self, atom: &str) -> Option<FactId> {
        self.store.id_of(atom)
    }

    /// Atom name for `id`.
    #[must_use]
    pub fn atom_name(&self, id: FactId) -> Option<&str> {
        self.store.name_of(id)
    }

    /// Belief of `atom`.
    #[must_use]
    pub fn belief(&self, atom: &str) -> Option<f64> {
        self.fact(atom).map(Fact::belief)
    }

    /// Tri-state view of `atom`'s belief.
    #[must_use]
    pub fn discrete(&self, atom: &str) -> Option<Discrete> {
        self.fact(atom).map(|f| f.discretize(self.config.threshold))
    }

    /// True if `atom` is in the Base.
    #[must_use]
    pub fn check_knowledge(&self, atom: &str) -> bool {
        self.fact_id(atom).is_some_and(|id| self.base.contains(&id))
    }

    /// Put `atom` (and its opposite, if any) in the Base, removing both from the goals.
    /// Unknown atoms are created with belief 0.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyAtom` for a blank name.
    pub fn add_knowledge(&mut self, atom: &str) -> InferResult<()> {
        let id = self.store.lookup_or_create(atom)?;
        self.add_knowledge_id(id);
        Ok(())
    }

    /// Remove `atom` and its opposite from the Base.
    pub fn del_knowledge(&mut self, atom: &str) {
        if let Some(id) = self.fact_id(atom) {
            self.del_knowledge_id(id);
        }
    }

    /// Set `atom`'s belief (and the negated value on its opposite).
    ///
    /// Does nothing and returns `false` when `atom` is a goal; otherwise returns
    /// whether `atom` is in the Base.
    ///
    /// # Errors
    ///
    /// - `UnknownAtom` if `atom` was never referenced
    /// - `BeliefOutOfRange` if `value` is not in `[-1, 1]`
    pub fn change_knowledge(&mut self, atom: &str, value: f64) -> InferResult<bool> {
        let id = self.fact_id(atom).ok_or_else(|| InferError::unknown_atom(atom))?;
        if !(-1.0..=1.0).contains(&value) || value.is_nan() {
            return Err(ValidationError::BeliefOutOfRange { value }.into());
        }
        Ok(self.change_knowledge_id(id, value))
    }

    /// Empty the Base. Facts and beliefs are kept.
    pub fn reset_knowledge(&mut self) {
        self.base.clear();
    }

    // ------------------------------------------------------------------
    // Goals
    // ------------------------------------------------------------------

    /// Make `atom` (and its opposite) a goal.
    ///
    /// Returns `false` when `atom` is unknown or no rule concludes it.
    pub fn add_goal(&mut self, atom: &str) -> bool {
        let Some(id) = self.fact_id(atom) else {
            return false;
        };
        if !self.fact_ref(id).is_some_and(Fact::provable) {
            return false;
        }
        self.del_knowledge_id(id);
        self.goals.insert(id);
        if let Some(opp) = self.opposition.get(id) {
            self.del_knowledge_id(opp);
            self.goals.insert(opp);
        }
        true
    }

    /// Remove `atom` and its opposite from the goals.
    pub fn del_goal(&mut self, atom: &str) {
        if let Some(id) = self.fact_id(atom) {
            self.del_goal_id(id);
        }
    }

    /// Flush the goals.
    pub fn reset_goal(&mut self) {
        self.goals.clear();
    }

    /// Current goals, in fact-id order.
    #[must_use]
    pub fn get_goals(&self) -> Vec<String> {
        self.names(&self.goals)
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Run one base resolution.
    ///
    /// Both backward traversals run the same goal-directed AND/OR search.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::UnsupportedRegime` for [`Regime::Mixed`].
    pub fn resolve(&mut self, mode: ResolutionMode, use_memory: bool) -> InferResult<Resolution> {
        let span = tracing::debug_span!("resolve", engine = %self.id, mode = %mode, use_memory);
        let _guard = span.enter();

        self.inconsistent = false;
        let resolution = match (mode.regime, mode.traversal) {
            (Regime::Forward, Traversal::DepthFirst) => self.forward_dfs(use_memory),
            (Regime::Forward, Traversal::BreadthFirst) => self.forward_bfs(use_memory),
            (Regime::Backward, _) => self.backward(use_memory),
            (Regime::Mixed, _) => {
                return Err(ExecutionError::UnsupportedRegime {
                    regime: mode.regime,
                }
                .into())
            }
        };

        tracing::info!(
            method = %resolution.method,
            rules_fired = resolution.rules_fired,
            success = resolution.success,
            inconsistent = resolution.inconsistent,
            new_facts = resolution.new_facts.len(),
            "resolution finished"
        );
        tracing::debug!("{resolution}");
        Ok(resolution)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// `(atom, short fact display)` for every known atom, in creation order.
    #[must_use]
    pub fn table(&self) -> Vec<(String, String)> {
        self.store
            .facts()
            .map(|(name, fact)| (name.to_string(), fact.to_string()))
            .collect()
    }

    /// Every rule, rendered with atom names.
    #[must_use]
    pub fn rules_view(&self) -> Vec<String> {
        self.store
            .rules()
            .iter()
            .map(|r| self.store.describe_rule(r.id()))
            .collect()
    }

    /// Facts in the Base.
    #[must_use]
    pub fn base_view(&self) -> Vec<String> {
        self.names(&self.base)
    }

    /// Facts in the goal set.
    #[must_use]
    pub fn goals_view(&self) -> Vec<String> {
        self.get_goals()
    }

    // ------------------------------------------------------------------
    // Id-level helpers shared by the chaining engines
    // ------------------------------------------------------------------

    pub(crate) fn fact_ref(&self, id: FactId) -> Option<&Fact> {
        self.store.fact(id)
    }

    pub(crate) fn name(&self, id: FactId) -> String {
        self.store.name_of(id).unwrap_or_default().to_string()
    }

    pub(crate) fn names<'a>(&self, ids: impl IntoIterator<Item = &'a FactId>) -> Vec<String> {
        ids.into_iter().map(|id| self.name(*id)).collect()
    }

    pub(crate) fn discrete_id(&self, id: FactId) -> Discrete {
        crate::fact::discretize(self.store.belief(id), self.config.threshold)
    }

    pub(crate) fn in_base(&self, id: FactId) -> bool {
        self.base.contains(&id)
    }

    pub(crate) fn add_knowledge_id(&mut self, id: FactId) {
        self.del_goal_id(id);
        self.base.insert(id);
        if let Some(opp) = self.opposition.get(id) {
            self.base.insert(opp);
            let belief = self.store.belief(id);
            self.store.set_belief(opp, -belief);
        }
    }

    pub(crate) fn del_knowledge_id(&mut self, id: FactId) {
        self.base.remove(&id);
        if let Some(opp) = self.opposition.get(id) {
            self.base.remove(&opp);
        }
    }

    pub(crate) fn change_knowledge_id(&mut self, id: FactId, value: f64) -> bool {
        if self.goals.contains(&id) {
            return false;
        }
        self.store.set_belief(id, value);
        if let Some(opp) = self.opposition.get(id) {
            self.store.set_belief(opp, -value);
        }
        self.base.contains(&id)
    }

    pub(crate) fn del_goal_id(&mut self, id: FactId) {
        self.goals.remove(&id);
        if let Some(opp) = self.opposition.get(id) {
            self.goals.remove(&opp);
        }
    }

    pub(crate) fn new_resolution(&self, method: &str) -> Resolution {
        Resolution::empty(method, self.store.fingerprint())
    }
}

impl fmt::Display for InferenceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rules")?;
        for line in self.rules_view() {
            writeln!(f, "{line}")?;
        }
        writeln!(f, "Known facts")?;
        for id in &self.base {
            if let Some(fact) = self.fact_ref(*id) {
                writeln!(f, "{} {fact}", self.name(*id))?;
            }
        }
        write!(f, "=======")
    }
}
