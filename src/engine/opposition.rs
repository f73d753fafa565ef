//! Opposition (negation) pairs.
//!
//! An opposition binds two atoms as logical negations of each other: their
//! beliefs stay sign-opposite and they always share Base/goal membership.
//! Pairing is one-to-one; an atom can have at most one opposite.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::InferenceEngine;
use crate::error::InferResult;
use crate::fact::FactId;

/// Result of [`InferenceEngine::add_opposition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OppositionOutcome {
    /// The pair exists and memberships are consistent.
    Established,
    /// Both atoms exist but cannot be paired (already paired elsewhere, or
    /// both discretize to the same non-zero value). Nothing changed.
    Conflict,
    /// The request was refused: same atom twice, or the existing atom is
    /// already paired.
    Rejected,
}

impl OppositionOutcome {
    /// Legacy integer code: 1, 0 or -1.
    #[must_use]
    pub const fn code(self) -> i8 {
        match self {
            Self::Established => 1,
            Self::Conflict => 0,
            Self::Rejected => -1,
        }
    }
}

/// Symmetric one-to-one map between opposed facts.
#[derive(Debug, Clone, Default)]
pub(crate) struct OppositionTable {
    pairs: HashMap<FactId, FactId>,
}

impl OppositionTable {
    pub(crate) fn get(&self, id: FactId) -> Option<FactId> {
        self.pairs.get(&id).copied()
    }

    fn is_paired(&self, id: FactId) -> bool {
        self.pairs.contains_key(&id)
    }

    fn pair(&mut self, a: FactId, b: FactId) {
        self.pairs.insert(a, b);
        self.pairs.insert(b, a);
    }

    pub(crate) fn clear(&mut self) {
        self.pairs.clear();
    }
}

impl InferenceEngine {
    /// Bind `a` and `b` as opposites.
    ///
    /// - neither exists: both are created and paired
    /// - both exist: paired unless one is already paired elsewhere or both
    ///   discretize to the same non-zero value; the larger magnitude wins and
    ///   the other is forced to its negation
    /// - only one exists: the other is created with the negated belief
    ///
    /// Afterwards Base/goal membership is made consistent across the pair.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyAtom` if an atom that must be created is blank.
    pub fn add_opposition(&mut self, a: &str, b: &str) -> InferResult<OppositionOutcome> {
        if a == b {
            return Ok(OppositionOutcome::Rejected);
        }

        let outcome = match (self.fact_id(a), self.fact_id(b)) {
            (None, None) => {
                let x = self.store.lookup_or_create(a)?;
                let y = self.store.lookup_or_create(b)?;
                self.bind(x, y);
                OppositionOutcome::Established
            }
            (Some(x), Some(y)) => self.oppose_existing(x, y),
            (Some(x), None) => self.oppose_new(x, b)?,
            (None, Some(y)) => self.oppose_new(y, a)?,
        };

        if outcome != OppositionOutcome::Established {
            tracing::debug!(a, b, outcome = ?outcome, "opposition not established");
        }
        Ok(outcome)
    }

    fn oppose_existing(&mut self, x: FactId, y: FactId) -> OppositionOutcome {
        if self.opposition.get(x) == Some(y) {
            return OppositionOutcome::Established;
        }
        if self.opposition.is_paired(x) || self.opposition.is_paired(y) {
            return OppositionOutcome::Conflict;
        }

        let (dx, dy) = (self.discrete_id(x), self.discrete_id(y));
        if dx.as_i8() * dy.as_i8() == 1 {
            return OppositionOutcome::Conflict;
        }

        let (bx, by) = (self.store.belief(x), self.store.belief(y));
        if bx.abs() > by.abs() {
            self.store.set_belief(y, -bx);
        } else if by.abs() > bx.abs() {
            self.store.set_belief(x, -by);
        } else if dx == dy {
            self.store.set_belief(x, 0.0);
            self.store.set_belief(y, 0.0);
        }
        self.bind(x, y);
        OppositionOutcome::Established
    }

    fn oppose_new(&mut self, existing: FactId, atom: &str) -> InferResult<OppositionOutcome> {
        if self.opposition.is_paired(existing) {
            return Ok(OppositionOutcome::Rejected);
        }
        let created = self.store.lookup_or_create(atom)?;
        let belief = self.store.belief(existing);
        self.store.set_belief(created, -belief);
        self.bind(existing, created);
        Ok(OppositionOutcome::Established)
    }

    fn bind(&mut self, k1: FactId, k2: FactId) {
        self.opposition.pair(k1, k2);
        self.align_membership(k1, k2);
    }

    /// Base and goals are disjoint on entry; make the pair agree on membership.
    fn align_membership(&mut self, k1: FactId, k2: FactId) {
        if self.base.contains(&k1) {
            if self.goals.contains(&k2) {
                self.base.remove(&k1);
                self.goals.remove(&k2);
            } else {
                self.base.insert(k2);
            }
        } else if self.goals.contains(&k1) {
            if self.base.contains(&k2) {
                self.base.remove(&k2);
                self.goals.remove(&k1);
            } else {
                self.goals.insert(k2);
            }
        } else if self.base.contains(&k2) {
            self.base.insert(k1);
        } else if self.goals.contains(&k2) {
            self.goals.insert(k1);
        }
    }

    /// Opposite of `atom`, if it has one.
    #[must_use]
    pub fn get_opposite(&self, atom: &str) -> Option<&str> {
        let id = self.fact_id(atom)?;
        let opp = self.opposition.get(id)?;
        self.atom_name(opp)
    }

    pub(crate) fn opposite_id(&self, id: FactId) -> Option<FactId> {
        self.opposition.get(id)
    }

    /// True if `atom` exists and carries a negation marker.
    #[must_use]
    pub fn is_negative(&self, atom: &str) -> bool {
        self.fact_id(atom).is_some() && self.config.negation_marker_of(atom).is_some()
    }

    /// True if `atom` exists and carries no negation marker.
    #[must_use]
    pub fn is_positive(&self, atom: &str) -> bool {
        self.fact_id(atom).is_some() && self.config.negation_marker_of(atom).is_none()
    }

    /// Every atom without a negation marker.
    #[must_use]
    pub fn positive_atoms(&self) -> BTreeSet<String> {
        self.store
            .facts()
            .map(|(name, _)| name)
            .filter(|name| self.config.negation_marker_of(name).is_none())
            .map(str::to_string)
            .collect()
    }

    /// Every atom carrying a negation marker.
    #[must_use]
    pub fn negative_atoms(&self) -> BTreeSet<String> {
        self.store
            .facts()
            .map(|(name, _)| name)
            .filter(|name| self.config.negation_marker_of(name).is_some())
            .map(str::to_string)
            .collect()
    }

    /// Name of the literal opposed to `atom`, without creating anything:
    /// the current opposite if paired, otherwise the marker is stripped from a
    /// negative atom or the negation prefix is prepended to a positive one.
    #[must_use]
    pub fn opposed_literal_name(&self, atom: &str) -> String {
        if let Some(opp) = self.get_opposite(atom) {
            return opp.to_string();
        }
        match self.config.negation_marker_of(atom) {
            Some(marker) => atom[marker.len()..].to_string(),
            None => format!("{}{atom}", self.config.negation_prefix),
        }
    }

    /// Like [`InferenceEngine::opposed_literal_name`], but also establishes the pair.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the opposed atom would be blank.
    pub fn opposed_literal(&mut self, atom: &str) -> InferResult<String> {
        let name = self.opposed_literal_name(atom);
        if self.get_opposite(atom).is_none() {
            let outcome = self.add_opposition(atom, &name)?;
            if outcome != OppositionOutcome::Established {
                tracing::warn!(atom, opposite = %name, outcome = ?outcome, "could not pair literal");
            }
        }
        Ok(name)
    }

    /// Pair every positive atom with its negative form, creating whichever
    /// side is missing. Returns `false` if some pair could not be established.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a synthesized atom would be blank.
    pub fn build_opposition_closure(&mut self) -> InferResult<bool> {
        let unpaired_pos: BTreeSet<String> = self
            .positive_atoms()
            .into_iter()
            .filter(|a| self.get_opposite(a).is_none())
            .collect();
        let unpaired_neg: BTreeSet<String> = self
            .negative_atoms()
            .into_iter()
            .filter(|a| self.get_opposite(a).is_none())
            .map(|a| self.strip_marker(&a))
            .collect();

        for atom in unpaired_pos.difference(&unpaired_neg) {
            let negated = format!("{}{atom}", self.config.negation_prefix);
            self.store.lookup_or_create(&negated)?;
        }
        for atom in unpaired_neg.difference(&unpaired_pos) {
            self.store.lookup_or_create(atom)?;
        }

        let mut ok = true;
        for negative in self.negative_atoms() {
            let positive = self.strip_marker(&negative);
            if self.get_opposite(&negative) == Some(positive.as_str()) {
                continue;
            }
            let outcome = self.add_opposition(&positive, &negative)?;
            if outcome != OppositionOutcome::Established {
                tracing::warn!(
                    positive = %positive,
                    negative = %negative,
                    code = outcome.code(),
                    "opposition closure could not pair atoms"
                );
                ok = false;
            }
        }
        Ok(ok)
    }

    /// Pair every unpaired negative atom with its stripped positive form.
    ///
    /// Lighter than [`InferenceEngine::build_opposition_closure`]: no
    /// `prefix+atom` partner is synthesized for positive atoms.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a stripped atom would be blank.
    pub fn pair_negative_literals(&mut self) -> InferResult<usize> {
        let mut paired = 0;
        for negative in self.negative_atoms() {
            if self.get_opposite(&negative).is_none() {
                self.opposed_literal(&negative)?;
                paired += usize::from(self.get_opposite(&negative).is_some());
            }
        }
        Ok(paired)
    }

    fn strip_marker(&self, atom: &str) -> String {
        self.config
            .negation_marker_of(atom)
            .map_or_else(|| atom.to_string(), |m| atom[m.len()..].to_string())
    }
}
