//! # kyroinfer - A Production-Rule Inference Engine
//!
//! kyroinfer reasons over named propositions (facts) and production rules
//! `a & b -> c [reliability]`. It chains forward (data-driven, depth- or
//! breadth-first) or backward (goal-driven AND/OR search), keeps negated
//! atoms consistent through opposition pairs, and offers a MYCIN-style
//! certainty-factor layer plus remedial strategies for failed resolutions.
//!
//! ## Core Concepts
//!
//! - **Fact**: an atom with a belief in `[-1, 1]`, read through a tri-state view
//! - **Rule**: an immutable `antecedents -> consequent` implication with a reliability
//! - **Base / Goals**: the atoms currently known, and the atoms currently sought
//! - **Opposition**: a one-to-one negation pair (`a` / `non-a`) kept sign-opposite
//! - **Resolution**: one chaining run, reported as a [`Resolution`] with its proof trace
//!
//! ## Usage
//!
//! ```rust
//! use kyroinfer::{InferenceEngine, ResolutionMode};
//!
//! let mut engine = InferenceEngine::new();
//! engine.load_rules("a -> b\nb -> c\n")?;
//! engine.add_knowledge("a")?;
//! engine.change_knowledge("a", 1.0)?;
//! engine.add_goal("c");
//!
//! let res = engine.resolve(ResolutionMode::BACKWARD_DFS, true)?;
//! assert!(res.success);
//! # Ok::<(), kyroinfer::InferError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod config;
pub mod error;
pub mod fact;
pub mod mode;
pub mod parser;
pub mod rule;
pub mod store;
pub mod trace;

// Reasoning
pub mod certainty;
pub mod engine;
pub mod remedy;
pub mod resolution;

// Re-export primary types at crate root for convenience
pub use certainty::{aggregate, round_to, ConflictStrategy};
pub use config::EngineConfig;
pub use engine::{EngineId, InferenceEngine, OppositionOutcome};
pub use error::{ExecutionError, InferError, InferResult, ValidationError};
pub use fact::{discretize, Discrete, Fact, FactId};
pub use mode::{Regime, ResolutionMode, ResolveRequest, Traversal};
pub use parser::{parse_rule, parse_rule_set, vocabulary, RuleSpec};
pub use remedy::{
    Contraposition, Interrogation, NegationAsFailure, NegationAsMissing, Oracle, RemedialStrategy,
    RemedyPipeline,
};
pub use resolution::Resolution;
pub use rule::{Reliability, Rule, RuleId};
pub use store::FactStore;
pub use trace::{ProofTrace, TraceEntry};
