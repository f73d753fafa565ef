//! Certainty-factor (MYCIN) layer.
//!
//! Antecedents are evaluated on raw beliefs instead of their discretized
//! view, rule reliabilities weight each conclusion, and concurrent
//! conclusions for the same atom are reconciled by a [`ConflictStrategy`].

mod combine;
mod policies;
mod resolver;

pub use combine::{aggregate, round_to};
pub use policies::ConflictStrategy;
