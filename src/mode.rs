//! Resolution modes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Chaining direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Data-driven: fire rules whose antecedents are known.
    Forward,
    /// Goal-driven AND/OR search.
    Backward,
    /// Reserved; no engine implements it.
    Mixed,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Backward => write!(f, "backward"),
            Self::Mixed => write!(f, "mixed"),
        }
    }
}

/// Order in which candidate rules are explored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Traversal {
    /// Stack discipline.
    #[default]
    DepthFirst,
    /// Level-by-level.
    BreadthFirst,
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepthFirst => write!(f, "dfs"),
            Self::BreadthFirst => write!(f, "bfs"),
        }
    }
}

/// A (regime, traversal) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionMode {
    /// Chaining direction.
    pub regime: Regime,
    /// Exploration order.
    pub traversal: Traversal,
}

impl ResolutionMode {
    /// Forward chaining, depth-first.
    pub const FORWARD_DFS: Self = Self::new(Regime::Forward, Traversal::DepthFirst);
    /// Forward chaining, breadth-first.
    pub const FORWARD_BFS: Self = Self::new(Regime::Forward, Traversal::BreadthFirst);
    /// Backward chaining, depth-first.
    pub const BACKWARD_DFS: Self = Self::new(Regime::Backward, Traversal::DepthFirst);
    /// Backward chaining, breadth-first (explored depth-first; see `InferenceEngine::resolve`).
    pub const BACKWARD_BFS: Self = Self::new(Regime::Backward, Traversal::BreadthFirst);

    /// The six base modes, in legacy code order.
    pub const ALL: [Self; 6] = [
        Self::FORWARD_DFS,
        Self::FORWARD_BFS,
        Self::BACKWARD_DFS,
        Self::BACKWARD_BFS,
        Self::new(Regime::Mixed, Traversal::DepthFirst),
        Self::new(Regime::Mixed, Traversal::BreadthFirst),
    ];

    /// Creates a mode.
    #[must_use]
    pub const fn new(regime: Regime, traversal: Traversal) -> Self {
        Self { regime, traversal }
    }

    /// Decode a legacy integer code in `0..6`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownModeCode` for codes `>= 6`.
    pub fn from_code(code: u8) -> Result<Self, ValidationError> {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(ValidationError::UnknownModeCode { code })
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.regime, self.traversal)
    }
}

/// A resolution request as received from a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// Base mode.
    pub mode: ResolutionMode,
    /// Memoize fired rules / proven goals.
    pub use_memory: bool,
    /// On failure, run the remedial pipeline and retry once.
    pub remediate: bool,
}

impl ResolveRequest {
    /// Plain base resolution.
    #[must_use]
    pub const fn base(mode: ResolutionMode, use_memory: bool) -> Self {
        Self {
            mode,
            use_memory,
            remediate: false,
        }
    }

    /// Base resolution followed, on failure, by one remedial retry.
    #[must_use]
    pub const fn remediated(mode: ResolutionMode, use_memory: bool) -> Self {
        Self {
            mode,
            use_memory,
            remediate: true,
        }
    }

    /// Decode a legacy integer code: `0..6` are base modes, anything above
    /// selects `code % 6` with remediation.
    ///
    /// Codes that land on 4 or 5 decode to a mixed mode, which
    /// [`InferenceEngine::execute`](crate::InferenceEngine::execute) rejects.
    #[must_use]
    pub fn from_code(code: u8, use_memory: bool) -> Self {
        let mode = ResolutionMode::ALL[usize::from(code % 6)];
        if code < 6 {
            Self::base(mode, use_memory)
        } else {
            Self::remediated(mode, use_memory)
        }
    }
}
