//! Error taxonomy.
//!
//! Three structurally different failure categories:
//!
//! - **Illegal actions** are not errors at all: they are recoverable values,
//!   surfaced as a reason string on an otherwise-unchanged state. See
//!   [`crate::engine::ActionOutcome`].
//! - **Setup errors** fail fast at match construction. Match setup is a
//!   one-time precondition, not a steady-state operation.
//! - **Replay errors** mean the engine is non-deterministic or was given a
//!   different ruleset than recorded. Never silently ignored.

use thiserror::Error;

/// Construction-time invariant violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("team {0} has an empty roster")]
    EmptyRoster(usize),

    #[error("team {team} roster has duplicate member '{name}'")]
    DuplicateMember { team: usize, name: String },

    #[error("team {team} roster size {size} exceeds the line size {max}")]
    RosterTooLarge { team: usize, size: usize, max: usize },

    #[error("unknown card '{0}' in deck list")]
    UnknownCard(String),

    #[error("character '{0}' has no cards")]
    EmptyCardPool(String),
}

/// Replay divergence: the same recorded actions produced a different
/// outcome than the transcript. Carries the offending action index and
/// both outcomes to aid debugging.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplayError {
    #[error("transcript version {0} is not supported")]
    UnsupportedVersion(u32),

    #[error(
        "replay diverged at action {index}: recorded {expected:?}, got {actual:?}"
    )]
    Divergence {
        index: usize,
        expected: Option<String>,
        actual: Option<String>,
    },

    #[error("transcript could not be decoded: {0}")]
    Decode(String),

    #[error(transparent)]
    Setup(#[from] SetupError),
}
