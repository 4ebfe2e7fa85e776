//! Core types: identifiers, RNG, actions, the combat log, and the match
//! state aggregate.

pub mod action;
pub mod ids;
pub mod log;
pub mod rng;
pub mod state;

pub use action::{Action, CardRef, PlayCard};
pub use ids::{CardInstanceId, CharacterId, TeamId};
pub use log::CombatLog;
pub use rng::{MatchRng, MatchRngState};
pub use state::{Character, CounterWindow, MatchState, PendingGain, Phase, PileId, Team};
