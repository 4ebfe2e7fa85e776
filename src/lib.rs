//! # zone-clash
//!
//! Deterministic combat-resolution engine for a two-team, card-driven
//! tactical battler. Two teams of characters play cards into speed-tiered
//! zones; the engine resolves interaction order (clashes, interrupts,
//! timing windows), applies a four-field status-effect model, and
//! guarantees that the same recorded action sequence always reproduces
//! the same final state.
//!
//! ## Design Principles
//!
//! 1. **One entry point**: all mutation flows through
//!    [`MatchEngine::apply_action`], which returns a new immutable state
//!    snapshot (copy-on-write; `im` collections keep clones cheap).
//!
//! 2. **Rejections are values**: an illegal action returns the previous
//!    state plus a human-readable reason, never a panic. Only match
//!    construction and replay divergence are hard errors.
//!
//! 3. **Replay as an oracle**: every attempted action — including
//!    rejected ones — is recorded; [`MatchEngine::replay_transcript`]
//!    rebuilds the match from the seed and asserts every step matches.
//!
//! ## Modules
//!
//! - `core`: ids, RNG, actions, combat log, the `MatchState` aggregate
//! - `cards`: card definitions, instances, free-text adapter boundary
//! - `status`: four-field status model, reactions, decay, derived stats
//! - `targeting`: legal targets, expansion, redirect, mitigation pipeline
//! - `effects`: the structured effect set and per-window interpreter
//! - `combat`: speed-tiered zones, interrupt chain, clash resolution
//! - `turn`: turn/phase lifecycle
//! - `engine`: setup validation and the action entry point
//! - `transcript`: the append-only replay record

pub mod cards;
pub mod combat;
pub mod core;
pub mod effects;
pub mod engine;
pub mod error;
pub mod status;
pub mod targeting;
pub mod transcript;
pub mod turn;

// Re-export commonly used types
pub use crate::core::{
    Action, CardInstanceId, CardRef, CharacterId, CombatLog, Character, CounterWindow, MatchRng,
    MatchRngState, MatchState, Phase, PileId, PlayCard, Team, TeamId,
};

pub use crate::cards::{
    CardDefId, CardDefinition, CardInstance, CardKind, CardLibrary, CostSpec, EffectLineAdapter,
    Keywords, NullAdapter, PowerSpec, Restriction, TargetSpec, Transform, TypeTag,
};

pub use crate::status::{
    names as status_names, DecayRule, DecayStep, FieldCaps, MitigationKind, Reaction, StatusDef,
    StatusField, StatusMode, StatusRegistry, StatusState, TagGate, TickKind,
};

pub use crate::effects::{
    ChoiceBranch, DamageAmount, Effect, EffectTarget, GrantedKeyword, PileKind, Predicate,
    PushDirection, SpendGate, TimedEffect, Timing,
};

pub use crate::combat::{SpeedTier, StackEntry, Zone, ZoneStack};

pub use crate::targeting::{DamageReport, MitigationRule};

pub use crate::engine::{ActionOutcome, CharacterSpec, MatchEngine, MatchSetup, TeamSetup};

pub use crate::error::{ReplayError, SetupError};

pub use crate::transcript::{AttemptRecord, Transcript, TRANSCRIPT_VERSION};
