//! Status effect engine.
//!
//! - [`state`]: the four-field runtime state per status instance
//! - [`def`]: status definitions, modes, caps, reaction tables, and the
//!   process-wide registry
//! - [`engine`]: mutation with clamping, pruning, reactions, and turn-end
//!   decay
//! - [`derived`]: computed-on-demand multipliers and deltas

pub mod def;
pub mod derived;
pub mod engine;
pub mod state;

pub use def::{
    names, DecayRule, DecayStep, FieldCaps, MitigationKind, Reaction, StatusDef, StatusMode,
    StatusRegistry, TagGate, TickKind,
};
pub use state::{StatusField, StatusState};
