//! Effect system: structured effect definitions and the per-window
//! interpreter.

pub mod effect;
pub mod interpreter;

pub use effect::{
    ChoiceBranch, DamageAmount, Effect, EffectTarget, GrantedKeyword, PileKind, Predicate,
    PushDirection, SpendGate, TimedEffect, Timing,
};
pub use interpreter::{run_window, WindowReport};
