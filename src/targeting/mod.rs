//! Targeting & mitigation resolver.
//!
//! - [`resolver`]: legal targets, AoE/splash/bounce expansion,
//!   redirect/cover interception
//! - [`mitigation`]: the fixed per-damage-instance pipeline

pub mod mitigation;
pub mod resolver;

pub use mitigation::{apply_damage, apply_heal, DamageReport, MitigationRule};
pub use resolver::{expand_targets, legal_targets, resolve_redirect};
