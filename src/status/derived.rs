//! Derived stat functions.
//!
//! Nothing here is stored: multipliers, cost deltas, and speed shifts are
//! computed on demand from the current status bag. Integer percent math
//! throughout, rounding toward zero.

use crate::cards::definition::CardKind;
use crate::core::state::Character;
use crate::status::def::{names, StatusRegistry};
use crate::status::state::StatusField;

fn potency_of(ch: &Character, registry: &StatusRegistry, name: &str) -> i32 {
    if !ch.has_active(registry, name) {
        return 0;
    }
    ch.status(name)
        .map(|s| s.get(StatusField::Potency))
        .unwrap_or(0)
}

/// Damage-taken multiplier in percent: vulnerable ×150, fortified ×75.
#[must_use]
pub fn damage_taken_percent(registry: &StatusRegistry, ch: &Character) -> i32 {
    let mut pct = 100;
    if ch.has_active(registry, names::VULNERABLE) {
        pct = pct * 150 / 100;
    }
    if ch.has_active(registry, names::FORTIFIED) {
        pct = pct * 75 / 100;
    }
    pct
}

/// Power multiplier in percent for a card kind.
///
/// Attacks scale with strength/weak, defenses with dexterity/frail,
/// 10 percent per point of potency. Skills are unscaled.
#[must_use]
pub fn power_percent(registry: &StatusRegistry, ch: &Character, kind: CardKind) -> i32 {
    let (up, down) = match kind {
        CardKind::Attack => (names::STRENGTH, names::WEAK),
        CardKind::Defense => (names::DEXTERITY, names::FRAIL),
        CardKind::Skill => return 100,
    };

    let pct = 100 + 10 * potency_of(ch, registry, up) - 10 * potency_of(ch, registry, down);
    pct.max(0)
}

/// Apply a percent multiplier to a base power.
#[must_use]
pub fn scaled(base: i32, percent: i32) -> i32 {
    base * percent / 100
}

/// Energy-cost delta from strain/focus/blood-focus.
#[must_use]
pub fn energy_cost_delta(registry: &StatusRegistry, ch: &Character) -> i32 {
    let blood = if ch.has_active(registry, names::BLOOD_FOCUS) {
        ch.status(names::BLOOD_FOCUS)
            .map(|s| s.get(StatusField::Stack))
            .unwrap_or(0)
    } else {
        0
    };

    potency_of(ch, registry, names::STRAIN) - potency_of(ch, registry, names::FOCUS) - blood
}

/// Speed-tier shift from haste/slow, clamped to ±2 tiers.
#[must_use]
pub fn speed_shift(registry: &StatusRegistry, ch: &Character) -> i32 {
    let shift = potency_of(ch, registry, names::HASTE) - potency_of(ch, registry, names::SLOW);
    shift.clamp(-2, 2)
}

/// Healing multiplier in percent: wound halves incoming healing.
#[must_use]
pub fn healing_percent(registry: &StatusRegistry, ch: &Character) -> i32 {
    if ch.has_active(registry, names::WOUND) {
        50
    } else {
        100
    }
}
