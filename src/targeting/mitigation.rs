//! Damage mitigation pipeline.
//!
//! Every damage instance runs the same fixed pipeline against its
//! recipient:
//!
//! immune check → shield absorb → barrier absorb → damage-taken
//! multiplier → resist reduction → absorb reduction (converted to
//! defender self-healing) → weakness increase → HP subtraction.
//!
//! Rules are gathered per instance from the recipient's innate text plus
//! active mitigation-bearing statuses, each gated on the damage's type
//! tags.

use serde::{Deserialize, Serialize};

use crate::cards::definition::TypeTag;
use crate::core::log::CombatLog;
use crate::core::state::Character;
use crate::status::{derived, names, MitigationKind, StatusField, StatusRegistry, TagGate};

/// One mitigation rule, from innate text or an active status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationRule {
    pub kind: MitigationKind,
    pub gate: TagGate,
    /// Ignored for `Immune`.
    pub amount: i32,
}

/// Outcome of one damage instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DamageReport {
    pub hp_lost: i32,
    pub shield_absorbed: i32,
    pub barrier_absorbed: i32,
    /// Damage converted into defender self-healing by absorb rules.
    pub absorbed_heal: i32,
    pub immune: bool,
}

/// Collect the recipient's mitigation rules that apply to this instance.
fn gather_rules(registry: &StatusRegistry, ch: &Character, tags: &[TypeTag]) -> Vec<MitigationRule> {
    let mut rules: Vec<MitigationRule> = ch
        .innate_rules
        .iter()
        .copied()
        .filter(|r| r.gate.matches(tags))
        .collect();

    for (name, state) in &ch.statuses {
        let def = registry.def_or_default(name);
        let Some((kind, gate)) = def.mitigation else {
            continue;
        };
        if !state.is_active(def.mode) || !gate.matches(tags) {
            continue;
        }
        rules.push(MitigationRule {
            kind,
            gate,
            amount: state.get(def.amount_field()),
        });
    }

    rules
}

fn sum_of(rules: &[MitigationRule], kind: MitigationKind) -> i32 {
    rules
        .iter()
        .filter(|r| r.kind == kind)
        .map(|r| r.amount)
        .sum()
}

/// Run one damage instance through the pipeline, mutating the recipient.
pub fn apply_damage(
    registry: &StatusRegistry,
    ch: &mut Character,
    amount: i32,
    tags: &[TypeTag],
    log: &mut CombatLog,
) -> DamageReport {
    let mut report = DamageReport::default();
    if amount <= 0 || !ch.is_alive() {
        return report;
    }

    let rules = gather_rules(registry, ch, tags);

    if rules.iter().any(|r| r.kind == MitigationKind::Immune) {
        report.immune = true;
        log.push(format!("{} is immune", ch.name));
        return report;
    }

    let mut remaining = amount;

    // Shield absorb
    let from_shield = remaining.min(ch.shield);
    ch.shield -= from_shield;
    remaining -= from_shield;
    report.shield_absorbed = from_shield;

    // Barrier absorb
    if remaining > 0 {
        if let Some(barrier) = ch.statuses.get_mut(names::BARRIER) {
            let pool = barrier.get(StatusField::Value);
            let from_barrier = remaining.min(pool);
            barrier.add(StatusField::Value, -from_barrier);
            remaining -= from_barrier;
            report.barrier_absorbed = from_barrier;
            crate::status::engine::prune(registry, ch, names::BARRIER);
        }
    }

    // Damage-taken multiplier
    remaining = derived::scaled(remaining, derived::damage_taken_percent(registry, ch));

    // Resist reduction
    remaining = (remaining - sum_of(&rules, MitigationKind::Resist)).max(0);

    // Absorb reduction, converted into self-healing
    let absorbed = remaining.min(sum_of(&rules, MitigationKind::Absorb));
    remaining -= absorbed;
    report.absorbed_heal = absorbed;

    // Weakness increase
    if remaining > 0 {
        remaining += sum_of(&rules, MitigationKind::Weakness);
    }

    ch.hp = (ch.hp - remaining).max(0);
    report.hp_lost = remaining;

    if absorbed > 0 {
        ch.hp = (ch.hp + absorbed).min(ch.max_hp);
    }

    if remaining > 0 {
        log.push(format!("{} takes {remaining} damage", ch.name));
    } else {
        log.push(format!("{} takes no damage", ch.name));
    }

    report
}

/// Heal, subject to healing-reduction statuses. Returns the amount
/// actually healed.
pub fn apply_heal(
    registry: &StatusRegistry,
    ch: &mut Character,
    amount: i32,
    log: &mut CombatLog,
) -> i32 {
    if amount <= 0 || !ch.is_alive() {
        return 0;
    }

    let effective = derived::scaled(amount, derived::healing_percent(registry, ch));
    let healed = effective.min(ch.max_hp - ch.hp);
    ch.hp += healed;

    if healed > 0 {
        log.push(format!("{} heals {healed}", ch.name));
    }
    healed
}
