//! Status mutation and lifecycle.
//!
//! All status writes go through this module so that:
//! - every field stays clamped to `[0, cap]`
//! - inactive statuses are pruned (except the persistent allow-list)
//! - inactive→active transitions fire the on-gain reaction table
//! - turn-end decay fires on-expire reactions when a status deactivates
//!
//! On-gain reactions fire on *any* gain-driven activation; on-expire
//! reactions fire only from turn-end decay processing. Reactions are
//! self-targeted and recursion through `Gain` reactions is depth-bounded.

use crate::core::log::CombatLog;
use crate::core::state::{Character, PendingGain};

use super::def::{DecayStep, Reaction, StatusRegistry, TickKind};
use super::state::{StatusField, StatusState};

/// Bound on reaction recursion (a gain reaction granting a status whose
/// own gain reaction grants another, and so on).
const MAX_REACTION_DEPTH: u8 = 4;

/// Gain `amount` on a status field (default: the mode's amount field).
///
/// For potency/count statuses, gaining one half of the pair seeds the
/// other to at least 1 so a single-number gain activates the status.
pub fn gain(
    registry: &StatusRegistry,
    ch: &mut Character,
    name: &str,
    field: Option<StatusField>,
    amount: i32,
    log: &mut CombatLog,
) {
    gain_at_depth(registry, ch, name, field, amount, 0, log);
}

fn gain_at_depth(
    registry: &StatusRegistry,
    ch: &mut Character,
    name: &str,
    field: Option<StatusField>,
    amount: i32,
    depth: u8,
    log: &mut CombatLog,
) {
    if amount <= 0 || !ch.is_alive() {
        return;
    }

    let def = registry.def_or_default(name).clone();
    let field = field.unwrap_or_else(|| def.amount_field());

    let entry = ch.statuses.entry(name.to_string()).or_default();
    let was_active = entry.is_active(def.mode);

    entry.add(field, amount);
    if def.mode == super::def::StatusMode::PotencyCount {
        match field {
            StatusField::Potency if entry.count == 0 => entry.count = 1,
            StatusField::Count if entry.potency == 0 => entry.potency = 1,
            _ => {}
        }
    }
    entry.clamp(&def.caps);
    let now_active = entry.is_active(def.mode);

    if !was_active && now_active {
        log.push(format!("{} gains {name}", ch.name));
        run_reactions(registry, ch, &def.on_gain, depth + 1, log);
    }

    prune(registry, ch, name);
}

/// Reduce a status field, never below `floor`.
pub fn reduce(
    registry: &StatusRegistry,
    ch: &mut Character,
    name: &str,
    field: StatusField,
    amount: i32,
    floor: i32,
    log: &mut CombatLog,
) {
    let def = registry.def_or_default(name).clone();
    let Some(entry) = ch.statuses.get_mut(name) else {
        return;
    };

    let current = entry.get(field);
    entry.set(field, (current - amount).max(floor.max(0)));
    entry.clamp(&def.caps);

    log.push(format!("{}'s {name} is reduced", ch.name));
    prune(registry, ch, name);
}

/// Set a status field to an exact clamped value.
///
/// Setting a status from nothing can activate it, firing on-gain.
pub fn set(
    registry: &StatusRegistry,
    ch: &mut Character,
    name: &str,
    field: StatusField,
    value: i32,
    log: &mut CombatLog,
) {
    let def = registry.def_or_default(name).clone();

    let entry = ch.statuses.entry(name.to_string()).or_default();
    let was_active = entry.is_active(def.mode);

    entry.set(field, value);
    if def.mode == super::def::StatusMode::PotencyCount && entry.potency > 0 && entry.count == 0 {
        entry.count = 1;
    }
    entry.clamp(&def.caps);
    let now_active = entry.is_active(def.mode);

    if !was_active && now_active {
        log.push(format!("{} gains {name}", ch.name));
        run_reactions(registry, ch, &def.on_gain, 1, log);
    }

    prune(registry, ch, name);
}

/// Remove a status entirely, without firing reactions.
pub fn remove(registry: &StatusRegistry, ch: &mut Character, name: &str) {
    let _ = registry;
    ch.statuses.remove(name);
}

/// Spend from a status's resource field. Fully succeeds or fails.
///
/// Spending never fires expiry reactions; it is consumption, not decay.
pub fn spend(
    registry: &StatusRegistry,
    ch: &mut Character,
    name: &str,
    amount: i32,
) -> bool {
    let def = registry.def_or_default(name).clone();
    let field = def.spend_field();

    let Some(entry) = ch.statuses.get_mut(name) else {
        return false;
    };
    if entry.get(field) < amount {
        return false;
    }

    entry.add(field, -amount);
    entry.clamp(&def.caps);
    prune(registry, ch, name);
    true
}

/// Apply deferred gains scheduled by `Reaction::Deferred` (turn start).
pub fn apply_deferred(registry: &StatusRegistry, ch: &mut Character, log: &mut CombatLog) {
    let pending: Vec<PendingGain> = std::mem::take(&mut ch.pending_gains);
    for gain_spec in pending {
        gain(
            registry,
            ch,
            &gain_spec.name,
            gain_spec.field,
            gain_spec.amount,
            log,
        );
    }
}

/// Fire turn-start reaction tables of active statuses (stacking
/// weapon/transformation buffs).
pub fn turn_start_boosts(registry: &StatusRegistry, ch: &mut Character, log: &mut CombatLog) {
    let boosted: Vec<String> = ch
        .statuses
        .iter()
        .filter(|(name, state)| {
            let def = registry.def_or_default(name);
            !def.turn_start.is_empty() && state.is_active(def.mode)
        })
        .map(|(name, _)| name.clone())
        .collect();

    for name in boosted {
        let reactions = registry.def_or_default(&name).turn_start.clone();
        run_reactions(registry, ch, &reactions, 0, log);
    }
}

/// Turn-end decay: walk the registry's fixed order, tick periodic
/// damage/heal, apply each status's decay step, and fire on-expire when a
/// step deactivates a status.
pub fn turn_end_decay(registry: &StatusRegistry, ch: &mut Character, log: &mut CombatLog) {
    for name in registry.decay_order().to_vec() {
        let Some(def) = registry.get(&name).cloned() else {
            continue;
        };
        let Some(entry) = ch.statuses.get(&name) else {
            continue;
        };
        // Decay fires only while active.
        if !entry.is_active(def.mode) {
            continue;
        }

        let potency = entry.potency;
        match def.decay.tick {
            Some(TickKind::Damage) => {
                ch.hp = (ch.hp - potency).max(0);
                log.push(format!("{} suffers {potency} {name} damage", ch.name));
            }
            Some(TickKind::Heal) => {
                ch.hp = (ch.hp + potency).min(ch.max_hp);
                log.push(format!("{} recovers {potency} from {name}", ch.name));
            }
            None => {}
        }

        let entry = ch
            .statuses
            .get_mut(&name)
            .expect("status present during decay");
        match def.decay.step {
            DecayStep::None => {}
            DecayStep::HalveCount => entry.count /= 2,
            DecayStep::DecrementCount => entry.count -= 1,
            DecayStep::DecrementStack => entry.stack -= 1,
            DecayStep::DecrementValue => entry.value -= 1,
        }
        entry.clamp(&def.caps);

        if !entry.is_active(def.mode) {
            log.push(format!("{}'s {name} expires", ch.name));
            run_reactions(registry, ch, &def.on_expire, 0, log);
            prune(registry, ch, &name);
        }
    }
}

/// Expire a status immediately (stun skip), without reactions.
pub fn expire_now(registry: &StatusRegistry, ch: &mut Character, name: &str, log: &mut CombatLog) {
    if ch.statuses.remove(name).is_some() {
        log.push(format!("{}'s {name} expires", ch.name));
    }
    let _ = registry;
}

fn run_reactions(
    registry: &StatusRegistry,
    ch: &mut Character,
    reactions: &[Reaction],
    depth: u8,
    log: &mut CombatLog,
) {
    if depth > MAX_REACTION_DEPTH {
        log::debug!("reaction depth limit hit on {}", ch.name);
        return;
    }

    for reaction in reactions {
        match reaction {
            Reaction::Gain {
                name,
                field,
                amount,
            } => gain_at_depth(registry, ch, name, *field, *amount, depth, log),
            Reaction::Remove { name } => {
                ch.statuses.remove(name);
            }
            Reaction::Deferred {
                name,
                field,
                amount,
            } => ch.pending_gains.push(PendingGain {
                name: name.clone(),
                field: *field,
                amount: *amount,
            }),
            Reaction::Damage { amount } => {
                ch.hp = (ch.hp - amount).max(0);
                log.push(format!("{} loses {amount} HP", ch.name));
            }
            Reaction::Heal { amount } => {
                ch.hp = (ch.hp + amount).min(ch.max_hp);
            }
        }
    }
}

/// Prune an inactive status unless it is on the persistent allow-list.
pub fn prune(registry: &StatusRegistry, ch: &mut Character, name: &str) {
    let def = registry.def_or_default(name);
    if def.persistent {
        return;
    }
    if let Some(entry) = ch.statuses.get(name) {
        if !entry.is_active(def.mode) {
            ch.statuses.remove(name);
        }
    }
}
