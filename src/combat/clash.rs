//! Pairwise clash resolution.
//!
//! A zone resolves top-of-stack downward, comparing the top entry with
//! the entry beneath it. Same-team (or lone) entries resolve alone;
//! opposing entries clash pairwise: attack-vs-attack power comparison,
//! attack-vs-defense with evade/counter semantics, defense-vs-defense,
//! and mismatched combos resolving independently. Negation cancels the
//! opposing card before any effects fire.

use crate::cards::definition::{CardKind, CardLibrary};
use crate::core::state::{CounterWindow, MatchState};
use crate::effects::{run_window, Timing};
use crate::status::{derived, StatusRegistry};
use crate::targeting::resolve_redirect;

use super::zones::{SpeedTier, StackEntry};

/// Resolve the active zone completely, then tear it down (resuming any
/// paused zone).
pub fn resolve_zone(
    state: &mut MatchState,
    registry: &StatusRegistry,
    library: &CardLibrary,
    tier: SpeedTier,
) {
    state.log.push(format!("the {tier} zone resolves"));

    loop {
        if state.is_finished() || state.zones.zone(tier).is_empty() {
            break;
        }

        let top = state
            .zones
            .zone_mut(tier)
            .entries
            .pop()
            .expect("non-empty zone");
        let opposed = state
            .zones
            .zone(tier)
            .entries
            .last()
            .map(|beneath| beneath.team != top.team)
            .unwrap_or(false);

        if opposed {
            let beneath = state
                .zones
                .zone_mut(tier)
                .entries
                .pop()
                .expect("beneath entry");
            resolve_pair(state, registry, library, tier, top, beneath);
        } else {
            resolve_alone(state, registry, library, tier, top);
        }

        state.sweep_defeated();
    }

    // Reuse-tagged survivors go back to their owner's hand.
    let retained = std::mem::take(&mut state.zones.zone_mut(tier).retained);
    for entry in retained {
        let team = state.team_mut(entry.team);
        if !team.removed.contains(&entry.card) {
            team.hand.push(entry.card);
        }
    }

    state.zones.finish_active();
}

/// Power after the actor's current (clash-time) multipliers.
fn effective_power(state: &MatchState, registry: &StatusRegistry, entry: &StackEntry) -> i32 {
    state
        .character(entry.actor)
        .map(|ch| derived::scaled(entry.power, derived::power_percent(registry, ch, entry.kind)))
        .unwrap_or(entry.power)
}

/// Resolve an entry with no opposing card beneath it.
fn resolve_alone(
    state: &mut MatchState,
    registry: &StatusRegistry,
    library: &CardLibrary,
    tier: SpeedTier,
    mut entry: StackEntry,
) {
    if entry.negated {
        teardown(state, tier, entry);
        return;
    }

    entry.is_hit = entry.kind == CardKind::Attack;
    run_use_phase(state, registry, library, &mut entry);
    run_window(state, registry, library, &mut entry, Timing::Always);
    teardown(state, tier, entry);
}

/// The shared use-phase sequence: redirect, before_use, on_use, on_hit
/// (if hit), after_use. `Always` is the caller's responsibility since it
/// fires even for cancelled entries.
fn run_use_phase(
    state: &mut MatchState,
    registry: &StatusRegistry,
    library: &CardLibrary,
    entry: &mut StackEntry,
) {
    resolve_redirect(state, registry, entry);
    run_window(state, registry, library, entry, Timing::BeforeUse);
    run_window(state, registry, library, entry, Timing::OnUse);
    if entry.is_hit {
        run_window(state, registry, library, entry, Timing::OnHit);
    }
    run_window(state, registry, library, entry, Timing::AfterUse);
}

fn resolve_pair(
    state: &mut MatchState,
    registry: &StatusRegistry,
    library: &CardLibrary,
    tier: SpeedTier,
    mut top: StackEntry,
    mut beneath: StackEntry,
) {
    // Negation cancels the opposing card before any effects fire.
    if top.keywords.negate {
        beneath.negated = true;
        state
            .log
            .push(format!("{} negates {}", top.card_name, beneath.card_name));
    }
    if beneath.keywords.negate {
        top.negated = true;
        state
            .log
            .push(format!("{} negates {}", beneath.card_name, top.card_name));
    }

    // Every pairwise comparison fires before_clash then after_clash on
    // both entries, regardless of outcome. Negated entries skip all
    // timings.
    if !top.negated {
        run_window(state, registry, library, &mut top, Timing::BeforeClash);
    }
    if !beneath.negated {
        run_window(state, registry, library, &mut beneath, Timing::BeforeClash);
    }

    match (top.negated, beneath.negated) {
        (true, true) => {
            teardown(state, tier, top);
            teardown(state, tier, beneath);
            return;
        }
        (true, false) => {
            run_window(state, registry, library, &mut beneath, Timing::AfterClash);
            beneath.is_hit = beneath.kind == CardKind::Attack;
            run_use_phase(state, registry, library, &mut beneath);
            run_window(state, registry, library, &mut beneath, Timing::Always);
            teardown(state, tier, top);
            teardown(state, tier, beneath);
            return;
        }
        (false, true) => {
            run_window(state, registry, library, &mut top, Timing::AfterClash);
            top.is_hit = top.kind == CardKind::Attack;
            run_use_phase(state, registry, library, &mut top);
            run_window(state, registry, library, &mut top, Timing::Always);
            teardown(state, tier, top);
            teardown(state, tier, beneath);
            return;
        }
        (false, false) => {}
    }

    match (top.kind, beneath.kind) {
        (CardKind::Attack, CardKind::Attack) => {
            let top_power = effective_power(state, registry, &top);
            let beneath_power = effective_power(state, registry, &beneath);

            run_window(state, registry, library, &mut top, Timing::AfterClash);
            run_window(state, registry, library, &mut beneath, Timing::AfterClash);

            if top_power > beneath_power {
                beneath.cancelled_before_use = true;
                state.log.push(format!(
                    "{} overpowers {}",
                    top.card_name, beneath.card_name
                ));
                top.is_hit = true;
                run_use_phase(state, registry, library, &mut top);
            } else if beneath_power > top_power {
                top.cancelled_before_use = true;
                state.log.push(format!(
                    "{} overpowers {}",
                    beneath.card_name, top.card_name
                ));
                beneath.is_hit = true;
                run_use_phase(state, registry, library, &mut beneath);
            } else {
                top.cancelled_before_use = true;
                beneath.cancelled_before_use = true;
                state.log.push(format!(
                    "{} and {} clash and are both cancelled",
                    top.card_name, beneath.card_name
                ));
            }

            // `always` fires even for the cancelled side(s).
            run_window(state, registry, library, &mut top, Timing::Always);
            run_window(state, registry, library, &mut beneath, Timing::Always);
        }

        (CardKind::Attack, CardKind::Defense) | (CardKind::Defense, CardKind::Attack) => {
            run_window(state, registry, library, &mut top, Timing::AfterClash);
            run_window(state, registry, library, &mut beneath, Timing::AfterClash);

            let (mut attack, mut defense) = if top.kind == CardKind::Attack {
                (top, beneath)
            } else {
                (beneath, top)
            };

            // The defender's use effects resolve first: its shield and
            // mitigation apply before the attack's damage.
            defense.is_hit = false;
            run_use_phase(state, registry, library, &mut defense);

            attack.is_hit = true;
            resolve_redirect(state, registry, &mut attack);
            let mut to_defender = 0;
            let report = run_window(state, registry, library, &mut attack, Timing::BeforeUse);
            to_defender += report.lost_by(defense.actor);
            let report = run_window(state, registry, library, &mut attack, Timing::OnUse);
            to_defender += report.lost_by(defense.actor);

            if attack.targets.contains(&defense.actor) && to_defender == 0 {
                if defense.keywords.evade {
                    attack.is_hit = false;
                    defense.reusable = true;
                    let name = state
                        .character(defense.actor)
                        .map(|c| c.name.clone())
                        .unwrap_or_default();
                    state
                        .log
                        .push(format!("{name} evades {}", attack.card_name));
                } else if defense.keywords.counter {
                    state.counter_window = Some(CounterWindow {
                        team: defense.team,
                        must_target: attack.actor,
                    });
                    let name = state
                        .character(defense.actor)
                        .map(|c| c.name.clone())
                        .unwrap_or_default();
                    state
                        .log
                        .push(format!("{name} may counter {}", attack.card_name));
                }
            }

            if attack.is_hit {
                run_window(state, registry, library, &mut attack, Timing::OnHit);
            }
            run_window(state, registry, library, &mut attack, Timing::AfterUse);

            run_window(state, registry, library, &mut attack, Timing::Always);
            run_window(state, registry, library, &mut defense, Timing::Always);

            teardown(state, tier, attack);
            teardown(state, tier, defense);
            return;
        }

        (CardKind::Defense, CardKind::Defense) => {
            run_window(state, registry, library, &mut top, Timing::AfterClash);
            run_window(state, registry, library, &mut beneath, Timing::AfterClash);

            top.is_hit = false;
            beneath.is_hit = false;
            run_use_phase(state, registry, library, &mut top);
            run_use_phase(state, registry, library, &mut beneath);
            run_window(state, registry, library, &mut top, Timing::Always);
            run_window(state, registry, library, &mut beneath, Timing::Always);
        }

        // Mismatched combos (a skill on either side) resolve both
        // independently.
        _ => {
            run_window(state, registry, library, &mut top, Timing::AfterClash);
            run_window(state, registry, library, &mut beneath, Timing::AfterClash);

            top.is_hit = top.kind == CardKind::Attack;
            run_use_phase(state, registry, library, &mut top);
            run_window(state, registry, library, &mut top, Timing::Always);

            beneath.is_hit = beneath.kind == CardKind::Attack;
            run_use_phase(state, registry, library, &mut beneath);
            run_window(state, registry, library, &mut beneath, Timing::Always);
        }
    }

    teardown(state, tier, top);
    teardown(state, tier, beneath);
}

/// Move a resolved entry's card out of the zone: reuse survivors are
/// retained, everything else goes to discard (or the terminal pile when
/// its owner fell during resolution).
fn teardown(state: &mut MatchState, tier: SpeedTier, entry: StackEntry) {
    if (entry.reusable || entry.keywords.reuse) && !entry.negated {
        state.zones.zone_mut(tier).retained.push(entry);
        return;
    }

    let actor_defeated = state
        .character(entry.actor)
        .map(|c| c.defeated)
        .unwrap_or(true);
    let team = state.team_mut(entry.team);
    if team.removed.contains(&entry.card) {
        return;
    }
    if actor_defeated {
        team.removed.push(entry.card);
    } else {
        team.discard.push(entry.card);
    }
}
