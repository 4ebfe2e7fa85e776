//! Turn lifecycle controller.
//!
//! Drives the `movement → combat → (movement | finished)` loop: turn
//! start upkeep (flags, deferred gains, boosts, draws, prepare/stagnate,
//! stun skips), and turn end (decay, shield zeroing, hand cleanup, turn
//! advance).

use crate::core::state::{MatchState, Phase, PileId};
use crate::core::TeamId;
use crate::status::{engine as status_engine, names, StatusRegistry};

/// Energy granted to each team at turn start.
pub const ENERGY_REGEN: i32 = 3;
/// Energy never accumulates past this.
pub const ENERGY_CAP: i32 = 10;
/// Bounded stun-skip retry, guarding against livelock.
pub const MAX_STUN_SKIPS: u8 = 3;

/// The team that acts first this turn (alternates by turn parity).
#[must_use]
pub fn active_team(turn: u32) -> TeamId {
    if turn % 2 == 1 {
        TeamId::A
    } else {
        TeamId::B
    }
}

/// Advance to the next turn and run turn-start upkeep for both teams.
///
/// If the active team's turn starter is stunned, the stun expires and the
/// whole turn is skipped straight to turn-end effects — at most
/// [`MAX_STUN_SKIPS`] consecutive times.
pub fn start_turn(state: &mut MatchState, registry: &StatusRegistry) {
    loop {
        if state.is_finished() {
            return;
        }

        state.turn += 1;
        state.phase = Phase::Movement;
        state.round_pass_count = 0;
        state.play_locked = [false, false];
        state.counter_window = None;

        let active = active_team(state.turn);
        state.priority = active;
        state
            .log
            .push(format!("turn {} begins", state.turn));

        for team_id in TeamId::both() {
            upkeep_team(state, registry, team_id);
        }

        // Stun check on the active team's turn starter.
        let stunned_starter = state
            .team(active)
            .turn_starter()
            .filter(|ch| ch.has_active(registry, names::STUN))
            .map(|ch| ch.id);

        match stunned_starter {
            Some(starter) if state.stun_skips < MAX_STUN_SKIPS => {
                state.stun_skips += 1;
                let mut log = std::mem::take(&mut state.log);
                if let Some(ch) = state.character_mut(starter) {
                    status_engine::expire_now(registry, ch, names::STUN, &mut log);
                    log.push(format!("{} is stunned; the turn is skipped", ch.name));
                }
                state.log = log;

                run_turn_end_effects(state, registry);
                if state.is_finished() {
                    return;
                }
                // Loop: next turn starts immediately, no action window.
            }
            _ => {
                state.stun_skips = 0;
                return;
            }
        }
    }
}

/// Per-team turn-start upkeep.
fn upkeep_team(state: &mut MatchState, registry: &StatusRegistry, team_id: TeamId) {
    // Per-character upkeep: flags, deferred gains, turn-start boosts.
    let member_ids: Vec<_> = state
        .team(team_id)
        .members
        .iter()
        .filter(|m| m.is_alive())
        .map(|m| m.id)
        .collect();

    for id in &member_ids {
        let mut log = std::mem::take(&mut state.log);
        if let Some(ch) = state.character_mut(*id) {
            ch.reset_turn_flags();
            status_engine::apply_deferred(registry, ch, &mut log);
            status_engine::turn_start_boosts(registry, ch, &mut log);
        }
        state.log = log;
    }

    // Energy and draws.
    {
        let team = state.team_mut(team_id);
        team.energy = (team.energy + ENERGY_REGEN).min(ENERGY_CAP);
        let hand_target = team.max_hand + team.draw_bonus as usize;
        while team.hand.len() < hand_target {
            if team.draw().is_none() {
                break;
            }
        }
        team.draw_bonus = 0;
    }

    // Prepare/Stagnate: adjust hand card costs, then consume the status.
    for id in member_ids {
        for (status, sign) in [(names::PREPARE, -1), (names::STAGNATE, 1)] {
            let potency = state
                .character(id)
                .filter(|ch| ch.has_active(registry, status))
                .and_then(|ch| ch.status(status))
                .map(|s| s.potency)
                .unwrap_or(0);
            if potency == 0 {
                continue;
            }

            let team = state.team_mut(team_id);
            let hand = team.hand.clone();
            for card_id in hand {
                if let Some(card) = team.card_mut(card_id) {
                    card.adjust_cost(sign * potency);
                }
            }
            if let Some(ch) = state.character_mut(id) {
                ch.statuses.remove(status);
            }
        }
    }

    state.sweep_defeated();
}

/// End the combat round: turn-end effects for both teams, then the next
/// turn begins.
pub fn end_turn(state: &mut MatchState, registry: &StatusRegistry) {
    run_turn_end_effects(state, registry);
    if !state.is_finished() {
        start_turn(state, registry);
    }
}

/// Turn-end effects only (status decay, shield zeroing, hand cleanup)
/// without advancing into the next turn.
fn run_turn_end_effects(state: &mut MatchState, registry: &StatusRegistry) {
    for team_id in TeamId::both() {
        let member_ids: Vec<_> = state
            .team(team_id)
            .members
            .iter()
            .filter(|m| m.is_alive())
            .map(|m| m.id)
            .collect();

        for id in member_ids {
            let mut log = std::mem::take(&mut state.log);
            if let Some(ch) = state.character_mut(id) {
                status_engine::turn_end_decay(registry, ch, &mut log);
                ch.shield = 0;
            }
            state.log = log;
        }

        // Hand cleanup: discard oldest cards above the hand limit.
        let team = state.team_mut(team_id);
        while team.hand.len() > team.max_hand {
            let card = team.hand.remove(0);
            team.put_in_pile(card, PileId::Discard);
        }
    }

    state.counter_window = None;
    state.sweep_defeated();
}
