//! Legal-target computation, target expansion, and redirect resolution.
//!
//! Three distinct steps with different timing:
//! 1. `legal_targets` at play validation (taunt override included)
//! 2. `expand_targets` at play time (AoE, splash, bounce — bounce draws
//!    from the match RNG)
//! 3. `resolve_redirect` once per resolution, before `on_use` (cover
//!    interception and explicit redirect)
//!
//! AoE and bounce-selected targets are never redirected; redirect swaps
//! only the originally chosen single target.

use crate::cards::definition::{Keywords, TargetSpec};
use crate::combat::StackEntry;
use crate::core::state::MatchState;
use crate::core::{CharacterId, TeamId};
use crate::status::{engine as status_engine, names, StatusField, StatusRegistry};

/// Legal explicit targets for a card, taunt override applied.
///
/// Returns an empty list for specs that take no explicit target.
#[must_use]
pub fn legal_targets(
    state: &MatchState,
    registry: &StatusRegistry,
    actor: CharacterId,
    team: TeamId,
    spec: TargetSpec,
) -> Vec<CharacterId> {
    match spec {
        TargetSpec::Enemy => {
            let enemies: Vec<CharacterId> = state
                .team(team.opponent())
                .living()
                .map(|c| c.id)
                .collect();

            // Taunt forces strictly single-target cards onto taunters.
            let taunted: Vec<CharacterId> = enemies
                .iter()
                .copied()
                .filter(|&id| {
                    state
                        .character(id)
                        .is_some_and(|c| c.has_active(registry, names::TAUNT))
                })
                .collect();

            if taunted.is_empty() {
                enemies
            } else {
                taunted
            }
        }
        TargetSpec::Ally => state
            .team(team)
            .living()
            .map(|c| c.id)
            .filter(|&id| id != actor)
            .collect(),
        TargetSpec::Self_ | TargetSpec::None | TargetSpec::AllEnemies | TargetSpec::AllAllies => {
            Vec::new()
        }
    }
}

/// Living allies adjacent to a character on their own line.
fn adjacent_allies(state: &MatchState, of: CharacterId) -> Vec<CharacterId> {
    let Some(team_id) = state.team_of(of) else {
        return Vec::new();
    };
    let Some(ch) = state.character(of) else {
        return Vec::new();
    };

    let team = state.team(team_id);
    let mut out = Vec::new();
    if ch.position > 0 {
        if let Some(n) = team.member_at(ch.position - 1) {
            out.push(n.id);
        }
    }
    if let Some(n) = team.member_at(ch.position + 1) {
        out.push(n.id);
    }
    out
}

/// Expand the chosen base target per the card's spec and keywords.
///
/// Bounce count defaults to 1 and draws its extra adjacent targets from
/// the match RNG.
pub fn expand_targets(
    state: &mut MatchState,
    actor: CharacterId,
    team: TeamId,
    spec: TargetSpec,
    keywords: &Keywords,
    base: Option<CharacterId>,
) -> Vec<CharacterId> {
    match spec {
        TargetSpec::Self_ => vec![actor],
        TargetSpec::None => Vec::new(),
        TargetSpec::AllEnemies => state
            .team(team.opponent())
            .living()
            .map(|c| c.id)
            .collect(),
        TargetSpec::AllAllies => state.team(team).living().map(|c| c.id).collect(),
        TargetSpec::Enemy | TargetSpec::Ally => {
            let Some(base) = base else {
                return Vec::new();
            };
            let mut targets = vec![base];

            if keywords.splash {
                for id in adjacent_allies(state, base) {
                    if !targets.contains(&id) {
                        targets.push(id);
                    }
                }
            }

            if let Some(bounces) = keywords.bounce {
                let bounces = bounces.max(1);
                let mut pool: Vec<CharacterId> = adjacent_allies(state, base)
                    .into_iter()
                    .filter(|id| !targets.contains(id))
                    .collect();
                for _ in 0..bounces {
                    if pool.is_empty() {
                        break;
                    }
                    let idx = state.rng.gen_range_usize(0..pool.len());
                    targets.push(pool.remove(idx));
                }
            }

            targets
        }
    }
}

/// Run redirect resolution for an entry, once, before its use phase.
///
/// Cover-bearing allies of the original target and explicit redirect
/// keywords both produce candidates; candidates are deterministically
/// ordered by (position, id) and the first — or the player's explicit
/// choice among them — is selected. Cover consumes one point and logs
/// the interception.
pub fn resolve_redirect(
    state: &mut MatchState,
    registry: &StatusRegistry,
    entry: &mut StackEntry,
) {
    if entry.redirected {
        return;
    }
    // Only strictly single-target effects redirect; bounce adds random
    // targets, which also disqualifies the entry.
    if !entry.target_spec.is_single_target() || entry.keywords.bounce.is_some() {
        return;
    }
    let Some(base) = entry.base_target else {
        return;
    };
    let Some(target_team) = state.team_of(base) else {
        return;
    };

    // Candidates: cover bearers first-class, explicit redirect opens the
    // whole team.
    let mut candidates: Vec<(usize, CharacterId, bool)> = Vec::new();
    for ch in state.team(target_team).living() {
        if ch.id == base {
            continue;
        }
        let covers = ch.has_active(registry, names::COVER);
        if covers || entry.keywords.redirect {
            candidates.push((ch.position, ch.id, covers));
        }
    }
    if candidates.is_empty() {
        return;
    }
    candidates.sort_by_key(|&(position, id, _)| (position, id));

    let chosen = entry
        .redirect_choice
        .and_then(|pick| candidates.iter().find(|&&(_, id, _)| id == pick).copied())
        .unwrap_or(candidates[0]);
    let (_, new_target, via_cover) = chosen;

    if via_cover {
        let mut log = std::mem::take(&mut state.log);
        if let Some(ch) = state.character_mut(new_target) {
            status_engine::reduce(
                registry,
                ch,
                names::COVER,
                StatusField::Value,
                1,
                0,
                &mut log,
            );
        }
        state.log = log;
    }

    let base_name = state
        .character(base)
        .map(|c| c.name.clone())
        .unwrap_or_default();
    let new_name = state
        .character(new_target)
        .map(|c| c.name.clone())
        .unwrap_or_default();
    state.log.push(format!(
        "{new_name} intercepts {} aimed at {base_name}",
        entry.card_name
    ));

    for t in &mut entry.targets {
        if *t == base {
            *t = new_target;
        }
    }
    entry.redirected = true;
}
