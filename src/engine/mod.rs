//! Match engine: the single action-application entry point.
//!
//! `MatchEngine::apply_action` is copy-on-write: it clones the given
//! state, attempts the action on the clone, and returns a new snapshot.
//! A rejected action returns the previous state unchanged — plus the
//! attempt recorded in the transcript — with a human-readable reason,
//! never a panic. Construction is the only fail-fast path.

pub mod setup;

use std::sync::Arc;

use crate::cards::{
    effect_list, CardInstance, CardLibrary, CostSpec, EffectLineAdapter, NullAdapter, PowerSpec,
    Restriction,
};
use crate::combat::{resolve_zone, StackEntry};
use crate::core::state::{Character, CounterWindow, MatchState, Phase};
use crate::core::{Action, CardInstanceId, CardRef, CharacterId, PlayCard, TeamId};
use crate::effects::{run_window, Effect, Predicate, TimedEffect, Timing};
use crate::error::{ReplayError, SetupError};
use crate::status::{derived, names, StatusField, StatusRegistry};
use crate::targeting::{expand_targets, legal_targets};
use crate::transcript::{Transcript, TRANSCRIPT_VERSION};
use crate::turn;

pub use setup::{CharacterSpec, MatchSetup, TeamSetup};

/// Result of applying one action.
#[derive(Clone, Debug)]
pub struct ActionOutcome {
    /// The new state snapshot (identical to the input state, plus the
    /// transcript entry, when the action was rejected).
    pub state: MatchState,
    /// Rejection reason, if the action was illegal.
    pub error: Option<String>,
}

impl ActionOutcome {
    /// Was the action accepted?
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.error.is_none()
    }
}

/// The match simulation engine. Holds the read-only ruleset (card
/// library, status registry, text adapter); all mutable state lives in
/// [`MatchState`] snapshots.
pub struct MatchEngine {
    library: CardLibrary,
    registry: StatusRegistry,
    adapter: Arc<dyn EffectLineAdapter>,
}

impl std::fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEngine").finish_non_exhaustive()
    }
}

impl MatchEngine {
    /// Build an engine and the initial state for a match.
    pub fn new(library: CardLibrary, setup: MatchSetup) -> Result<(Self, MatchState), SetupError> {
        Self::with_adapter(library, setup, Arc::new(NullAdapter))
    }

    /// Build with a custom free-text effect adapter.
    pub fn with_adapter(
        library: CardLibrary,
        setup: MatchSetup,
        adapter: Arc<dyn EffectLineAdapter>,
    ) -> Result<(Self, MatchState), SetupError> {
        let mut registry = StatusRegistry::standard();

        // Fail-fast validation.
        for (index, team) in setup.teams.iter().enumerate() {
            if team.characters.is_empty() {
                return Err(SetupError::EmptyRoster(index));
            }
            if team.characters.len() > setup.line_size {
                return Err(SetupError::RosterTooLarge {
                    team: index,
                    size: team.characters.len(),
                    max: setup.line_size,
                });
            }
            for (i, spec) in team.characters.iter().enumerate() {
                if team.characters[..i].iter().any(|c| c.name == spec.name) {
                    return Err(SetupError::DuplicateMember {
                        team: index,
                        name: spec.name.clone(),
                    });
                }
                if spec.cards.is_empty() {
                    return Err(SetupError::EmptyCardPool(spec.name.clone()));
                }
                for card in &spec.cards {
                    if library.get(*card).is_none() {
                        return Err(SetupError::UnknownCard(card.to_string()));
                    }
                }
            }
        }

        let player_names = [setup.teams[0].name.clone(), setup.teams[1].name.clone()];
        let mut state = MatchState::new(setup.seed, player_names);

        let mut next_character = 0u32;
        for (index, team_setup) in setup.teams.iter().enumerate() {
            let team_id = TeamId(index as u8);
            state.teams[index].name = team_setup.name.clone();
            state.teams[index].max_hand = setup.max_hand;

            for (position, spec) in team_setup.characters.iter().enumerate() {
                let id = CharacterId::new(next_character);
                next_character += 1;

                let mut ch = Character::new(id, spec.name.clone(), position);
                ch.max_hp = spec.max_hp;
                ch.hp = spec.max_hp;
                ch.innate_rules = spec.innate_rules.clone();
                state.teams[index].members.push(ch);

                for def in &spec.unique_statuses {
                    registry.register(def.clone());
                }

                for &card_def in &spec.cards {
                    let card_id = state.alloc_card_id();
                    state.teams[team_id.index()]
                        .cards
                        .insert(card_id, CardInstance::new(card_id, card_def, id));
                    state.teams[team_id.index()].deck.push(card_id);
                }
            }
        }

        for index in 0..2 {
            let mut deck = std::mem::take(&mut state.teams[index].deck);
            state.rng.shuffle(&mut deck);
            state.teams[index].deck = deck;
        }

        turn::start_turn(&mut state, &registry);

        Ok((
            Self {
                library,
                registry,
                adapter,
            },
            state,
        ))
    }

    /// The engine's status registry (standard + character-unique defs).
    #[must_use]
    pub fn registry(&self) -> &StatusRegistry {
        &self.registry
    }

    /// The engine's card library.
    #[must_use]
    pub fn library(&self) -> &CardLibrary {
        &self.library
    }

    /// Apply one action to a state snapshot.
    ///
    /// Always records the attempt in the returned state's transcript,
    /// rejected or not.
    #[must_use]
    pub fn apply_action(&self, state: &MatchState, action: &Action) -> ActionOutcome {
        let mut next = state.clone();
        match self.execute(&mut next, action) {
            Ok(()) => {
                next.transcript.record(action.clone(), None);
                ActionOutcome {
                    state: next,
                    error: None,
                }
            }
            Err(reason) => {
                let mut unchanged = state.clone();
                unchanged.transcript.record(action.clone(), Some(reason.clone()));
                ActionOutcome {
                    state: unchanged,
                    error: Some(reason),
                }
            }
        }
    }

    /// Rebuild a fresh match from a transcript's seed and re-apply every
    /// recorded action, asserting that each step's outcome matches.
    pub fn replay_transcript(
        &self,
        mut setup: MatchSetup,
        transcript: &Transcript,
    ) -> Result<MatchState, ReplayError> {
        if transcript.version != TRANSCRIPT_VERSION {
            return Err(ReplayError::UnsupportedVersion(transcript.version));
        }

        setup.seed = transcript.seed;
        let (engine, mut state) =
            Self::with_adapter(self.library.clone(), setup, self.adapter.clone())?;

        for (index, record) in transcript.actions.iter().enumerate() {
            let outcome = engine.apply_action(&state, &record.action);
            if outcome.error != record.error {
                return Err(ReplayError::Divergence {
                    index,
                    expected: record.error.clone(),
                    actual: outcome.error,
                });
            }
            state = outcome.state;
        }

        Ok(state)
    }

    // === Action execution ===

    fn execute(&self, state: &mut MatchState, action: &Action) -> Result<(), String> {
        if state.is_finished() {
            return Err("the match is finished".to_string());
        }

        // The combat log is player-facing; clearing it consumes nothing.
        if let Action::ClearLog { .. } = action {
            state.log.clear();
            return Ok(());
        }

        // A counter window is valid only for the immediately following
        // action; taking it here consumes it on any accepted action.
        let window = state.counter_window.take();

        match action {
            Action::Play(play) => self.execute_play(state, play, window),
            Action::MoveSwap {
                team,
                first,
                second,
            } => self.execute_move_swap(state, *team, *first, *second),
            Action::Pass { team } => self.execute_pass(state, *team),
            Action::EndTurn { team } => self.execute_end_turn(state, *team),
            Action::ClearLog { .. } => unreachable!("handled above"),
        }
    }

    fn execute_play(
        &self,
        state: &mut MatchState,
        play: &PlayCard,
        window: Option<CounterWindow>,
    ) -> Result<(), String> {
        let team_id = play.team;
        let countering = window.as_ref().is_some_and(|w| w.team == team_id);

        if state.phase != Phase::Combat {
            return Err("cards can only be played in the combat round".to_string());
        }
        if !countering && state.priority != team_id {
            return Err("not your priority".to_string());
        }
        if state.play_locked[team_id.index()] {
            return Err("your team is locked out of playing this round".to_string());
        }

        let card_id = self.resolve_card_ref(state, team_id, play.card)?;
        let instance = state
            .team(team_id)
            .card(card_id)
            .cloned()
            .ok_or_else(|| "unknown card instance".to_string())?;
        let mut def = self
            .library
            .get(instance.def)
            .cloned()
            .ok_or_else(|| "unknown card definition".to_string())?;

        let actor = instance.owner;
        let actor_alive = state.character(actor).is_some_and(Character::is_alive);
        if !actor_alive {
            return Err("the card's owner is defeated".to_string());
        }

        // Restrictions: require/forbid status gates.
        for restriction in &def.restrictions {
            match restriction {
                Restriction::Require { status } => {
                    if !state
                        .character(actor)
                        .is_some_and(|ch| ch.has_active(&self.registry, status))
                    {
                        return Err(format!("requires {status}"));
                    }
                }
                Restriction::Forbid { status } => {
                    if state
                        .character(actor)
                        .is_some_and(|ch| ch.has_active(&self.registry, status))
                    {
                        return Err(format!("cannot be played while {status} is active"));
                    }
                }
            }
        }

        // Conditional card substitution.
        for transform in def.transforms.clone() {
            if self.predicate_live(state, actor, play.target, &transform.when) {
                def = self
                    .library
                    .get(transform.into)
                    .cloned()
                    .ok_or_else(|| "unknown transform target".to_string())?;
                break;
            }
        }

        let effects = effect_list(&def, self.adapter.as_ref());

        // Cost.
        let cost_delta = state
            .character(actor)
            .map(|ch| derived::energy_cost_delta(&self.registry, ch))
            .unwrap_or(0);
        let cost = match def.cost {
            CostSpec::Fixed(c) => c + instance.cost_adjustment + cost_delta,
            CostSpec::X => {
                let x = play.x_value.ok_or_else(|| "an X value is required".to_string())?;
                if x < 0 {
                    return Err("the X value cannot be negative".to_string());
                }
                x + instance.cost_adjustment + cost_delta
            }
        }
        .max(0);
        if state.team(team_id).energy < cost {
            return Err("not enough energy".to_string());
        }

        // Zone legality: the zone must match or be faster than the
        // card's effective speed.
        let shift = state
            .character(actor)
            .map(|ch| derived::speed_shift(&self.registry, ch))
            .unwrap_or(0);
        let effective_speed = def.speed.shifted(shift);
        if play.zone.index() < effective_speed.index() {
            return Err(format!(
                "the {} zone is too slow for this card",
                play.zone
            ));
        }

        // Choice requirement.
        if let Some(option_count) = first_choose_arity(&effects) {
            let Some(index) = play.choice_index else {
                return Err("this card requires a choice".to_string());
            };
            if index >= option_count {
                return Err("choice index out of range".to_string());
            }
        }

        // Target legality (taunt override included).
        let base_target = if def.target.is_single_target() {
            let Some(target) = play.target else {
                return Err("this card requires a target".to_string());
            };
            let legal = legal_targets(state, &self.registry, actor, team_id, def.target);
            if !legal.contains(&target) {
                return Err("illegal target".to_string());
            }
            Some(target)
        } else {
            None
        };

        if countering {
            let must_target = window.expect("counter window").must_target;
            if base_target != Some(must_target) {
                return Err("a counter must target the original attacker".to_string());
            }
        }

        // All checks passed; mutate the clone.
        state.team_mut(team_id).energy -= cost;
        state.team_mut(team_id).take_from_piles(card_id);

        let power = match def.power {
            PowerSpec::None => 0,
            PowerSpec::Fixed(n) => n,
            PowerSpec::Range(lo, hi) => state.rng.roll_inclusive(lo, hi),
        };

        let targets = expand_targets(state, actor, team_id, def.target, &def.keywords, base_target);

        let interrupted = state.zones.admit(play.zone)?;
        if interrupted {
            state
                .log
                .push(format!("the {} zone interrupts", play.zone));
        }

        let actor_name = state
            .character(actor)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        state.log.push(format!(
            "{actor_name} plays {} into the {} zone",
            def.name, play.zone
        ));

        let mut entry = StackEntry {
            card: card_id,
            def: def.id,
            card_name: def.name.clone(),
            kind: def.kind,
            tags: def.tags.clone(),
            target_spec: def.target,
            keywords: def.keywords.clone(),
            effects,
            team: team_id,
            actor,
            targets,
            base_target,
            power,
            x_value: play.x_value.unwrap_or(0),
            choice_index: play.choice_index,
            redirect_choice: play.redirect_target,
            push_direction: play.push_direction,
            scry_discards: play.scry_discards.clone(),
            scry_order: play.scry_order.clone(),
            seek_takes: play.seek_takes.clone(),
            search_pick: play.search_pick,
            negated: false,
            redirected: false,
            cancelled_before_use: false,
            is_hit: false,
            reusable: false,
        };

        run_window(state, &self.registry, &self.library, &mut entry, Timing::OnPlay);
        state.zones.zone_mut(play.zone).push(entry);
        state.sweep_defeated();

        state.round_pass_count = 0;
        state.priority = team_id.opponent();
        Ok(())
    }

    fn execute_move_swap(
        &self,
        state: &mut MatchState,
        team_id: TeamId,
        first: CharacterId,
        second: CharacterId,
    ) -> Result<(), String> {
        if state.phase != Phase::Movement {
            return Err("swaps are only legal in the movement round".to_string());
        }
        if state.priority != team_id {
            return Err("not your priority".to_string());
        }
        if state.team(team_id).energy < 1 {
            return Err("not enough energy".to_string());
        }

        for id in [first, second] {
            let member = state
                .team(team_id)
                .member(id)
                .ok_or_else(|| "swap members must be on your team".to_string())?;
            if !member.is_alive() {
                return Err("cannot swap a defeated ally".to_string());
            }
            if member.has_active(&self.registry, names::ROOT) {
                return Err(format!("{} is rooted", member.name));
            }
        }

        let pos_a = state.team(team_id).member(first).map(|c| c.position).unwrap();
        let pos_b = state
            .team(team_id)
            .member(second)
            .map(|c| c.position)
            .unwrap();
        if pos_a.abs_diff(pos_b) != 1 {
            return Err("swap members must be adjacent".to_string());
        }

        state.team_mut(team_id).member_mut(first).unwrap().position = pos_b;
        state.team_mut(team_id).member_mut(second).unwrap().position = pos_a;
        state.team_mut(team_id).energy -= 1;

        let labels: Vec<String> = [first, second]
            .iter()
            .filter_map(|id| state.character(*id).map(|c| c.name.clone()))
            .collect();
        state
            .log
            .push(format!("{} swaps with {}", labels[0], labels[1]));

        // Any successful swap resets the pass counter.
        state.round_pass_count = 0;
        state.priority = team_id.opponent();
        Ok(())
    }

    fn execute_pass(&self, state: &mut MatchState, team_id: TeamId) -> Result<(), String> {
        if state.priority != team_id {
            return Err("not your priority".to_string());
        }

        match state.phase {
            Phase::Movement => {
                state.round_pass_count += 1;
                if state.round_pass_count >= 2 {
                    state.phase = Phase::Combat;
                    state.round_pass_count = 0;
                    state.priority = turn::active_team(state.turn);
                    state.log.push("the movement round ends");
                } else {
                    state.priority = team_id.opponent();
                }
                Ok(())
            }
            Phase::Combat => {
                if let Some(tier) = state.zones.active {
                    let should_resolve = state.zones.zone_mut(tier).record_pass(team_id);
                    if should_resolve {
                        resolve_zone(state, &self.registry, &self.library, tier);
                        state.round_pass_count = 0;
                    }
                    if !state.is_finished() {
                        state.priority = team_id.opponent();
                    }
                    Ok(())
                } else {
                    state.round_pass_count += 1;
                    if state.round_pass_count >= 2 {
                        turn::end_turn(state, &self.registry);
                    } else {
                        state.priority = team_id.opponent();
                    }
                    Ok(())
                }
            }
            Phase::Finished => Err("the match is finished".to_string()),
        }
    }

    fn execute_end_turn(&self, state: &mut MatchState, team_id: TeamId) -> Result<(), String> {
        if state.phase != Phase::Combat {
            return Err("the turn can only be ended in the combat round".to_string());
        }
        if state.priority != team_id {
            return Err("not your priority".to_string());
        }
        if state.zones.active.is_some() {
            return Err("cannot end the turn while a zone is active".to_string());
        }

        turn::end_turn(state, &self.registry);
        Ok(())
    }

    // === Helpers ===

    fn resolve_card_ref(
        &self,
        state: &MatchState,
        team_id: TeamId,
        card: CardRef,
    ) -> Result<CardInstanceId, String> {
        match card {
            CardRef::Id(id) => {
                if state.team(team_id).hand.contains(&id) {
                    Ok(id)
                } else {
                    Err("that card is not in your hand".to_string())
                }
            }
            CardRef::Slot(slot) => state
                .team(team_id)
                .hand
                .get(slot)
                .copied()
                .ok_or_else(|| "no card in that hand slot".to_string()),
        }
    }

    /// Predicate evaluation against live state (play-time transforms and
    /// restrictions, as opposed to window-snapshot evaluation).
    fn predicate_live(
        &self,
        state: &MatchState,
        actor: CharacterId,
        target: Option<CharacterId>,
        predicate: &Predicate,
    ) -> bool {
        let field_of = |id: CharacterId, name: &str, field: StatusField| -> i32 {
            state
                .character(id)
                .and_then(|ch| ch.status(name))
                .map(|s| s.get(field))
                .unwrap_or(0)
        };

        match predicate {
            Predicate::SelfStatusAtLeast { name, field, min } => {
                field_of(actor, name, *field) >= *min
            }
            Predicate::TargetStatusAtLeast { name, field, min } => {
                target.is_some_and(|t| field_of(t, name, *field) >= *min)
            }
            Predicate::SelfHpBelowPercent(pct) => state
                .character(actor)
                .is_some_and(|ch| ch.hp * 100 < pct * ch.max_hp),
            Predicate::TargetShieldBroken => target
                .and_then(|t| state.character(t))
                .is_some_and(|ch| ch.shield == 0),
        }
    }
}

/// Arity of the first `Choose` effect in a card's list, if any: the play
/// action must carry a choice index within it.
fn first_choose_arity(effects: &[TimedEffect]) -> Option<usize> {
    fn walk(effect: &Effect) -> Option<usize> {
        match effect {
            Effect::Choose { options } => Some(options.len()),
            Effect::If { then, .. } => then.iter().find_map(walk),
            _ => None,
        }
    }
    effects.iter().find_map(|t| walk(&t.effect))
}
