//! Determinism & replay tests.
//!
//! The transcript is the correctness oracle: rebuilding a match from the
//! recorded seed and re-applying every attempted action (including the
//! rejected ones) must reproduce the exact final state, and any
//! divergence must be surfaced with the offending action index.

use proptest::prelude::*;

use zone_clash::{
    Action, CardDefId, CardDefinition, CardKind, CardLibrary, CardRef, CharacterId,
    CharacterSpec, Effect, MatchEngine, MatchSetup, MatchState, PlayCard, PowerSpec, ReplayError,
    SpeedTier, TargetSpec, TeamId, TeamSetup, TimedEffect, TypeTag,
};

// =============================================================================
// Fixtures
// =============================================================================

const SLASH: CardDefId = CardDefId(1);
const GUARD: CardDefId = CardDefId(2);
const BOLT: CardDefId = CardDefId(3);

fn library() -> CardLibrary {
    let mut lib = CardLibrary::new();
    lib.add(
        CardDefinition::new(SLASH, "Slash", CardKind::Attack)
            .with_power(PowerSpec::Range(8, 12))
            .with_tags([TypeTag::Physical])
            .with_effects(vec![TimedEffect::on_use(Effect::power_damage())]),
    );
    lib.add(
        CardDefinition::new(GUARD, "Guard", CardKind::Defense)
            .with_effects(vec![TimedEffect::on_use(Effect::Shield { amount: 5 })]),
    );
    lib.add(
        CardDefinition::new(BOLT, "Bolt", CardKind::Attack)
            .with_power(PowerSpec::Fixed(6))
            .with_speed(SpeedTier::Fast)
            .with_target(TargetSpec::Enemy)
            .with_tags([TypeTag::Lightning])
            .with_effects(vec![
                TimedEffect::on_use(Effect::power_damage()),
                TimedEffect::on_use(Effect::inflict("vulnerable", 1)),
            ]),
    );
    lib
}

fn match_setup(seed: u64) -> MatchSetup {
    MatchSetup::new(
        seed,
        TeamSetup::new(
            "Ada",
            vec![
                CharacterSpec::new("Kael", vec![SLASH, BOLT]),
                CharacterSpec::new("Mira", vec![GUARD, SLASH]),
            ],
        ),
        TeamSetup::new(
            "Brin",
            vec![
                CharacterSpec::new("Thorn", vec![SLASH, GUARD]),
                CharacterSpec::new("Vex", vec![BOLT, SLASH]),
            ],
        ),
    )
}

fn build(seed: u64) -> (MatchEngine, MatchState) {
    MatchEngine::new(library(), match_setup(seed)).expect("setup")
}

/// A stable fingerprint of everything replay must reproduce: HP, shield,
/// statuses, resources, pile contents (in order), zone contents, and the
/// combat log.
fn fingerprint(state: &MatchState) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = write!(out, "turn={} phase={:?};", state.turn, state.phase);

    for team in &state.teams {
        let _ = write!(
            out,
            "team={} energy={} ult={};",
            team.name, team.energy, team.ultimate
        );
        for member in &team.members {
            let mut statuses: Vec<_> = member
                .statuses
                .iter()
                .map(|(name, s)| format!("{name}:{s:?}"))
                .collect();
            statuses.sort();
            let _ = write!(
                out,
                "{} hp={} shield={} pos={} defeated={} statuses=[{}];",
                member.name,
                member.hp,
                member.shield,
                member.position,
                member.defeated,
                statuses.join(",")
            );
        }
        let _ = write!(
            out,
            "deck={:?} hand={:?} discard={:?} exhausted={:?} removed={:?};",
            team.deck, team.hand, team.discard, team.exhausted, team.removed
        );
    }

    let zone_cards: Vec<_> = state.zones.all_entries().map(|e| e.card).collect();
    let _ = write!(out, "zones={zone_cards:?} active={:?};", state.zones.active);

    for line in state.log.iter() {
        let _ = write!(out, "log={line};");
    }
    out
}

/// Deterministically decode a script byte into an action against the
/// current state. Intentionally produces some illegal actions: rejected
/// attempts are part of the replay contract.
fn decode(byte: u8, state: &MatchState) -> Action {
    let team = state.priority;
    match byte % 5 {
        0 => Action::Pass { team },
        1 => Action::Pass {
            team: team.opponent(),
        },
        2 => {
            let card = state
                .team(team)
                .hand
                .first()
                .copied()
                .map(CardRef::Id)
                .unwrap_or(CardRef::Slot(0));
            let target = state
                .team(team.opponent())
                .living()
                .next()
                .map(|c| c.id)
                .unwrap_or(CharacterId::new(0));
            Action::Play(
                PlayCard::new(team, card, SpeedTier::Fast).with_target(target),
            )
        }
        3 => {
            let allies: Vec<CharacterId> =
                state.team(team).living().map(|c| c.id).collect();
            Action::MoveSwap {
                team,
                first: allies.first().copied().unwrap_or(CharacterId::new(0)),
                second: allies.get(1).copied().unwrap_or(CharacterId::new(0)),
            }
        }
        _ => Action::EndTurn { team },
    }
}

// =============================================================================
// Scripted replay
// =============================================================================

#[test]
fn test_replay_reproduces_scripted_match() {
    let (engine, mut state) = build(42);

    let script = [
        Action::Pass { team: TeamId::A },
        Action::MoveSwap {
            team: TeamId::B,
            first: CharacterId::new(2),
            second: CharacterId::new(3),
        },
        Action::Pass { team: TeamId::A },
        Action::Pass { team: TeamId::B },
        // Combat: an attack with a rolled power range, answered by a guard.
        decode(2, &state),
    ];
    for action in script {
        state = engine.apply_action(&state, &action).state;
    }
    // Continue with state-dependent actions.
    for byte in [2u8, 0, 1, 0, 0, 4] {
        let action = decode(byte, &state);
        state = engine.apply_action(&state, &action).state;
    }

    let replayed = engine
        .replay_transcript(match_setup(0), &state.transcript)
        .expect("replay");

    assert_eq!(fingerprint(&state), fingerprint(&replayed));
}

#[test]
fn test_replay_includes_rejected_attempts() {
    let (engine, state) = build(42);

    // An out-of-turn pass: rejected, recorded.
    let outcome = engine.apply_action(&state, &Action::Pass { team: TeamId::B });
    assert!(outcome.error.is_some());
    let state = outcome.state;

    let outcome = engine.apply_action(&state, &Action::Pass { team: TeamId::A });
    assert!(outcome.error.is_none());
    let state = outcome.state;

    assert_eq!(state.transcript.len(), 2);
    assert!(state.transcript.actions[0].error.is_some());

    let replayed = engine
        .replay_transcript(match_setup(0), &state.transcript)
        .expect("replay");
    assert_eq!(fingerprint(&state), fingerprint(&replayed));
}

#[test]
fn test_tampered_transcript_surfaces_divergence_index() {
    let (engine, mut state) = build(42);

    for action in [
        Action::Pass { team: TeamId::A },
        Action::Pass { team: TeamId::B },
    ] {
        state = engine.apply_action(&state, &action).state;
    }

    // Claim the second (successful) action was rejected.
    let mut transcript = state.transcript.clone();
    let mut record = transcript.actions[1].clone();
    record.error = Some("never happened".to_string());
    transcript.actions.set(1, record);

    let err = engine
        .replay_transcript(match_setup(0), &transcript)
        .unwrap_err();

    match err {
        ReplayError::Divergence {
            index,
            expected,
            actual,
        } => {
            assert_eq!(index, 1);
            assert_eq!(expected.as_deref(), Some("never happened"));
            assert_eq!(actual, None);
        }
        other => panic!("expected divergence, got {other}"),
    }
}

#[test]
fn test_transcript_byte_round_trip_replays() {
    let (engine, mut state) = build(99);

    for byte in [0u8, 0, 2, 0, 0] {
        let action = decode(byte, &state);
        state = engine.apply_action(&state, &action).state;
    }

    let bytes = state.transcript.to_bytes().expect("encode");
    let decoded = zone_clash::Transcript::from_bytes(&bytes).expect("decode");

    let replayed = engine
        .replay_transcript(match_setup(0), &decoded)
        .expect("replay");
    assert_eq!(fingerprint(&state), fingerprint(&replayed));
}

// =============================================================================
// Property: determinism over random scripts and seeds
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// For all seeds and action scripts, replaying the transcript from
    /// the seed reproduces the identical final state and identical
    /// per-step outcomes.
    #[test]
    fn prop_replay_is_exact(
        seed in 0u64..512,
        script in proptest::collection::vec(0u8..=255, 0..40),
    ) {
        let (engine, mut state) = build(seed);

        for byte in script {
            let action = decode(byte, &state);
            state = engine.apply_action(&state, &action).state;
            if state.is_finished() {
                break;
            }
        }

        let replayed = engine
            .replay_transcript(match_setup(0), &state.transcript)
            .expect("replay must not diverge");

        prop_assert_eq!(fingerprint(&state), fingerprint(&replayed));
    }

    /// Pile conservation holds across arbitrary action scripts.
    #[test]
    fn prop_pile_conservation(
        seed in 0u64..512,
        script in proptest::collection::vec(0u8..=255, 0..40),
    ) {
        let (engine, mut state) = build(seed);

        let mut initial: Vec<_> = state
            .teams
            .iter()
            .flat_map(|t| t.pile_card_ids())
            .chain(state.zones.all_entries().map(|e| e.card))
            .collect();
        initial.sort_unstable();

        for byte in script {
            let action = decode(byte, &state);
            state = engine.apply_action(&state, &action).state;

            let mut current: Vec<_> = state
                .teams
                .iter()
                .flat_map(|t| t.pile_card_ids())
                .chain(state.zones.all_entries().map(|e| e.card))
                .collect();
            current.sort_unstable();
            prop_assert_eq!(&current, &initial);

            if state.is_finished() {
                break;
            }
        }
    }
}
