//! Status engine properties and lifecycle integration.
//!
//! The core bounds invariant: every status field stays within `[0, cap]`
//! after every mutation, and an inactive status is absent from the map
//! except for the persistent allow-list.

use proptest::prelude::*;

use zone_clash::status::engine as status_engine;
use zone_clash::{
    Character, CharacterId, CombatLog, StatusField, StatusMode, StatusRegistry,
};

const NAMES: &[&str] = &[
    "poison",
    "burn",
    "regen",
    "doom",
    "vulnerable",
    "strength",
    "weak",
    "blood_focus",
    "haste",
    "slow",
    "taunt",
    "cover",
    "barrier",
    "wound",
    "prepare",
    "ammo",
];

const FIELDS: &[StatusField] = &[
    StatusField::Potency,
    StatusField::Count,
    StatusField::Stack,
    StatusField::Value,
];

/// Check the full bounds invariant for one character.
fn assert_bounds(registry: &StatusRegistry, ch: &Character) {
    for (name, status) in &ch.statuses {
        let def = registry.def_or_default(name);

        for (value, cap) in [
            (status.potency, def.caps.potency),
            (status.count, def.caps.count),
            (status.stack, def.caps.stack),
            (status.value, def.caps.value),
        ] {
            assert!(value >= 0, "{name}: field below zero");
            if let Some(cap) = cap {
                assert!(value <= cap, "{name}: field {value} above cap {cap}");
            }
        }

        // Inactive statuses may only survive on the persistent allow-list.
        let mode = def.mode;
        if !status.is_active(mode) {
            assert!(
                def.persistent,
                "{name}: inactive non-persistent status survived pruning"
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Arbitrary interleavings of gain/reduce/set/spend/decay keep every
    /// field in bounds and the prune invariant intact.
    #[test]
    fn prop_status_bounds_hold(
        ops in proptest::collection::vec(
            (0u8..5, 0usize..16, 0usize..4, -20i32..40),
            0..60,
        ),
    ) {
        let registry = StatusRegistry::standard();
        let mut ch = Character::new(CharacterId::new(0), "Subject", 0);
        let mut log = CombatLog::new();

        for (op, name_index, field_index, amount) in ops {
            let name = NAMES[name_index % NAMES.len()];
            let field = FIELDS[field_index % FIELDS.len()];

            match op {
                0 => status_engine::gain(&registry, &mut ch, name, Some(field), amount, &mut log),
                1 => status_engine::reduce(
                    &registry, &mut ch, name, field, amount.abs(), 0, &mut log,
                ),
                2 => status_engine::set(&registry, &mut ch, name, field, amount, &mut log),
                3 => {
                    let _ = status_engine::spend(&registry, &mut ch, name, amount.abs());
                }
                _ => status_engine::turn_end_decay(&registry, &mut ch, &mut log),
            }

            assert_bounds(&registry, &ch);
            prop_assert!(ch.hp >= 0);
            prop_assert!(ch.hp <= ch.max_hp);
        }
    }

    /// Spending is all-or-nothing: it either removes exactly the asked
    /// amount or leaves the status untouched.
    #[test]
    fn prop_spend_all_or_nothing(
        have in 0i32..10,
        ask in 0i32..10,
    ) {
        let registry = StatusRegistry::standard();
        let mut ch = Character::new(CharacterId::new(0), "Subject", 0);
        let mut log = CombatLog::new();

        status_engine::gain(&registry, &mut ch, "blood_focus", None, have, &mut log);
        let before = ch.status("blood_focus").map(|s| s.stack).unwrap_or(0);

        let ok = status_engine::spend(&registry, &mut ch, "blood_focus", ask);
        let after = ch.status("blood_focus").map(|s| s.stack).unwrap_or(0);

        if ok {
            prop_assert_eq!(after, before - ask);
        } else {
            prop_assert_eq!(after, before);
        }
    }
}

// =============================================================================
// Lifecycle integration
// =============================================================================

#[test]
fn test_poison_ticks_across_engine_turns() {
    use zone_clash::{
        Action, CardDefId, CardDefinition, CardKind, CardLibrary, CardRef, Effect, MatchEngine,
        MatchSetup, PlayCard, SpeedTier, TeamId, TeamSetup, CharacterSpec, TimedEffect,
    };

    let venom = CardDefId(1);
    let guard = CardDefId(2);
    let mut lib = CardLibrary::new();
    lib.add(
        CardDefinition::new(venom, "Venom Dart", CardKind::Attack)
            .with_power(zone_clash::PowerSpec::Fixed(2))
            .with_effects(vec![
                TimedEffect::on_use(Effect::power_damage()),
                TimedEffect::new(
                    zone_clash::Timing::OnHit,
                    Effect::GainStatus {
                        name: "poison".to_string(),
                        to: zone_clash::EffectTarget::Target,
                        field: Some(StatusField::Potency),
                        amount: 3,
                    },
                ),
            ]),
    );
    lib.add(
        CardDefinition::new(guard, "Guard", CardKind::Defense)
            .with_effects(vec![TimedEffect::on_use(Effect::Shield { amount: 1 })]),
    );

    let setup = MatchSetup::new(
        5,
        TeamSetup::new("Ada", vec![CharacterSpec::new("Kael", vec![venom])]),
        TeamSetup::new("Brin", vec![CharacterSpec::new("Thorn", vec![guard])]),
    );
    let (engine, state) = MatchEngine::new(lib, setup).expect("setup");

    let apply = |state, action| {
        let outcome = engine.apply_action(&state, &action);
        assert!(outcome.error.is_none(), "rejected: {:?}", outcome.error);
        outcome.state
    };

    // Movement passes, then the dart lands.
    let mut state = apply(state, Action::Pass { team: TeamId::A });
    state = apply(state, Action::Pass { team: TeamId::B });

    let card = state.team(TeamId::A).hand[0];
    state = apply(
        state,
        Action::Play(
            PlayCard::new(TeamId::A, CardRef::Id(card), SpeedTier::Normal)
                .with_target(CharacterId::new(1)),
        ),
    );
    state = apply(state, Action::Pass { team: TeamId::B });
    state = apply(state, Action::Pass { team: TeamId::A });

    // 2 damage landed, poison 3 applied (potency 3, one turn).
    assert_eq!(state.character(CharacterId::new(1)).unwrap().hp, 98);
    assert!(state
        .character(CharacterId::new(1))
        .unwrap()
        .status("poison")
        .is_some());

    // Turn end: poison ticks 3 and expires.
    state = apply(state, Action::EndTurn { team: TeamId::B });

    assert_eq!(state.turn, 2);
    assert_eq!(state.character(CharacterId::new(1)).unwrap().hp, 95);
    assert!(state
        .character(CharacterId::new(1))
        .unwrap()
        .status("poison")
        .is_none());
    assert!(state.log.contains("poison expires"));
}

#[test]
fn test_unique_status_on_gain_bundle_through_setup() {
    use zone_clash::{
        CardDefId, CardDefinition, CardKind, CardLibrary, MatchEngine, MatchSetup, Reaction,
        StatusDef, TeamSetup, CharacterSpec,
    };

    let strike = CardDefId(1);
    let mut lib = CardLibrary::new();
    lib.add(CardDefinition::new(strike, "Strike", CardKind::Attack));

    let wolf_form = StatusDef::new("wolf_form", StatusMode::Stack).on_gain(vec![
        Reaction::Gain {
            name: "strength".to_string(),
            field: None,
            amount: 2,
        },
    ]);

    let setup = MatchSetup::new(
        5,
        TeamSetup::new(
            "Ada",
            vec![CharacterSpec::new("Kael", vec![strike])
                .with_unique_statuses(vec![wolf_form])],
        ),
        TeamSetup::new("Brin", vec![CharacterSpec::new("Thorn", vec![strike])]),
    );
    let (engine, mut state) = MatchEngine::new(lib, setup).expect("setup");

    // The unique status is registered on the engine's registry: gaining
    // it fires the bundle.
    let registry = engine.registry();
    let mut log = CombatLog::new();
    let ch = state.character_mut(CharacterId::new(0)).unwrap();
    status_engine::gain(registry, ch, "wolf_form", None, 1, &mut log);

    assert!(ch.has_active(registry, "wolf_form"));
    assert!(ch.has_active(registry, "strength"));
}
