//! Effect interpreter.
//!
//! Executes one timing window of a stack entry's effect list against the
//! match state. Each window takes a snapshot of every character's status
//! bag at the start of its resolution; status-gated conditions and power
//! multipliers read the snapshot, so effects within the same window never
//! see each other's mutations.
//!
//! The evaluator is re-entrant: nested `Choose`/`If` branches recurse
//! through `exec` with all scratch state carried in the window scope,
//! never in shared module state.

use rustc_hash::FxHashMap;

use crate::cards::definition::{CardLibrary, TypeTag};
use crate::cards::CardInstance;
use crate::combat::StackEntry;
use crate::core::state::{MatchState, PileId};
use crate::core::{CardInstanceId, CharacterId};
use crate::status::{engine as status_engine, names, StatusField, StatusRegistry, StatusState};
use crate::targeting::mitigation;

use super::effect::{
    DamageAmount, Effect, EffectTarget, GrantedKeyword, PileKind, Predicate, PushDirection,
    SpendGate, Timing,
};

/// What a window did, for the clash resolver's hit/evade decisions.
#[derive(Clone, Debug, Default)]
pub struct WindowReport {
    /// HP actually lost, per character, during this window.
    pub hp_lost: FxHashMap<CharacterId, i32>,
}

impl WindowReport {
    /// HP lost by one character.
    #[must_use]
    pub fn lost_by(&self, id: CharacterId) -> i32 {
        self.hp_lost.get(&id).copied().unwrap_or(0)
    }

    /// Total HP lost across all characters.
    #[must_use]
    pub fn total(&self) -> i32 {
        self.hp_lost.values().sum()
    }
}

/// Per-window scratch state.
struct WindowScope {
    /// Status bags of every character, captured at window start.
    snapshot: FxHashMap<CharacterId, FxHashMap<String, StatusState>>,
    /// Amount successfully spent by `SpendStatus` so far this window.
    spent: i32,
    /// Gate raised by a failed spend.
    gate: Option<SpendGate>,
    report: WindowReport,
}

/// Run one timing window of an entry's effects.
pub fn run_window(
    state: &mut MatchState,
    registry: &StatusRegistry,
    library: &CardLibrary,
    entry: &mut StackEntry,
    timing: Timing,
) -> WindowReport {
    let effects: Vec<Effect> = entry
        .effects
        .iter()
        .filter(|t| t.timing == timing)
        .map(|t| t.effect.clone())
        .collect();
    if effects.is_empty() {
        return WindowReport::default();
    }

    let mut snapshot = FxHashMap::default();
    for team in &state.teams {
        for member in &team.members {
            snapshot.insert(member.id, member.statuses.clone());
        }
    }

    let mut scope = WindowScope {
        snapshot,
        spent: 0,
        gate: None,
        report: WindowReport::default(),
    };

    for effect in &effects {
        exec(state, registry, library, entry, &mut scope, effect);
    }

    scope.report
}

fn is_gated(scope: &WindowScope, effect: &Effect) -> bool {
    match scope.gate {
        Some(SpendGate::GateAll) => true,
        Some(SpendGate::GateDamage) => effect.is_damage_producing(),
        None => false,
    }
}

fn exec(
    state: &mut MatchState,
    registry: &StatusRegistry,
    library: &CardLibrary,
    entry: &mut StackEntry,
    scope: &mut WindowScope,
    effect: &Effect,
) {
    if is_gated(scope, effect) {
        return;
    }

    match effect {
        Effect::Damage { amount, hits } => {
            let base = base_damage(scope, registry, entry, *amount);
            deal_damage(state, registry, entry, scope, base, *hits);
        }

        Effect::Shield { amount } => {
            let amount = (*amount).max(0);
            if let Some(ch) = state.character_mut(entry.actor) {
                ch.shield += amount;
                let name = ch.name.clone();
                state.log.push(format!("{name} gains {amount} shield"));
            }
        }

        Effect::Heal { to, amount } => {
            for id in resolve_effect_targets(state, entry, *to) {
                heal_character(state, registry, id, *amount);
            }
        }

        Effect::GainMeter { amount } => {
            let team = state.team_mut(entry.team);
            team.ultimate = (team.ultimate + amount).clamp(0, 100);
        }

        Effect::GainStatus {
            name,
            to,
            field,
            amount,
        } => {
            for id in resolve_effect_targets(state, entry, *to) {
                gain_status(state, registry, id, name, *field, *amount);
            }
        }

        Effect::SpendStatus { name, amount, gate } => {
            let ok = state
                .character_mut(entry.actor)
                .is_some_and(|ch| status_engine::spend(registry, ch, name, *amount));
            if ok {
                scope.spent += amount;
            } else {
                scope.gate = Some(*gate);
                state
                    .log
                    .push(format!("{} cannot be spent", name));
            }
        }

        Effect::PerSpentDamage { per } => {
            if scope.spent > 0 {
                deal_damage(state, registry, entry, scope, per * scope.spent, 1);
            }
        }

        Effect::PerSpentStatus {
            name,
            to,
            field,
            per,
        } => {
            if scope.spent > 0 {
                let amount = per * scope.spent;
                for id in resolve_effect_targets(state, entry, *to) {
                    gain_status(state, registry, id, name, *field, amount);
                }
            }
        }

        Effect::SetStatus {
            name,
            to,
            field,
            value,
        } => {
            for id in resolve_effect_targets(state, entry, *to) {
                with_character(state, registry, id, |registry, ch, log| {
                    status_engine::set(registry, ch, name, *field, *value, log);
                });
            }
        }

        Effect::ReduceStatus {
            name,
            to,
            field,
            amount,
            floor,
        } => {
            for id in resolve_effect_targets(state, entry, *to) {
                with_character(state, registry, id, |registry, ch, log| {
                    status_engine::reduce(registry, ch, name, *field, *amount, *floor, log);
                });
            }
        }

        Effect::Draw { count } => {
            let team = state.team_mut(entry.team);
            for _ in 0..*count {
                if team.draw().is_none() {
                    break;
                }
            }
        }

        Effect::CreateCard {
            card_name,
            destination,
        } => {
            let Some(def_id) = library.by_name(card_name).map(|d| d.id) else {
                log::debug!("create card: unknown card '{card_name}'");
                return;
            };
            let id = state.alloc_card_id();
            let team = state.team_mut(entry.team);
            team.cards
                .insert(id, CardInstance::new(id, def_id, entry.actor));
            team.put_in_pile(id, pile_of(*destination));
            state
                .log
                .push(format!("a copy of {card_name} is created"));
        }

        Effect::PlayLock { team } => {
            let locked = match team {
                EffectTarget::Self_ | EffectTarget::AllyTeam => entry.team,
                EffectTarget::EnemyTeam => entry.team.opponent(),
                EffectTarget::Target => {
                    match entry.base_target.and_then(|t| state.team_of(t)) {
                        Some(t) => t,
                        None => return,
                    }
                }
            };
            state.play_locked[locked.index()] = true;
            let name = state.team(locked).name.clone();
            state
                .log
                .push(format!("{name} is locked out of playing this round"));
        }

        Effect::Reload { amount } => {
            gain_status(
                state,
                registry,
                entry.actor,
                names::AMMO,
                Some(StatusField::Value),
                *amount,
            );
        }

        Effect::SwitchWeapon { weapon } => {
            if let Some(ch) = state.character_mut(entry.actor) {
                if let Some(old) = ch.equipped.take() {
                    ch.statuses.remove(&old);
                }
                ch.equipped = Some(weapon.clone());
            }
            gain_status(
                state,
                registry,
                entry.actor,
                weapon,
                Some(StatusField::Stack),
                1,
            );
        }

        Effect::Choose { options } => {
            let Some(index) = entry.choice_index else {
                log::debug!("choose effect with no choice index; skipping");
                return;
            };
            let Some(branch) = options.get(index) else {
                return;
            };
            let branch_effects: Vec<Effect> = branch.effects.clone();
            for sub in &branch_effects {
                exec(state, registry, library, entry, scope, sub);
            }
        }

        Effect::GrantKeyword {
            keyword,
            requires_spend,
        } => {
            if let Some((name, amount)) = requires_spend {
                let ok = state
                    .character_mut(entry.actor)
                    .is_some_and(|ch| status_engine::spend(registry, ch, name, *amount));
                if !ok {
                    return;
                }
            }
            match keyword {
                GrantedKeyword::Evade => entry.keywords.evade = true,
                GrantedKeyword::Counter => entry.keywords.counter = true,
                GrantedKeyword::Reuse => entry.keywords.reuse = true,
            }
        }

        Effect::If { when, then } => {
            if eval_predicate(state, scope, entry, when) {
                for sub in then.clone() {
                    exec(state, registry, library, entry, scope, &sub);
                }
            }
        }

        Effect::Scry { count } => scry(state, entry, *count),
        Effect::Seek { count } => seek(state, entry, *count),
        Effect::Search => search(state, entry),

        Effect::Push { distance } => push_target(state, entry, *distance),
    }
}

fn pile_of(kind: PileKind) -> PileId {
    match kind {
        PileKind::Deck => PileId::Deck,
        PileKind::Hand => PileId::Hand,
        PileKind::Discard => PileId::Discard,
        PileKind::Exhausted => PileId::Exhausted,
    }
}

/// Resolve an `EffectTarget` to concrete character ids.
fn resolve_effect_targets(
    state: &MatchState,
    entry: &StackEntry,
    to: EffectTarget,
) -> Vec<CharacterId> {
    match to {
        EffectTarget::Target => entry.targets.clone(),
        EffectTarget::Self_ => vec![entry.actor],
        EffectTarget::AllyTeam => state.team(entry.team).living().map(|c| c.id).collect(),
        EffectTarget::EnemyTeam => state
            .team(entry.team.opponent())
            .living()
            .map(|c| c.id)
            .collect(),
    }
}

fn snap_potency(
    scope: &WindowScope,
    registry: &StatusRegistry,
    ch: CharacterId,
    name: &str,
) -> i32 {
    let Some(bag) = scope.snapshot.get(&ch) else {
        return 0;
    };
    let Some(status) = bag.get(name) else {
        return 0;
    };
    if status.is_active(registry.def_or_default(name).mode) {
        status.get(StatusField::Potency)
    } else {
        0
    }
}

/// Power multiplier from the *snapshot*, so a strength gained earlier in
/// the same window cannot double-count.
fn snap_power_percent(scope: &WindowScope, registry: &StatusRegistry, entry: &StackEntry) -> i32 {
    use crate::cards::definition::CardKind;

    let (up, down) = match entry.kind {
        CardKind::Attack => (names::STRENGTH, names::WEAK),
        CardKind::Defense => (names::DEXTERITY, names::FRAIL),
        CardKind::Skill => return 100,
    };
    let pct = 100 + 10 * snap_potency(scope, registry, entry.actor, up)
        - 10 * snap_potency(scope, registry, entry.actor, down);
    pct.max(0)
}

fn base_damage(
    scope: &WindowScope,
    registry: &StatusRegistry,
    entry: &StackEntry,
    amount: DamageAmount,
) -> i32 {
    match amount {
        DamageAmount::Flat(n) => n,
        DamageAmount::Power => {
            entry.power * snap_power_percent(scope, registry, entry) / 100
        }
        DamageAmount::PowerDivX => {
            let x = entry.x_value.max(1);
            (entry.power * snap_power_percent(scope, registry, entry) / 100) / x
        }
    }
}

fn deal_damage(
    state: &mut MatchState,
    registry: &StatusRegistry,
    entry: &StackEntry,
    scope: &mut WindowScope,
    base: i32,
    hits: u32,
) {
    if base <= 0 {
        return;
    }
    let targets = entry.targets.clone();
    let tags: Vec<TypeTag> = entry.tags.to_vec();

    for _ in 0..hits.max(1) {
        for &target in &targets {
            let mut log = std::mem::take(&mut state.log);
            let report = match state.character_mut(target) {
                Some(ch) => mitigation::apply_damage(registry, ch, base, &tags, &mut log),
                None => Default::default(),
            };
            state.log = log;
            *scope.report.hp_lost.entry(target).or_insert(0) += report.hp_lost;
        }
    }
}

fn heal_character(state: &mut MatchState, registry: &StatusRegistry, id: CharacterId, amount: i32) {
    let mut log = std::mem::take(&mut state.log);
    if let Some(ch) = state.character_mut(id) {
        mitigation::apply_heal(registry, ch, amount, &mut log);
    }
    state.log = log;
}

fn gain_status(
    state: &mut MatchState,
    registry: &StatusRegistry,
    id: CharacterId,
    name: &str,
    field: Option<StatusField>,
    amount: i32,
) {
    let mut log = std::mem::take(&mut state.log);
    if let Some(ch) = state.character_mut(id) {
        status_engine::gain(registry, ch, name, field, amount, &mut log);
    }
    state.log = log;
}

fn with_character(
    state: &mut MatchState,
    registry: &StatusRegistry,
    id: CharacterId,
    f: impl FnOnce(&StatusRegistry, &mut crate::core::state::Character, &mut crate::core::log::CombatLog),
) {
    let mut log = std::mem::take(&mut state.log);
    if let Some(ch) = state.character_mut(id) {
        f(registry, ch, &mut log);
    }
    state.log = log;
}

fn eval_predicate(
    state: &MatchState,
    scope: &WindowScope,
    entry: &StackEntry,
    predicate: &Predicate,
) -> bool {
    let snap_field = |ch: CharacterId, name: &str, field: StatusField| -> i32 {
        scope
            .snapshot
            .get(&ch)
            .and_then(|bag| bag.get(name))
            .map(|s| s.get(field))
            .unwrap_or(0)
    };

    match predicate {
        Predicate::SelfStatusAtLeast { name, field, min } => {
            snap_field(entry.actor, name, *field) >= *min
        }
        Predicate::TargetStatusAtLeast { name, field, min } => {
            let Some(target) = entry.base_target.or_else(|| entry.targets.first().copied())
            else {
                return false;
            };
            snap_field(target, name, *field) >= *min
        }
        Predicate::SelfHpBelowPercent(pct) => state
            .character(entry.actor)
            .is_some_and(|ch| ch.hp * 100 < pct * ch.max_hp),
        Predicate::TargetShieldBroken => {
            let Some(target) = entry.base_target.or_else(|| entry.targets.first().copied())
            else {
                return false;
            };
            state.character(target).is_some_and(|ch| ch.shield == 0)
        }
    }
}

fn scry(state: &mut MatchState, entry: &StackEntry, count: u32) {
    let team = state.team_mut(entry.team);
    let n = (count as usize).min(team.deck.len());
    if n == 0 {
        return;
    }

    let split_at = team.deck.len() - n;
    let looked = team.deck.split_off(split_at);

    let mut kept: Vec<CardInstanceId> = Vec::new();
    for id in looked {
        if entry.scry_discards.contains(&id) {
            team.discard.push(id);
        } else {
            kept.push(id);
        }
    }

    // Cards named in scry_order go back topmost, first-listed on top;
    // the rest keep their relative order beneath.
    let mut ordered: Vec<CardInstanceId> = kept
        .iter()
        .copied()
        .filter(|id| !entry.scry_order.contains(id))
        .collect();
    for id in entry.scry_order.iter().rev() {
        if kept.contains(id) {
            ordered.push(*id);
        }
    }
    team.deck.extend(ordered);
}

fn seek(state: &mut MatchState, entry: &StackEntry, count: u32) {
    let team = state.team_mut(entry.team);
    let n = (count as usize).min(team.deck.len());
    if n == 0 {
        return;
    }

    let split_at = team.deck.len() - n;
    let looked = team.deck.split_off(split_at);

    let mut bottomed: Vec<CardInstanceId> = Vec::new();
    for id in looked {
        if entry.seek_takes.contains(&id) {
            team.hand.push(id);
        } else {
            bottomed.push(id);
        }
    }

    let rest = std::mem::take(&mut team.deck);
    team.deck = bottomed;
    team.deck.extend(rest);
}

fn search(state: &mut MatchState, entry: &StackEntry) {
    let team_index = entry.team.index();
    if let Some(pick) = entry.search_pick {
        let team = &mut state.teams[team_index];
        if let Some(pos) = team.deck.iter().position(|&id| id == pick) {
            team.deck.remove(pos);
            team.hand.push(pick);
        }
    }

    let mut deck = std::mem::take(&mut state.teams[team_index].deck);
    state.rng.shuffle(&mut deck);
    state.teams[team_index].deck = deck;
}

fn push_target(state: &mut MatchState, entry: &StackEntry, distance: u32) {
    let Some(&target) = entry.targets.first() else {
        return;
    };
    let Some(team_id) = state.team_of(target) else {
        return;
    };
    let direction = entry.push_direction.unwrap_or(PushDirection::Back);

    let team = state.team_mut(team_id);
    let max_position = team.members.len().saturating_sub(1);

    for _ in 0..distance {
        let Some(position) = team.member(target).map(|c| c.position) else {
            return;
        };
        let next = match direction {
            PushDirection::Front => {
                if position == 0 {
                    break;
                }
                position - 1
            }
            PushDirection::Back => {
                if position >= max_position {
                    break;
                }
                position + 1
            }
        };

        // Swap with whoever occupies the destination slot, keeping
        // positions unique per team.
        if let Some(occupant) = team.members.iter().position(|m| m.position == next) {
            team.members[occupant].position = position;
        }
        if let Some(ch) = team.member_mut(target) {
            ch.position = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::definition::{CardDefId, CardDefinition, CardKind, Keywords, TargetSpec};
    use crate::core::state::Character;
    use crate::core::TeamId;
    use crate::effects::ChoiceBranch;
    use smallvec::smallvec;

    fn state() -> MatchState {
        let mut state = MatchState::new(42, ["Ada".to_string(), "Brin".to_string()]);
        state.teams[0]
            .members
            .push(Character::new(CharacterId::new(0), "Kael", 0));
        state.teams[0]
            .members
            .push(Character::new(CharacterId::new(1), "Mira", 1));
        state.teams[1]
            .members
            .push(Character::new(CharacterId::new(2), "Thorn", 0));
        state.teams[1]
            .members
            .push(Character::new(CharacterId::new(3), "Vex", 1));
        state
    }

    fn entry_with(effects: Vec<crate::effects::TimedEffect>) -> StackEntry {
        StackEntry {
            card: CardInstanceId::new(0),
            def: CardDefId::new(0),
            card_name: "Test".to_string(),
            kind: CardKind::Attack,
            tags: smallvec![TypeTag::Physical],
            target_spec: TargetSpec::Enemy,
            keywords: Keywords::default(),
            effects,
            team: TeamId::A,
            actor: CharacterId::new(0),
            targets: vec![CharacterId::new(2)],
            base_target: Some(CharacterId::new(2)),
            power: 10,
            x_value: 0,
            choice_index: None,
            redirect_choice: None,
            push_direction: None,
            scry_discards: Vec::new(),
            scry_order: Vec::new(),
            seek_takes: Vec::new(),
            search_pick: None,
            negated: false,
            redirected: false,
            cancelled_before_use: false,
            is_hit: false,
            reusable: false,
        }
    }

    fn library() -> CardLibrary {
        let mut lib = CardLibrary::new();
        lib.add(CardDefinition::new(
            CardDefId::new(50),
            "Ember",
            CardKind::Skill,
        ));
        lib
    }

    #[test]
    fn test_power_damage_uses_rolled_power() {
        let registry = StatusRegistry::standard();
        let lib = library();
        let mut state = state();

        let mut entry = entry_with(vec![crate::effects::TimedEffect::on_use(
            Effect::power_damage(),
        )]);
        let report = run_window(&mut state, &registry, &lib, &mut entry, Timing::OnUse);

        assert_eq!(report.lost_by(CharacterId::new(2)), 10);
        assert_eq!(state.character(CharacterId::new(2)).unwrap().hp, 90);
    }

    #[test]
    fn test_strength_gained_in_window_does_not_double_count() {
        let registry = StatusRegistry::standard();
        let lib = library();
        let mut state = state();

        // Strength gained in the same window must not affect the damage:
        // the multiplier reads the snapshot taken at window start.
        let mut entry = entry_with(vec![
            crate::effects::TimedEffect::on_use(Effect::self_status(names::STRENGTH, 5)),
            crate::effects::TimedEffect::on_use(Effect::power_damage()),
        ]);
        let report = run_window(&mut state, &registry, &lib, &mut entry, Timing::OnUse);

        assert_eq!(report.lost_by(CharacterId::new(2)), 10);
        // ...but the status itself did land
        assert!(state
            .character(CharacterId::new(0))
            .unwrap()
            .has_active(&registry, names::STRENGTH));
    }

    #[test]
    fn test_multi_hit_damage() {
        let registry = StatusRegistry::standard();
        let lib = library();
        let mut state = state();

        let mut entry = entry_with(vec![crate::effects::TimedEffect::on_use(Effect::Damage {
            amount: DamageAmount::Flat(3),
            hits: 3,
        })]);
        let report = run_window(&mut state, &registry, &lib, &mut entry, Timing::OnUse);

        assert_eq!(report.lost_by(CharacterId::new(2)), 9);
    }

    #[test]
    fn test_power_div_x() {
        let registry = StatusRegistry::standard();
        let lib = library();
        let mut state = state();

        let mut entry = entry_with(vec![crate::effects::TimedEffect::on_use(Effect::Damage {
            amount: DamageAmount::PowerDivX,
            hits: 1,
        })]);
        entry.power = 12;
        entry.x_value = 3;
        let report = run_window(&mut state, &registry, &lib, &mut entry, Timing::OnUse);

        assert_eq!(report.lost_by(CharacterId::new(2)), 4);
    }

    #[test]
    fn test_spend_gate_all_blocks_rest_of_window() {
        let registry = StatusRegistry::standard();
        let lib = library();
        let mut state = state();

        // No blood focus to spend: everything after the spend is gated
        let mut entry = entry_with(vec![
            crate::effects::TimedEffect::on_use(Effect::SpendStatus {
                name: names::BLOOD_FOCUS.to_string(),
                amount: 2,
                gate: SpendGate::GateAll,
            }),
            crate::effects::TimedEffect::on_use(Effect::flat_damage(5)),
            crate::effects::TimedEffect::on_use(Effect::Shield { amount: 4 }),
        ]);
        run_window(&mut state, &registry, &lib, &mut entry, Timing::OnUse);

        assert_eq!(state.character(CharacterId::new(2)).unwrap().hp, 100);
        assert_eq!(state.character(CharacterId::new(0)).unwrap().shield, 0);
    }

    #[test]
    fn test_spend_gate_damage_blocks_only_damage() {
        let registry = StatusRegistry::standard();
        let lib = library();
        let mut state = state();

        let mut entry = entry_with(vec![
            crate::effects::TimedEffect::on_use(Effect::SpendStatus {
                name: names::BLOOD_FOCUS.to_string(),
                amount: 2,
                gate: SpendGate::GateDamage,
            }),
            crate::effects::TimedEffect::on_use(Effect::flat_damage(5)),
            crate::effects::TimedEffect::on_use(Effect::Shield { amount: 4 }),
        ]);
        run_window(&mut state, &registry, &lib, &mut entry, Timing::OnUse);

        // Damage gated, shield not
        assert_eq!(state.character(CharacterId::new(2)).unwrap().hp, 100);
        assert_eq!(state.character(CharacterId::new(0)).unwrap().shield, 4);
    }

    #[test]
    fn test_per_spent_scaling() {
        let registry = StatusRegistry::standard();
        let lib = library();
        let mut state = state();

        {
            let mut log = crate::core::log::CombatLog::new();
            let ch = state.character_mut(CharacterId::new(0)).unwrap();
            status_engine::gain(&registry, ch, names::BLOOD_FOCUS, None, 3, &mut log);
        }

        let mut entry = entry_with(vec![
            crate::effects::TimedEffect::on_use(Effect::SpendStatus {
                name: names::BLOOD_FOCUS.to_string(),
                amount: 3,
                gate: SpendGate::GateAll,
            }),
            crate::effects::TimedEffect::on_use(Effect::PerSpentDamage { per: 2 }),
        ]);
        let report = run_window(&mut state, &registry, &lib, &mut entry, Timing::OnUse);

        assert_eq!(report.lost_by(CharacterId::new(2)), 6);
    }

    #[test]
    fn test_choose_branch_dispatch() {
        let registry = StatusRegistry::standard();
        let lib = library();
        let mut state = state();

        let choose = Effect::Choose {
            options: vec![
                ChoiceBranch {
                    label: "Strike".to_string(),
                    effects: vec![Effect::flat_damage(7)],
                },
                ChoiceBranch {
                    label: "Guard".to_string(),
                    effects: vec![Effect::Shield { amount: 7 }],
                },
            ],
        };

        let mut entry = entry_with(vec![crate::effects::TimedEffect::on_use(choose)]);
        entry.choice_index = Some(1);
        run_window(&mut state, &registry, &lib, &mut entry, Timing::OnUse);

        assert_eq!(state.character(CharacterId::new(2)).unwrap().hp, 100);
        assert_eq!(state.character(CharacterId::new(0)).unwrap().shield, 7);
    }

    #[test]
    fn test_conditional_predicate_reads_snapshot() {
        let registry = StatusRegistry::standard();
        let lib = library();
        let mut state = state();

        // Condition on a status gained in this same window: must not fire
        let mut entry = entry_with(vec![
            crate::effects::TimedEffect::on_use(Effect::self_status(names::FOCUS, 2)),
            crate::effects::TimedEffect::on_use(Effect::If {
                when: Predicate::SelfStatusAtLeast {
                    name: names::FOCUS.to_string(),
                    field: StatusField::Potency,
                    min: 1,
                },
                then: vec![Effect::flat_damage(5)],
            }),
        ]);
        run_window(&mut state, &registry, &lib, &mut entry, Timing::OnUse);

        assert_eq!(state.character(CharacterId::new(2)).unwrap().hp, 100);
    }

    #[test]
    fn test_create_card_defaults_to_discard() {
        let registry = StatusRegistry::standard();
        let lib = library();
        let mut state = state();

        let mut entry = entry_with(vec![crate::effects::TimedEffect::on_use(
            Effect::CreateCard {
                card_name: "Ember".to_string(),
                destination: PileKind::Discard,
            },
        )]);
        run_window(&mut state, &registry, &lib, &mut entry, Timing::OnUse);

        let team = state.team(TeamId::A);
        assert_eq!(team.discard.len(), 1);
        let created = team.card(team.discard[0]).unwrap();
        assert_eq!(created.def, CardDefId::new(50));
        assert_eq!(created.owner, CharacterId::new(0));
    }

    #[test]
    fn test_scry_discards_and_reorders() {
        let registry = StatusRegistry::standard();
        let lib = library();
        let mut state = state();

        let ids: Vec<CardInstanceId> = (0..5).map(CardInstanceId::new).collect();
        state.teams[0].deck = ids.clone();
        // Top of deck is ids[4], then ids[3], ids[2]

        let mut entry = entry_with(vec![crate::effects::TimedEffect::on_use(Effect::Scry {
            count: 3,
        })]);
        entry.scry_discards = vec![ids[3]];
        entry.scry_order = vec![ids[2], ids[4]]; // ids[2] should end on top

        run_window(&mut state, &registry, &lib, &mut entry, Timing::OnUse);

        let team = state.team(TeamId::A);
        assert_eq!(team.discard, vec![ids[3]]);
        assert_eq!(team.deck.last(), Some(&ids[2]));
        assert_eq!(team.deck.len(), 4);
    }

    #[test]
    fn test_seek_takes_to_hand_bottoms_rest() {
        let registry = StatusRegistry::standard();
        let lib = library();
        let mut state = state();

        let ids: Vec<CardInstanceId> = (0..4).map(CardInstanceId::new).collect();
        state.teams[0].deck = ids.clone();

        let mut entry = entry_with(vec![crate::effects::TimedEffect::on_use(Effect::Seek {
            count: 2,
        })]);
        entry.seek_takes = vec![ids[3]];

        run_window(&mut state, &registry, &lib, &mut entry, Timing::OnUse);

        let team = state.team(TeamId::A);
        assert_eq!(team.hand, vec![ids[3]]);
        // ids[2] went to the bottom
        assert_eq!(team.deck.first(), Some(&ids[2]));
    }

    #[test]
    fn test_push_back_swaps_positions() {
        let registry = StatusRegistry::standard();
        let lib = library();
        let mut state = state();

        let mut entry = entry_with(vec![crate::effects::TimedEffect::on_use(Effect::Push {
            distance: 1,
        })]);
        entry.push_direction = Some(PushDirection::Back);

        run_window(&mut state, &registry, &lib, &mut entry, Timing::OnUse);

        assert_eq!(state.character(CharacterId::new(2)).unwrap().position, 1);
        assert_eq!(state.character(CharacterId::new(3)).unwrap().position, 0);
    }

    #[test]
    fn test_grant_keyword_gated_by_spend() {
        let registry = StatusRegistry::standard();
        let lib = library();
        let mut state = state();

        let grant = Effect::GrantKeyword {
            keyword: GrantedKeyword::Reuse,
            requires_spend: Some((names::AMMO.to_string(), 1)),
        };

        // Without ammo: no grant
        let mut entry = entry_with(vec![crate::effects::TimedEffect::on_use(grant.clone())]);
        run_window(&mut state, &registry, &lib, &mut entry, Timing::OnUse);
        assert!(!entry.keywords.reuse);

        // With ammo: granted
        {
            let mut log = crate::core::log::CombatLog::new();
            let ch = state.character_mut(CharacterId::new(0)).unwrap();
            status_engine::gain(&registry, ch, names::AMMO, None, 2, &mut log);
        }
        let mut entry = entry_with(vec![crate::effects::TimedEffect::on_use(grant)]);
        run_window(&mut state, &registry, &lib, &mut entry, Timing::OnUse);
        assert!(entry.keywords.reuse);
    }
}
