//! Match state: the root aggregate.
//!
//! `MatchState` is owned exclusively by the engine and mutated only
//! through `apply_action`. Action application is copy-on-write: the
//! engine clones the state, mutates the clone, and returns it as a new
//! immutable snapshot — the caller never observes a partially-mutated
//! state. `im` collections keep those clones cheap.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cards::CardInstance;
use crate::combat::ZoneStack;
use crate::core::log::CombatLog;
use crate::core::rng::MatchRng;
use crate::core::{CardInstanceId, CharacterId, TeamId};
use crate::status::{StatusField, StatusRegistry, StatusState};
use crate::targeting::MitigationRule;
use crate::transcript::Transcript;

/// Match phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Movement,
    Combat,
    /// Terminal: no further mutation occurs except reads.
    Finished,
}

/// A status gain deferred to the owner's next turn start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingGain {
    pub name: String,
    pub field: Option<StatusField>,
    pub amount: i32,
}

/// The ordered card piles a team owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PileId {
    Deck,
    Hand,
    Discard,
    Exhausted,
    /// Terminal pile for defeat-purged cards.
    Removed,
}

/// A roster member during a match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    /// Current HP, clamped to `0..=max_hp`.
    pub hp: i32,
    pub max_hp: i32,
    /// Transient per-combat-round buffer, zeroed at turn end.
    pub shield: i32,
    /// Line slot, unique per team.
    pub position: usize,
    /// Terminal: once set, all of this character's cards are purged.
    pub defeated: bool,
    pub statuses: FxHashMap<String, StatusState>,
    /// Deferred status gains applied at the next turn start.
    pub pending_gains: Vec<PendingGain>,
    /// Mitigation from the character's innate text.
    pub innate_rules: Vec<MitigationRule>,
    /// Currently equipped-weapon status name, if any.
    pub equipped: Option<String>,
    /// Per-turn trigger flags, reset each turn start.
    pub turn_flags: FxHashMap<String, i32>,
}

impl Character {
    /// Create a full-health character at a line position.
    #[must_use]
    pub fn new(id: CharacterId, name: impl Into<String>, position: usize) -> Self {
        Self {
            id,
            name: name.into(),
            hp: 100,
            max_hp: 100,
            shield: 0,
            position,
            defeated: false,
            statuses: FxHashMap::default(),
            pending_gains: Vec::new(),
            innate_rules: Vec::new(),
            equipped: None,
            turn_flags: FxHashMap::default(),
        }
    }

    /// Alive and on the line.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.defeated
    }

    /// Read a status's runtime state, if present.
    #[must_use]
    pub fn status(&self, name: &str) -> Option<&StatusState> {
        self.statuses.get(name)
    }

    /// Is a status present *and* active under its definition's mode?
    #[must_use]
    pub fn has_active(&self, registry: &StatusRegistry, name: &str) -> bool {
        self.statuses
            .get(name)
            .is_some_and(|s| s.is_active(registry.def_or_default(name).mode))
    }

    /// Read a per-turn flag.
    #[must_use]
    pub fn turn_flag(&self, key: &str) -> i32 {
        self.turn_flags.get(key).copied().unwrap_or(0)
    }

    /// Set a per-turn flag.
    pub fn set_turn_flag(&mut self, key: impl Into<String>, value: i32) {
        self.turn_flags.insert(key.into(), value);
    }

    /// Turn-start reset.
    pub fn reset_turn_flags(&mut self) {
        self.turn_flags.clear();
    }
}

/// One side of the match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub energy: i32,
    /// Ultimate meter.
    pub ultimate: i32,
    pub max_hand: usize,
    /// Extra cards drawn at turn start (from effects).
    pub draw_bonus: u32,

    // Piles: ordered sequences, a card in exactly one at a time.
    // Deck top is the end of the vec.
    pub deck: Vec<CardInstanceId>,
    pub hand: Vec<CardInstanceId>,
    pub discard: Vec<CardInstanceId>,
    pub exhausted: Vec<CardInstanceId>,
    pub removed: Vec<CardInstanceId>,

    pub members: Vec<Character>,
    /// Card instances owned by this team, by id.
    pub cards: FxHashMap<CardInstanceId, CardInstance>,
}

impl Team {
    /// Create an empty team.
    #[must_use]
    pub fn new(id: TeamId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            energy: 0,
            ultimate: 0,
            max_hand: 5,
            draw_bonus: 0,
            deck: Vec::new(),
            hand: Vec::new(),
            discard: Vec::new(),
            exhausted: Vec::new(),
            removed: Vec::new(),
            members: Vec::new(),
            cards: FxHashMap::default(),
        }
    }

    /// Borrow a pile.
    #[must_use]
    pub fn pile(&self, pile: PileId) -> &Vec<CardInstanceId> {
        match pile {
            PileId::Deck => &self.deck,
            PileId::Hand => &self.hand,
            PileId::Discard => &self.discard,
            PileId::Exhausted => &self.exhausted,
            PileId::Removed => &self.removed,
        }
    }

    /// Mutably borrow a pile.
    pub fn pile_mut(&mut self, pile: PileId) -> &mut Vec<CardInstanceId> {
        match pile {
            PileId::Deck => &mut self.deck,
            PileId::Hand => &mut self.hand,
            PileId::Discard => &mut self.discard,
            PileId::Exhausted => &mut self.exhausted,
            PileId::Removed => &mut self.removed,
        }
    }

    /// Remove a card from whichever pile currently holds it.
    ///
    /// Returns the pile it was in, or `None` if it is in no pile (e.g.
    /// sitting in a zone).
    pub fn take_from_piles(&mut self, id: CardInstanceId) -> Option<PileId> {
        for pile in [
            PileId::Deck,
            PileId::Hand,
            PileId::Discard,
            PileId::Exhausted,
            PileId::Removed,
        ] {
            let v = self.pile_mut(pile);
            if let Some(pos) = v.iter().position(|&c| c == id) {
                v.remove(pos);
                return Some(pile);
            }
        }
        None
    }

    /// Put a card into a pile (deck insertion goes on top).
    pub fn put_in_pile(&mut self, id: CardInstanceId, pile: PileId) {
        self.pile_mut(pile).push(id);
    }

    /// Draw from the top of the deck into hand.
    pub fn draw(&mut self) -> Option<CardInstanceId> {
        let id = self.deck.pop()?;
        self.hand.push(id);
        Some(id)
    }

    /// Look up a member.
    #[must_use]
    pub fn member(&self, id: CharacterId) -> Option<&Character> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Mutably look up a member.
    pub fn member_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.members.iter_mut().find(|m| m.id == id)
    }

    /// Living members, in line order.
    pub fn living(&self) -> impl Iterator<Item = &Character> {
        let mut members: Vec<&Character> = self.members.iter().filter(|m| m.is_alive()).collect();
        members.sort_by_key(|m| m.position);
        members.into_iter()
    }

    /// The living member at a line slot.
    #[must_use]
    pub fn member_at(&self, position: usize) -> Option<&Character> {
        self.members
            .iter()
            .find(|m| m.is_alive() && m.position == position)
    }

    /// The turn starter: first living member by line position.
    #[must_use]
    pub fn turn_starter(&self) -> Option<&Character> {
        self.living().next()
    }

    /// Look up a card instance.
    #[must_use]
    pub fn card(&self, id: CardInstanceId) -> Option<&CardInstance> {
        self.cards.get(&id)
    }

    /// Mutably look up a card instance.
    pub fn card_mut(&mut self, id: CardInstanceId) -> Option<&mut CardInstance> {
        self.cards.get_mut(&id)
    }

    /// Every card id across all piles (for conservation checks).
    pub fn pile_card_ids(&self) -> impl Iterator<Item = CardInstanceId> + '_ {
        self.deck
            .iter()
            .chain(self.hand.iter())
            .chain(self.discard.iter())
            .chain(self.exhausted.iter())
            .chain(self.removed.iter())
            .copied()
    }

    /// Any living member left?
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.members.iter().all(|m| m.defeated)
    }
}

/// A one-action counter window opened by a Counter defense.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterWindow {
    /// The defending team that may counter.
    pub team: TeamId,
    /// The counter play must target the original attacker.
    pub must_target: CharacterId,
}

/// Root aggregate for one match.
#[derive(Clone, Debug)]
pub struct MatchState {
    /// Monotonically increasing turn number, starting at 1.
    pub turn: u32,
    pub phase: Phase,
    pub teams: [Team; 2],
    pub zones: ZoneStack,
    /// Team whose action window it is.
    pub priority: TeamId,
    /// Consecutive passes in the current round (movement or stackless
    /// combat); any successful swap/play resets it.
    pub round_pass_count: u8,
    pub counter_window: Option<CounterWindow>,
    /// Per-team: blocked from playing for the rest of the combat round.
    pub play_locked: [bool; 2],
    /// Consecutive stun skips (bounded to 3 to prevent livelock).
    pub stun_skips: u8,
    pub log: CombatLog,
    pub transcript: Transcript,
    pub rng: MatchRng,
    next_card_id: u32,
}

impl MatchState {
    /// Create a bare state; the engine's setup fills teams and decks.
    #[must_use]
    pub fn new(seed: u64, players: [String; 2]) -> Self {
        Self {
            turn: 0,
            phase: Phase::Movement,
            teams: [Team::new(TeamId::A, ""), Team::new(TeamId::B, "")],
            zones: ZoneStack::new(),
            priority: TeamId::A,
            round_pass_count: 0,
            counter_window: None,
            play_locked: [false, false],
            stun_skips: 0,
            log: CombatLog::new(),
            transcript: Transcript::new(seed, players),
            rng: MatchRng::new(seed),
            next_card_id: 0,
        }
    }

    /// Borrow a team.
    #[must_use]
    pub fn team(&self, id: TeamId) -> &Team {
        &self.teams[id.index()]
    }

    /// Mutably borrow a team.
    pub fn team_mut(&mut self, id: TeamId) -> &mut Team {
        &mut self.teams[id.index()]
    }

    /// Which team a character belongs to.
    #[must_use]
    pub fn team_of(&self, id: CharacterId) -> Option<TeamId> {
        for team in &self.teams {
            if team.member(id).is_some() {
                return Some(team.id);
            }
        }
        None
    }

    /// Look up a character on either team.
    #[must_use]
    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.teams.iter().find_map(|t| t.member(id))
    }

    /// Mutably look up a character on either team.
    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.teams.iter_mut().find_map(|t| t.member_mut(id))
    }

    /// Allocate a fresh card instance id.
    pub fn alloc_card_id(&mut self) -> CardInstanceId {
        let id = CardInstanceId::new(self.next_card_id);
        self.next_card_id += 1;
        id
    }

    /// Has the match ended?
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Check defeat conditions; transitions to `Finished` when a side has
    /// no living members.
    pub fn check_match_end(&mut self) {
        if self.phase == Phase::Finished {
            return;
        }
        for id in TeamId::both() {
            if self.team(id).is_defeated() {
                let winner = id.opponent();
                self.log
                    .push(format!("{} wins the match", self.team(winner).name));
                self.phase = Phase::Finished;
                return;
            }
        }
    }

    /// Sweep for characters reduced to 0 HP: mark them defeated, purge
    /// their cards, and check for match end.
    pub fn sweep_defeated(&mut self) {
        let mut newly: Vec<(CharacterId, String)> = Vec::new();
        for team in &mut self.teams {
            for member in &mut team.members {
                if member.hp <= 0 && !member.defeated {
                    member.defeated = true;
                    newly.push((member.id, member.name.clone()));
                }
            }
        }

        for (id, name) in &newly {
            self.log.push(format!("{name} is defeated"));
            self.purge_defeated(*id);
        }
        if !newly.is_empty() {
            self.check_match_end();
        }
    }

    /// Purge a defeated character's cards from every pile and zone into
    /// the terminal `Removed` pile.
    pub fn purge_defeated(&mut self, id: CharacterId) {
        let Some(team_id) = self.team_of(id) else {
            return;
        };

        let from_zones = self.zones.purge_owned_by(id);

        let team = self.team_mut(team_id);
        let owned: Vec<CardInstanceId> = team
            .cards
            .values()
            .filter(|c| c.owner == id)
            .map(|c| c.id)
            .collect();

        for card in owned {
            team.take_from_piles(card);
            team.removed.push(card);
        }
        for card in from_zones {
            // Zone entries are not in any pile; move straight to removed.
            if !team.removed.contains(&card) {
                team.removed.push(card);
            }
        }
    }
}
