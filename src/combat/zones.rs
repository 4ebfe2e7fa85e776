//! Speed-tiered zones and the interrupt chain.
//!
//! Three zones hold played cards as ordered stacks. At most one zone is
//! *active* at a time; playing into a strictly faster zone pauses the
//! active one (LIFO), forming the interrupt chain. A zone resolves when
//! the same team that last played into it passes for a second consecutive
//! time.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cards::definition::{CardDefId, CardKind, Keywords, TargetSpec, TypeTag};
use crate::core::{CardInstanceId, CharacterId, TeamId};
use crate::effects::{PushDirection, TimedEffect};

/// The three speed tiers, slowest first so that a larger index is faster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpeedTier {
    Slow,
    Normal,
    Fast,
}

impl SpeedTier {
    /// Tier index: Slow = 0, Normal = 1, Fast = 2.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            SpeedTier::Slow => 0,
            SpeedTier::Normal => 1,
            SpeedTier::Fast => 2,
        }
    }

    /// Tier from a clamped index.
    #[must_use]
    pub fn from_index(index: i32) -> Self {
        match index.clamp(0, 2) {
            0 => SpeedTier::Slow,
            1 => SpeedTier::Normal,
            _ => SpeedTier::Fast,
        }
    }

    /// Shift by status-derived tiers (haste/slow), clamped to the lanes.
    #[must_use]
    pub fn shifted(self, delta: i32) -> Self {
        Self::from_index(self.index() as i32 + delta)
    }

    /// Strictly faster than another tier.
    #[must_use]
    pub fn is_faster_than(self, other: SpeedTier) -> bool {
        self.index() > other.index()
    }

    /// All tiers, slowest first.
    #[must_use]
    pub const fn all() -> [SpeedTier; 3] {
        [SpeedTier::Slow, SpeedTier::Normal, SpeedTier::Fast]
    }
}

impl std::fmt::Display for SpeedTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SpeedTier::Slow => "slow",
            SpeedTier::Normal => "normal",
            SpeedTier::Fast => "fast",
        };
        f.write_str(s)
    }
}

/// A card mid-resolution inside a zone.
///
/// Captures a snapshot of the played card plus every player-made
/// sub-choice, so resolution needs no further input.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StackEntry {
    pub card: CardInstanceId,
    pub def: CardDefId,
    pub card_name: String,
    pub kind: CardKind,
    pub tags: SmallVec<[TypeTag; 2]>,
    pub target_spec: TargetSpec,
    pub keywords: Keywords,
    /// Snapshot of the (possibly transform-substituted, adapter-normalized)
    /// effect list.
    pub effects: Vec<TimedEffect>,

    pub team: TeamId,
    pub actor: CharacterId,
    /// Expanded (and possibly redirected) targets.
    pub targets: Vec<CharacterId>,
    /// The originally chosen target, before expansion/redirect.
    pub base_target: Option<CharacterId>,

    /// Rolled or overridden power.
    pub power: i32,
    /// Chosen X value (0 when the card has no X cost).
    pub x_value: i32,

    // Player-made sub-choices, supplied up front in the action payload.
    pub choice_index: Option<usize>,
    pub redirect_choice: Option<CharacterId>,
    pub push_direction: Option<PushDirection>,
    pub scry_discards: Vec<CardInstanceId>,
    pub scry_order: Vec<CardInstanceId>,
    pub seek_takes: Vec<CardInstanceId>,
    pub search_pick: Option<CardInstanceId>,

    // Transient per-resolution flags.
    pub negated: bool,
    pub redirected: bool,
    pub cancelled_before_use: bool,
    pub is_hit: bool,
    /// Set when an Evade defense zeroes an attack; the card goes back to
    /// hand at zone teardown instead of the discard pile.
    pub reusable: bool,
}

impl StackEntry {
    /// Did this entry keep its use-phase windows?
    #[must_use]
    pub fn resolves_use_phase(&self) -> bool {
        !self.negated && !self.cancelled_before_use
    }
}

/// One speed-tiered zone.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Zone {
    /// Played cards, oldest first; the last entry is the top of the stack.
    pub entries: Vec<StackEntry>,
    /// Team that last played into this zone.
    pub last_played_by: Option<TeamId>,
    /// Consecutive passes since the last play.
    pub pass_count: u8,
    /// Team that passed most recently.
    pub last_passer: Option<TeamId>,
    /// Reuse-tagged entries set aside during resolution; returned to hand
    /// at teardown.
    pub retained: Vec<StackEntry>,
}

impl Zone {
    /// Record a play into this zone.
    pub fn push(&mut self, entry: StackEntry) {
        self.last_played_by = Some(entry.team);
        self.pass_count = 0;
        self.last_passer = None;
        self.entries.push(entry);
    }

    /// Record a pass. Returns `true` when the zone should now resolve:
    /// the second consecutive pass came from the team that last played.
    pub fn record_pass(&mut self, team: TeamId) -> bool {
        self.pass_count = self.pass_count.saturating_add(1);
        self.last_passer = Some(team);
        self.pass_count >= 2 && self.last_passer == self.last_played_by
    }

    /// Number of entries waiting to resolve.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there is nothing to resolve.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reset pass-tracking after resolution.
    pub fn reset(&mut self) {
        self.last_played_by = None;
        self.pass_count = 0;
        self.last_passer = None;
    }
}

/// The three zones plus the interrupt chain.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ZoneStack {
    zones: [Zone; 3],
    /// The zone currently accepting plays/passes, if any.
    pub active: Option<SpeedTier>,
    /// Paused zones, innermost interrupt last (LIFO).
    pub paused: Vec<SpeedTier>,
}

impl ZoneStack {
    /// Create an empty zone stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow a zone.
    #[must_use]
    pub fn zone(&self, tier: SpeedTier) -> &Zone {
        &self.zones[tier.index()]
    }

    /// Mutably borrow a zone.
    pub fn zone_mut(&mut self, tier: SpeedTier) -> &mut Zone {
        &mut self.zones[tier.index()]
    }

    /// Classify a play into `tier` while `active` is the current zone.
    ///
    /// Returns `Err` for an illegal (slower-than-active) play, `Ok(true)`
    /// when the play interrupts, `Ok(false)` otherwise.
    pub fn admit(&mut self, tier: SpeedTier) -> Result<bool, String> {
        match self.active {
            None => {
                self.active = Some(tier);
                Ok(false)
            }
            Some(active) if tier == active => Ok(false),
            Some(active) if tier.is_faster_than(active) => {
                self.paused.push(active);
                self.active = Some(tier);
                Ok(true)
            }
            Some(active) => Err(format!(
                "cannot play into the {tier} zone while the {active} zone is active"
            )),
        }
    }

    /// Tear down the active zone after resolution: resume the most
    /// recently paused zone, if any.
    pub fn finish_active(&mut self) {
        if let Some(tier) = self.active {
            self.zones[tier.index()].reset();
        }
        self.active = self.paused.pop();
    }

    /// Every entry in every zone (for pile-conservation checks and defeat
    /// purge).
    pub fn all_entries(&self) -> impl Iterator<Item = &StackEntry> {
        self.zones
            .iter()
            .flat_map(|z| z.entries.iter().chain(z.retained.iter()))
    }

    /// Purge every entry whose card belongs to a defeated character.
    /// Returns the removed card ids.
    pub fn purge_owned_by(&mut self, owner: CharacterId) -> Vec<CardInstanceId> {
        let mut removed = Vec::new();
        for zone in &mut self.zones {
            zone.entries.retain(|e| {
                if e.actor == owner {
                    removed.push(e.card);
                    false
                } else {
                    true
                }
            });
            zone.retained.retain(|e| {
                if e.actor == owner {
                    removed.push(e.card);
                    false
                } else {
                    true
                }
            });
        }
        removed
    }
}
