//! Match setup: the one-time construction input.
//!
//! Construction validates its invariants eagerly and fails fast with a
//! [`crate::error::SetupError`]; everything after construction is a
//! recoverable gameplay rejection instead.

use crate::cards::CardDefId;
use crate::status::StatusDef;
use crate::targeting::MitigationRule;

/// Static description of one roster member.
#[derive(Clone, Debug)]
pub struct CharacterSpec {
    pub name: String,
    pub max_hp: i32,
    /// The card pool this member contributes to the team deck.
    pub cards: Vec<CardDefId>,
    /// Character-unique statuses parsed from the member's text block.
    pub unique_statuses: Vec<StatusDef>,
    /// Mitigation from innate text.
    pub innate_rules: Vec<MitigationRule>,
}

impl CharacterSpec {
    /// A 100-HP member with the given card pool.
    #[must_use]
    pub fn new(name: impl Into<String>, cards: Vec<CardDefId>) -> Self {
        Self {
            name: name.into(),
            max_hp: 100,
            cards,
            unique_statuses: Vec::new(),
            innate_rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_max_hp(mut self, max_hp: i32) -> Self {
        self.max_hp = max_hp;
        self
    }

    #[must_use]
    pub fn with_unique_statuses(mut self, statuses: Vec<StatusDef>) -> Self {
        self.unique_statuses = statuses;
        self
    }

    #[must_use]
    pub fn with_innate_rules(mut self, rules: Vec<MitigationRule>) -> Self {
        self.innate_rules = rules;
        self
    }
}

/// One side's setup.
#[derive(Clone, Debug)]
pub struct TeamSetup {
    pub name: String,
    pub characters: Vec<CharacterSpec>,
}

impl TeamSetup {
    #[must_use]
    pub fn new(name: impl Into<String>, characters: Vec<CharacterSpec>) -> Self {
        Self {
            name: name.into(),
            characters,
        }
    }
}

/// Full match construction input.
#[derive(Clone, Debug)]
pub struct MatchSetup {
    pub seed: u64,
    pub teams: [TeamSetup; 2],
    /// Number of line slots per team.
    pub line_size: usize,
    pub max_hand: usize,
}

impl MatchSetup {
    /// Setup with the default line size (5) and hand size (5).
    #[must_use]
    pub fn new(seed: u64, first: TeamSetup, second: TeamSetup) -> Self {
        Self {
            seed,
            teams: [first, second],
            line_size: 5,
            max_hand: 5,
        }
    }
}
