//! Identifier newtypes.
//!
//! Every match object is referenced by a stable integer id:
//! - `TeamId`: one of exactly two sides
//! - `CharacterId`: a roster member
//! - `CardInstanceId`: an identity-bearing card in play
//!
//! Ids are allocated monotonically per match and never reused, so a
//! transcript can refer to any object unambiguously.

use serde::{Deserialize, Serialize};

/// One of the two sides of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u8);

impl TeamId {
    /// The first team (acts first on odd turns).
    pub const A: TeamId = TeamId(0);
    /// The second team.
    pub const B: TeamId = TeamId(1);

    /// Get the opposing team.
    #[must_use]
    pub const fn opponent(self) -> TeamId {
        TeamId(1 - self.0)
    }

    /// Raw index (0 or 1) for array access.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Both team ids in order.
    #[must_use]
    pub const fn both() -> [TeamId; 2] {
        [TeamId::A, TeamId::B]
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Team {}", self.0)
    }
}

/// Unique identifier for a roster member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(pub u32);

impl CharacterId {
    /// Create a new character ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Character({})", self.0)
    }
}

/// Unique identifier for a card instance.
///
/// A card instance keeps its id for its whole life, across every pile it
/// moves through. Cards created mid-match get fresh ids from the same
/// allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardInstanceId(pub u32);

impl CardInstanceId {
    /// Create a new card instance ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardInstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}
