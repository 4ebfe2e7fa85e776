//! Card instances - identity-bearing cards in play.
//!
//! An instance is created at deck-build time or by in-match create-card
//! effects, and destroyed (moved to the terminal pile) only by defeat
//! purge. Its `cost_adjustment` persists with the instance across every
//! pile it moves through.

use serde::{Deserialize, Serialize};

use crate::cards::definition::CardDefId;
use crate::core::{CardInstanceId, CharacterId};

/// A card instance in a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInstance {
    /// Unique id, stable across piles.
    pub id: CardInstanceId,

    /// The definition this is a copy of.
    pub def: CardDefId,

    /// The roster member this card belongs to (defeat purge removes all
    /// of a character's cards everywhere).
    pub owner: CharacterId,

    /// Accumulated cost delta from Prepare/Stagnate effects.
    pub cost_adjustment: i32,
}

impl CardInstance {
    /// Create an instance with no cost adjustment.
    #[must_use]
    pub fn new(id: CardInstanceId, def: CardDefId, owner: CharacterId) -> Self {
        Self {
            id,
            def,
            owner,
            cost_adjustment: 0,
        }
    }

    /// Accumulate a cost delta (negative from Prepare, positive from
    /// Stagnate).
    pub fn adjust_cost(&mut self, delta: i32) {
        self.cost_adjustment += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_instance() {
        let card = CardInstance::new(
            CardInstanceId::new(10),
            CardDefId::new(1),
            CharacterId::new(3),
        );

        assert_eq!(card.id, CardInstanceId::new(10));
        assert_eq!(card.owner, CharacterId::new(3));
        assert_eq!(card.cost_adjustment, 0);
    }

    #[test]
    fn test_cost_adjustment_accumulates() {
        let mut card = CardInstance::new(
            CardInstanceId::new(10),
            CardDefId::new(1),
            CharacterId::new(3),
        );

        card.adjust_cost(-1);
        card.adjust_cost(-1);
        card.adjust_cost(2);

        assert_eq!(card.cost_adjustment, 0);

        card.adjust_cost(-3);
        assert_eq!(card.cost_adjustment, -3);
    }
}
