//! Player actions.
//!
//! An action carries *every* decision the engine will need for its
//! resolution up front — choices, scry ordering, redirect target — so a
//! single `apply_action` call runs to completion with no mid-resolution
//! prompting.

use serde::{Deserialize, Serialize};

use crate::combat::SpeedTier;
use crate::core::{CardInstanceId, CharacterId, TeamId};
use crate::effects::PushDirection;

/// How a play refers to the card being played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardRef {
    /// By instance id.
    Id(CardInstanceId),
    /// By current hand slot.
    Slot(usize),
}

/// A card play with all of its up-front decisions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayCard {
    pub team: TeamId,
    pub card: CardRef,
    pub zone: SpeedTier,
    pub target: Option<CharacterId>,
    pub x_value: Option<i32>,
    pub choice_index: Option<usize>,
    pub redirect_target: Option<CharacterId>,
    pub scry_discards: Vec<CardInstanceId>,
    pub scry_order: Vec<CardInstanceId>,
    pub seek_takes: Vec<CardInstanceId>,
    pub search_pick: Option<CardInstanceId>,
    pub push_direction: Option<PushDirection>,
}

impl PlayCard {
    /// A play with no optional decisions supplied.
    #[must_use]
    pub fn new(team: TeamId, card: CardRef, zone: SpeedTier) -> Self {
        Self {
            team,
            card,
            zone,
            target: None,
            x_value: None,
            choice_index: None,
            redirect_target: None,
            scry_discards: Vec::new(),
            scry_order: Vec::new(),
            seek_takes: Vec::new(),
            search_pick: None,
            push_direction: None,
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: CharacterId) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn with_x(mut self, x: i32) -> Self {
        self.x_value = Some(x);
        self
    }

    #[must_use]
    pub fn with_choice(mut self, index: usize) -> Self {
        self.choice_index = Some(index);
        self
    }

    #[must_use]
    pub fn with_redirect_target(mut self, target: CharacterId) -> Self {
        self.redirect_target = Some(target);
        self
    }

    #[must_use]
    pub fn with_push_direction(mut self, direction: PushDirection) -> Self {
        self.push_direction = Some(direction);
        self
    }
}

/// A complete player action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Play a card into a zone.
    Play(PlayCard),

    /// Movement round: spend 1 energy to swap two adjacent, unrooted
    /// allies.
    MoveSwap {
        team: TeamId,
        first: CharacterId,
        second: CharacterId,
    },

    /// Pass priority (movement or combat).
    Pass { team: TeamId },

    /// End the combat round when no zone is active.
    EndTurn { team: TeamId },

    /// Clear the player-visible combat log.
    ClearLog { team: TeamId },
}

impl Action {
    /// The team attempting this action.
    #[must_use]
    pub fn team(&self) -> TeamId {
        match self {
            Action::Play(play) => play.team,
            Action::MoveSwap { team, .. }
            | Action::Pass { team }
            | Action::EndTurn { team }
            | Action::ClearLog { team } => *team,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_builder() {
        let play = PlayCard::new(TeamId::A, CardRef::Slot(0), SpeedTier::Fast)
            .with_target(CharacterId::new(4))
            .with_x(3);

        assert_eq!(play.team, TeamId::A);
        assert_eq!(play.target, Some(CharacterId::new(4)));
        assert_eq!(play.x_value, Some(3));
        assert_eq!(play.choice_index, None);
    }

    #[test]
    fn test_action_team() {
        let action = Action::Pass { team: TeamId::B };
        assert_eq!(action.team(), TeamId::B);

        let action = Action::Play(PlayCard::new(
            TeamId::A,
            CardRef::Id(CardInstanceId::new(9)),
            SpeedTier::Normal,
        ));
        assert_eq!(action.team(), TeamId::A);
    }

    #[test]
    fn test_action_serialization() {
        let action = Action::MoveSwap {
            team: TeamId::A,
            first: CharacterId::new(1),
            second: CharacterId::new(2),
        };

        let json = serde_json::to_string(&action).unwrap();
        let deserialized: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(action, deserialized);
    }
}
