//! Transcript: the append-only record that makes a match replayable.
//!
//! Every attempted action is recorded in order, *including rejected
//! ones* with their rejection reason. Together with the seed, the
//! transcript is sufficient to deterministically reproduce the final
//! state of a match; replay asserts that every step's success/failure
//! matches what was recorded and surfaces the first mismatch as a
//! [`crate::error::ReplayError::Divergence`].

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::core::Action;

/// Current transcript format version.
pub const TRANSCRIPT_VERSION: u32 = 1;

/// One attempted action and its outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub action: Action,
    /// The rejection reason, or `None` if the action was accepted.
    pub error: Option<String>,
}

/// Append-only action log for one match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub version: u32,
    pub seed: u64,
    pub players: [String; 2],
    pub actions: Vector<AttemptRecord>,
}

impl Transcript {
    /// Start an empty transcript.
    #[must_use]
    pub fn new(seed: u64, players: [String; 2]) -> Self {
        Self {
            version: TRANSCRIPT_VERSION,
            seed,
            players,
            actions: Vector::new(),
        }
    }

    /// Record an attempt.
    pub fn record(&mut self, action: Action, error: Option<String>) {
        self.actions.push_back(AttemptRecord { action, error });
    }

    /// Number of recorded attempts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Compact byte encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, String> {
        bincode::serialize(self).map_err(|e| e.to_string())
    }

    /// Decode from [`Transcript::to_bytes`] output.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        bincode::deserialize(bytes).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TeamId;

    fn transcript() -> Transcript {
        let mut t = Transcript::new(42, ["Ada".to_string(), "Brin".to_string()]);
        t.record(Action::Pass { team: TeamId::A }, None);
        t.record(
            Action::Pass { team: TeamId::A },
            Some("not your turn".to_string()),
        );
        t
    }

    #[test]
    fn test_records_rejections_too() {
        let t = transcript();
        assert_eq!(t.len(), 2);
        assert!(t.actions[0].error.is_none());
        assert_eq!(t.actions[1].error.as_deref(), Some("not your turn"));
    }

    #[test]
    fn test_bytes_round_trip() {
        let t = transcript();
        let bytes = t.to_bytes().unwrap();
        let back = Transcript::from_bytes(&bytes).unwrap();
        assert_eq!(t, back);
    }

    #[test]
    fn test_json_round_trip() {
        let t = transcript();
        let json = serde_json::to_string(&t).unwrap();
        let back: Transcript = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
