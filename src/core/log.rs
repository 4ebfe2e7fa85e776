//! Player-visible combat log.
//!
//! The log is part of the match state and is itself deterministic: the same
//! action sequence produces the same lines in the same order. Tests use it
//! as an oracle for externally observable events (clash outcomes, cover
//! interceptions, status expirations).
//!
//! Backed by `im::Vector` so cloning a state snapshot is O(1).

use im::Vector;
use serde::{Deserialize, Serialize};

/// Append-only combat log.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CombatLog {
    entries: Vector<String>,
}

impl CombatLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line.
    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::trace!("combat log: {line}");
        self.entries.push_back(line);
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over lines, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.entries.iter()
    }

    /// The most recent line.
    #[must_use]
    pub fn last(&self) -> Option<&String> {
        self.entries.last()
    }

    /// True if any line contains the given fragment.
    #[must_use]
    pub fn contains(&self, fragment: &str) -> bool {
        self.entries.iter().any(|e| e.contains(fragment))
    }

    /// Clear all lines (the `clear_log` player action).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
