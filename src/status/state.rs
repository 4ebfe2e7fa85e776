//! Per-status runtime state.
//!
//! Every status instance carries the same four independent numeric fields;
//! the status *definition* decides which of them gate "is this status
//! active" and how each is capped. All fields are clamped to `[0, cap]`
//! after every mutation.

use serde::{Deserialize, Serialize};

use super::def::{FieldCaps, StatusMode};

/// One of the four per-status fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusField {
    /// Magnitude (e.g. damage per tick, power bonus per turn).
    Potency,
    /// Remaining turns.
    Count,
    /// Accumulated stacks.
    Stack,
    /// A consumable pool or countdown.
    Value,
}

/// Runtime state of one status on one character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusState {
    pub potency: i32,
    pub count: i32,
    pub stack: i32,
    pub value: i32,
}

impl StatusState {
    /// All-zero state.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Read a field.
    #[must_use]
    pub fn get(&self, field: StatusField) -> i32 {
        match field {
            StatusField::Potency => self.potency,
            StatusField::Count => self.count,
            StatusField::Stack => self.stack,
            StatusField::Value => self.value,
        }
    }

    /// Write a field (unclamped; call [`StatusState::clamp`] after).
    pub fn set(&mut self, field: StatusField, v: i32) {
        match field {
            StatusField::Potency => self.potency = v,
            StatusField::Count => self.count = v,
            StatusField::Stack => self.stack = v,
            StatusField::Value => self.value = v,
        }
    }

    /// Add a delta to a field (unclamped).
    pub fn add(&mut self, field: StatusField, delta: i32) {
        self.set(field, self.get(field) + delta);
    }

    /// Clamp every field to `[0, cap]`.
    pub fn clamp(&mut self, caps: &FieldCaps) {
        self.potency = clamp_field(self.potency, caps.potency);
        self.count = clamp_field(self.count, caps.count);
        self.stack = clamp_field(self.stack, caps.stack);
        self.value = clamp_field(self.value, caps.value);
    }

    /// A status is active iff its mode-selected field(s) are positive.
    #[must_use]
    pub fn is_active(&self, mode: StatusMode) -> bool {
        match mode {
            StatusMode::PotencyCount => self.potency > 0 && self.count > 0,
            StatusMode::Stack => self.stack > 0,
            StatusMode::Value => self.value > 0,
        }
    }
}

fn clamp_field(v: i32, cap: Option<i32>) -> i32 {
    let v = v.max(0);
    match cap {
        Some(cap) => v.min(cap),
        None => v,
    }
}
