//! Structured effect definitions.
//!
//! Effects are the closed set of atomic operations a card can perform.
//! Each effect is attached to a timing window; the interpreter in
//! [`crate::effects::interpreter`] executes one window's effects at a time.
//!
//! The set is intentionally closed: the legacy free-text fallback path
//! normalizes into this same type through [`crate::cards::adapter`], so the
//! core state machine only ever sees structured effects.

use serde::{Deserialize, Serialize};

use crate::status::StatusField;

/// Timing windows, in firing order per card resolution.
///
/// `BeforeClash` and `AfterClash` are fired by the clash resolver on every
/// pairwise comparison; the rest fire during a card's own use phase.
/// `Always` fires even when the card was cancelled or stands adjacent to a
/// negation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timing {
    /// The moment the card enters a zone.
    OnPlay,
    /// Before a pairwise clash comparison.
    BeforeClash,
    /// After the clash comparison decision, regardless of outcome.
    AfterClash,
    /// Before the card's use effects.
    BeforeUse,
    /// The card's main effects.
    OnUse,
    /// Only if the card hit.
    OnHit,
    /// After the card's use effects.
    AfterUse,
    /// Fires even when cancelled or negated-adjacent.
    Always,
}

/// Who a status-affecting effect applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectTarget {
    /// The card's resolved target(s).
    Target,
    /// The acting character.
    Self_,
    /// Every living member of the actor's team.
    AllyTeam,
    /// Every living member of the opposing team.
    EnemyTeam,
}

/// How a damage effect computes its base amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageAmount {
    /// A fixed number.
    Flat(i32),
    /// The entry's rolled/overridden power.
    Power,
    /// Power divided by the chosen X value (floor; X of 0 reads as 1).
    PowerDivX,
}

/// What a failed `SpendStatus` gates for the rest of the window.
///
/// This is a declared property of the spend instruction, never inferred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpendGate {
    /// Failure skips every subsequent effect in the window.
    GateAll,
    /// Failure skips only damage-producing effects.
    GateDamage,
}

/// Destination pile for created cards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PileKind {
    Deck,
    Hand,
    /// The default destination unless the card says otherwise.
    Discard,
    Exhausted,
}

/// Direction for push effects along the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PushDirection {
    /// Toward slot 0.
    Front,
    /// Toward the back of the line.
    Back,
}

/// Keywords grantable to the resolving entry mid-resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantedKeyword {
    Evade,
    Counter,
    Reuse,
}

/// Status-gated predicates, evaluated against the window's status
/// snapshot (never against live state mutated earlier in the window).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predicate {
    /// Actor has at least `min` in the given field of a status.
    SelfStatusAtLeast {
        name: String,
        field: StatusField,
        min: i32,
    },
    /// The base target has at least `min` in the given field.
    TargetStatusAtLeast {
        name: String,
        field: StatusField,
        min: i32,
    },
    /// Actor's HP is strictly below a percentage of max.
    SelfHpBelowPercent(i32),
    /// The base target has no shield.
    TargetShieldBroken,
}

/// One branch of a nested `Choose` effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceBranch {
    pub label: String,
    pub effects: Vec<Effect>,
}

/// An atomic card effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Deal damage to the card's targets, `hits` times.
    Damage { amount: DamageAmount, hits: u32 },

    /// Gain shield on the actor.
    Shield { amount: i32 },

    /// Heal (subject to healing-reduction statuses).
    Heal { to: EffectTarget, amount: i32 },

    /// Gain ultimate meter for the actor's team.
    GainMeter { amount: i32 },

    /// Gain or inflict a status by name.
    GainStatus {
        name: String,
        to: EffectTarget,
        /// Field to add to; defaults to the status's amount field.
        field: Option<StatusField>,
        amount: i32,
    },

    /// Spend a resource-like status. Fully succeeds or fails; on failure
    /// the declared gate applies to the rest of the window.
    SpendStatus {
        name: String,
        amount: i32,
        gate: SpendGate,
    },

    /// Damage scaling with the amount spent by a prior `SpendStatus` in
    /// the same window.
    PerSpentDamage { per: i32 },

    /// Status gain scaling with the amount spent in the same window.
    PerSpentStatus {
        name: String,
        to: EffectTarget,
        field: Option<StatusField>,
        per: i32,
    },

    /// Set a status field to an exact (clamped) value.
    SetStatus {
        name: String,
        to: EffectTarget,
        field: StatusField,
        value: i32,
    },

    /// Reduce a status field, never below `floor`.
    ReduceStatus {
        name: String,
        to: EffectTarget,
        field: StatusField,
        amount: i32,
        floor: i32,
    },

    /// Draw cards for the actor's team.
    Draw { count: u32 },

    /// Create a fresh instance of a card by name. Destination defaults to
    /// discard unless the card text says hand.
    CreateCard {
        card_name: String,
        destination: PileKind,
    },

    /// Block the named side from playing cards for the rest of the combat
    /// round.
    PlayLock { team: EffectTarget },

    /// Refill the actor's ammo pool.
    Reload { amount: i32 },

    /// Swap the actor's equipped-weapon status.
    SwitchWeapon { weapon: String },

    /// Player-selected branch; re-dispatches its sub-effects at the same
    /// timing through the same evaluator.
    Choose { options: Vec<ChoiceBranch> },

    /// Grant a keyword to the resolving entry, optionally gated by a
    /// resource spend.
    GrantKeyword {
        keyword: GrantedKeyword,
        /// `(status name, amount)` that must be spent for the grant.
        requires_spend: Option<(String, i32)>,
    },

    /// Conditional execution.
    If { when: Predicate, then: Vec<Effect> },

    /// Look at the top N of the deck; discard a chosen subset and reorder
    /// the rest (selections supplied in the action payload).
    Scry { count: u32 },

    /// Look at the top N of the deck; take chosen cards to hand, bottom
    /// the rest.
    Seek { count: u32 },

    /// Pick any card from the deck into hand, then shuffle.
    Search,

    /// Push the target along the line in the player-chosen direction.
    Push { distance: u32 },
}

/// An effect bound to its timing window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEffect {
    pub timing: Timing,
    pub effect: Effect,
}

impl TimedEffect {
    /// Bind an effect to a window.
    #[must_use]
    pub fn new(timing: Timing, effect: Effect) -> Self {
        Self { timing, effect }
    }

    /// Shorthand for an `OnUse` effect, the most common window.
    #[must_use]
    pub fn on_use(effect: Effect) -> Self {
        Self::new(Timing::OnUse, effect)
    }
}

impl Effect {
    /// Does this effect produce damage (for `GateDamage` spend gating)?
    #[must_use]
    pub fn is_damage_producing(&self) -> bool {
        matches!(self, Effect::Damage { .. } | Effect::PerSpentDamage { .. })
    }

    /// Flat power damage, single hit.
    #[must_use]
    pub fn power_damage() -> Self {
        Effect::Damage {
            amount: DamageAmount::Power,
            hits: 1,
        }
    }

    /// Flat damage, single hit.
    #[must_use]
    pub fn flat_damage(amount: i32) -> Self {
        Effect::Damage {
            amount: DamageAmount::Flat(amount),
            hits: 1,
        }
    }

    /// Gain a status on the actor using its default field.
    #[must_use]
    pub fn self_status(name: impl Into<String>, amount: i32) -> Self {
        Effect::GainStatus {
            name: name.into(),
            to: EffectTarget::Self_,
            field: None,
            amount,
        }
    }

    /// Inflict a status on the card's targets using its default field.
    #[must_use]
    pub fn inflict(name: impl Into<String>, amount: i32) -> Self {
        Effect::GainStatus {
            name: name.into(),
            to: EffectTarget::Target,
            field: None,
            amount,
        }
    }
}
