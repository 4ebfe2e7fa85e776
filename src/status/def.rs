//! Status definitions and the process-wide definition table.
//!
//! A `StatusDef` fixes, per status name:
//! - the *mode*: which field(s) gate "is this status active"
//! - optional per-field caps
//! - whether the status survives pruning while inactive (persistent)
//! - its turn-end decay rule
//! - reaction tables fired on gain (inactive→active), on expiry
//!   (active→inactive), and at turn start while active
//! - an optional mitigation contribution (resist/weakness/absorb/immune)
//!
//! Global definitions are declared once in [`StatusRegistry::standard`] and
//! treated as write-once configuration. Character-unique statuses extend a
//! match's registry at setup time.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cards::definition::TypeTag;

use super::state::StatusField;

/// Which field(s) determine activity and decay for a status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusMode {
    /// Active while `potency > 0 && count > 0` (magnitude + duration).
    PotencyCount,
    /// Active while `stack > 0`.
    Stack,
    /// Active while `value > 0` (consumable pool or countdown).
    Value,
}

/// Optional per-field caps. `None` means floor-only (values never go
/// below zero regardless).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCaps {
    pub potency: Option<i32>,
    pub count: Option<i32>,
    pub stack: Option<i32>,
    pub value: Option<i32>,
}

impl FieldCaps {
    /// No caps on any field.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            potency: None,
            count: None,
            stack: None,
            value: None,
        }
    }
}

/// Periodic effect fired at turn end before the decay step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickKind {
    /// Deal `potency` raw damage to the owner.
    Damage,
    /// Heal the owner for `potency`.
    Heal,
}

/// The decay step applied at turn end while the status is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecayStep {
    /// No turn-end decay.
    #[default]
    None,
    /// Halve `count` (rounding down).
    HalveCount,
    /// Decrement `count` by 1.
    DecrementCount,
    /// Decrement `stack` by 1.
    DecrementStack,
    /// Decrement `value` by 1.
    DecrementValue,
}

/// Full turn-end rule: optional periodic tick, then a decay step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayRule {
    pub tick: Option<TickKind>,
    pub step: DecayStep,
}

impl DecayRule {
    /// Plain decay with no tick.
    #[must_use]
    pub const fn step(step: DecayStep) -> Self {
        Self { tick: None, step }
    }
}

/// A self-targeted reaction fired from a status transition.
///
/// Reactions always apply to the status owner; cross-character effects
/// belong on cards, not in reaction tables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reaction {
    /// Gain another status now.
    Gain {
        name: String,
        field: Option<StatusField>,
        amount: i32,
    },
    /// Remove another status entirely.
    Remove { name: String },
    /// Schedule a status gain for the owner's next turn start.
    Deferred {
        name: String,
        field: Option<StatusField>,
        amount: i32,
    },
    /// Raw HP loss, bypassing mitigation (e.g. a lethal countdown).
    Damage { amount: i32 },
    /// Raw heal, bypassing healing reduction.
    Heal { amount: i32 },
}

/// What a mitigation-bearing status contributes to the damage pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MitigationKind {
    Immune,
    Resist,
    Absorb,
    Weakness,
}

/// Tag gate restricting a mitigation rule to matching damage instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagGate {
    /// Matches every damage instance.
    Any,
    /// Matches damage carrying this tag.
    Is(TypeTag),
    /// Matches damage NOT carrying this tag.
    Not(TypeTag),
}

impl TagGate {
    /// Does a damage instance with these tags pass the gate?
    #[must_use]
    pub fn matches(&self, tags: &[TypeTag]) -> bool {
        match self {
            TagGate::Any => true,
            TagGate::Is(t) => tags.contains(t),
            TagGate::Not(t) => !tags.contains(t),
        }
    }
}

/// Definition of one status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusDef {
    pub name: String,
    pub mode: StatusMode,
    pub caps: FieldCaps,
    /// Survives pruning while inactive (lethal countdowns and the like).
    pub persistent: bool,
    pub decay: DecayRule,
    /// Contribution to the damage mitigation pipeline, if any.
    pub mitigation: Option<(MitigationKind, TagGate)>,
    /// Fired when the status transitions inactive→active.
    pub on_gain: Vec<Reaction>,
    /// Fired when the status transitions active→inactive.
    pub on_expire: Vec<Reaction>,
    /// Fired each turn start while active (stacking weapon/form buffs).
    pub turn_start: Vec<Reaction>,
}

impl StatusDef {
    /// New definition with no caps, no reactions, no decay.
    #[must_use]
    pub fn new(name: impl Into<String>, mode: StatusMode) -> Self {
        Self {
            name: name.into(),
            mode,
            caps: FieldCaps::none(),
            persistent: false,
            decay: DecayRule::default(),
            mitigation: None,
            on_gain: Vec::new(),
            on_expire: Vec::new(),
            turn_start: Vec::new(),
        }
    }

    /// Set field caps.
    #[must_use]
    pub fn with_caps(mut self, caps: FieldCaps) -> Self {
        self.caps = caps;
        self
    }

    /// Mark persistent (survives pruning while inactive).
    #[must_use]
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    /// Set the turn-end decay rule.
    #[must_use]
    pub fn with_decay(mut self, decay: DecayRule) -> Self {
        self.decay = decay;
        self
    }

    /// Set the mitigation contribution.
    #[must_use]
    pub fn with_mitigation(mut self, kind: MitigationKind, gate: TagGate) -> Self {
        self.mitigation = Some((kind, gate));
        self
    }

    /// Set the on-gain reaction table.
    #[must_use]
    pub fn on_gain(mut self, reactions: Vec<Reaction>) -> Self {
        self.on_gain = reactions;
        self
    }

    /// Set the on-expire reaction table.
    #[must_use]
    pub fn on_expire(mut self, reactions: Vec<Reaction>) -> Self {
        self.on_expire = reactions;
        self
    }

    /// Set the turn-start reaction table.
    #[must_use]
    pub fn turn_start(mut self, reactions: Vec<Reaction>) -> Self {
        self.turn_start = reactions;
        self
    }

    /// The field that carries this status's "amount" for mitigation and
    /// default gains.
    #[must_use]
    pub fn amount_field(&self) -> StatusField {
        match self.mode {
            StatusMode::PotencyCount => StatusField::Potency,
            StatusMode::Stack => StatusField::Stack,
            StatusMode::Value => StatusField::Value,
        }
    }

    /// The field spent by `spend_status` effects.
    #[must_use]
    pub fn spend_field(&self) -> StatusField {
        match self.mode {
            StatusMode::PotencyCount => StatusField::Count,
            StatusMode::Stack => StatusField::Stack,
            StatusMode::Value => StatusField::Value,
        }
    }
}

/// Well-known status names.
pub mod names {
    pub const POISON: &str = "poison";
    pub const BURN: &str = "burn";
    pub const REGEN: &str = "regen";
    pub const DOOM: &str = "doom";
    pub const VULNERABLE: &str = "vulnerable";
    pub const FORTIFIED: &str = "fortified";
    pub const STRENGTH: &str = "strength";
    pub const WEAK: &str = "weak";
    pub const DEXTERITY: &str = "dexterity";
    pub const FRAIL: &str = "frail";
    pub const STRAIN: &str = "strain";
    pub const FOCUS: &str = "focus";
    pub const BLOOD_FOCUS: &str = "blood_focus";
    pub const HASTE: &str = "haste";
    pub const SLOW: &str = "slow";
    pub const TAUNT: &str = "taunt";
    pub const ROOT: &str = "root";
    pub const STUN: &str = "stun";
    pub const COVER: &str = "cover";
    pub const BARRIER: &str = "barrier";
    pub const WOUND: &str = "wound";
    pub const PREPARE: &str = "prepare";
    pub const STAGNATE: &str = "stagnate";
    pub const RESIST: &str = "resist";
    pub const ABSORB: &str = "absorb";
    pub const EXPOSED: &str = "exposed";
    pub const IMMUNE: &str = "immune";
    pub const AMMO: &str = "ammo";
}

/// Status definition table for one match.
///
/// The standard table is write-once configuration; character-unique
/// statuses are registered on top of it during match setup.
#[derive(Clone, Debug)]
pub struct StatusRegistry {
    defs: FxHashMap<String, StatusDef>,
    /// Fixed turn-end iteration order for well-known statuses. Registered
    /// unique statuses with a decay step are appended in registration
    /// order, keeping iteration deterministic.
    decay_order: Vec<String>,
    /// Fallback definition for names gained without a registration.
    fallback: StatusDef,
}

impl StatusRegistry {
    /// Build the standard global table.
    #[must_use]
    pub fn standard() -> Self {
        use names::*;
        use DecayStep::*;

        let mut registry = Self {
            defs: FxHashMap::default(),
            decay_order: Vec::new(),
            fallback: StatusDef::new("", StatusMode::PotencyCount),
        };

        let turn_caps = FieldCaps {
            count: Some(9),
            ..FieldCaps::none()
        };

        let defs = vec![
            StatusDef::new(POISON, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule {
                    tick: Some(TickKind::Damage),
                    step: DecrementCount,
                }),
            StatusDef::new(BURN, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule {
                    tick: Some(TickKind::Damage),
                    step: HalveCount,
                }),
            StatusDef::new(REGEN, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule {
                    tick: Some(TickKind::Heal),
                    step: DecrementCount,
                }),
            StatusDef::new(DOOM, StatusMode::Value)
                .persistent()
                .with_decay(DecayRule::step(DecrementValue))
                .on_expire(vec![Reaction::Damage { amount: 9999 }]),
            StatusDef::new(VULNERABLE, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule::step(DecrementCount)),
            StatusDef::new(FORTIFIED, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule::step(DecrementCount)),
            StatusDef::new(STRENGTH, StatusMode::PotencyCount)
                .with_caps(FieldCaps {
                    potency: Some(9),
                    count: Some(9),
                    ..FieldCaps::none()
                })
                .with_decay(DecayRule::step(DecrementCount)),
            StatusDef::new(WEAK, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule::step(DecrementCount)),
            StatusDef::new(DEXTERITY, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule::step(DecrementCount)),
            StatusDef::new(FRAIL, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule::step(DecrementCount)),
            StatusDef::new(STRAIN, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule::step(DecrementCount)),
            StatusDef::new(FOCUS, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule::step(DecrementCount)),
            StatusDef::new(BLOOD_FOCUS, StatusMode::Stack)
                .with_caps(FieldCaps {
                    stack: Some(5),
                    ..FieldCaps::none()
                })
                .with_decay(DecayRule::step(DecrementStack)),
            StatusDef::new(HASTE, StatusMode::PotencyCount)
                .with_caps(FieldCaps {
                    count: Some(3),
                    ..FieldCaps::none()
                })
                .with_decay(DecayRule::step(DecrementCount)),
            StatusDef::new(SLOW, StatusMode::PotencyCount)
                .with_caps(FieldCaps {
                    count: Some(3),
                    ..FieldCaps::none()
                })
                .with_decay(DecayRule::step(DecrementCount)),
            StatusDef::new(TAUNT, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule::step(DecrementCount)),
            StatusDef::new(ROOT, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule::step(DecrementCount)),
            StatusDef::new(STUN, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule::step(DecrementCount)),
            StatusDef::new(WOUND, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule::step(DecrementCount)),
            StatusDef::new(RESIST, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule::step(DecrementCount))
                .with_mitigation(MitigationKind::Resist, TagGate::Any),
            StatusDef::new(ABSORB, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule::step(DecrementCount))
                .with_mitigation(MitigationKind::Absorb, TagGate::Any),
            StatusDef::new(EXPOSED, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule::step(DecrementCount))
                .with_mitigation(MitigationKind::Weakness, TagGate::Any),
            StatusDef::new(IMMUNE, StatusMode::PotencyCount)
                .with_caps(turn_caps)
                .with_decay(DecayRule::step(DecrementCount))
                .with_mitigation(MitigationKind::Immune, TagGate::Any),
            StatusDef::new(COVER, StatusMode::Value)
                .with_caps(FieldCaps {
                    value: Some(3),
                    ..FieldCaps::none()
                })
                .with_decay(DecayRule::step(DecrementValue)),
            StatusDef::new(BARRIER, StatusMode::Value)
                .with_decay(DecayRule::step(DecrementValue)),
            // Consumed at turn start, not by decay
            StatusDef::new(PREPARE, StatusMode::PotencyCount),
            StatusDef::new(STAGNATE, StatusMode::PotencyCount),
            StatusDef::new(AMMO, StatusMode::Value),
        ];

        for def in defs {
            registry.register(def);
        }

        registry
    }

    /// Register a definition (global or character-unique).
    ///
    /// Statuses with a decay step join the turn-end iteration in
    /// registration order.
    pub fn register(&mut self, def: StatusDef) {
        if def.decay.step != DecayStep::None || def.decay.tick.is_some() {
            if !self.decay_order.contains(&def.name) {
                self.decay_order.push(def.name.clone());
            }
        }
        self.defs.insert(def.name.clone(), def);
    }

    /// Look up a definition.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StatusDef> {
        self.defs.get(name)
    }

    /// Look up a definition, falling back to a generic potency/count
    /// status for unregistered names.
    #[must_use]
    pub fn def_or_default(&self, name: &str) -> &StatusDef {
        self.defs.get(name).unwrap_or(&self.fallback)
    }

    /// Is this status on the persistent allow-list?
    #[must_use]
    pub fn is_persistent(&self, name: &str) -> bool {
        self.get(name).is_some_and(|d| d.persistent)
    }

    /// The fixed turn-end decay iteration order.
    #[must_use]
    pub fn decay_order(&self) -> &[String] {
        &self.decay_order
    }
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_has_well_known_statuses() {
        let registry = StatusRegistry::standard();

        assert!(registry.get(names::POISON).is_some());
        assert!(registry.get(names::DOOM).is_some());
        assert!(registry.get(names::COVER).is_some());
        assert!(registry.get("made_up_status").is_none());
    }

    #[test]
    fn test_doom_is_persistent() {
        let registry = StatusRegistry::standard();
        assert!(registry.is_persistent(names::DOOM));
        assert!(!registry.is_persistent(names::POISON));
    }

    #[test]
    fn test_decay_order_starts_with_ticks() {
        let registry = StatusRegistry::standard();
        let order = registry.decay_order();

        // Periodic damage/heal statuses decay first, in declaration order
        assert_eq!(order[0], names::POISON);
        assert_eq!(order[1], names::BURN);
        assert_eq!(order[2], names::REGEN);
        // Prepare is consumed at turn start, never by decay
        assert!(!order.contains(&names::PREPARE.to_string()));
    }

    #[test]
    fn test_register_unique_status_joins_decay_order() {
        let mut registry = StatusRegistry::standard();
        let before = registry.decay_order().len();

        registry.register(
            StatusDef::new("wolf_form", StatusMode::Stack)
                .with_decay(DecayRule::step(DecayStep::DecrementStack)),
        );

        assert_eq!(registry.decay_order().len(), before + 1);
        assert_eq!(registry.decay_order().last().unwrap(), "wolf_form");
    }

    #[test]
    fn test_def_or_default_fallback() {
        let registry = StatusRegistry::standard();
        let def = registry.def_or_default("totally_unknown");
        assert_eq!(def.mode, StatusMode::PotencyCount);
        assert!(!def.persistent);
    }

    #[test]
    fn test_tag_gate_matching() {
        let tags = [TypeTag::Physical];

        assert!(TagGate::Any.matches(&tags));
        assert!(TagGate::Is(TypeTag::Physical).matches(&tags));
        assert!(!TagGate::Is(TypeTag::Fire).matches(&tags));
        assert!(TagGate::Not(TypeTag::Fire).matches(&tags));
        assert!(!TagGate::Not(TypeTag::Physical).matches(&tags));
    }

    #[test]
    fn test_spend_field_by_mode() {
        let registry = StatusRegistry::standard();
        assert_eq!(
            registry.get(names::BLOOD_FOCUS).unwrap().spend_field(),
            crate::status::StatusField::Stack
        );
        assert_eq!(
            registry.get(names::AMMO).unwrap().spend_field(),
            crate::status::StatusField::Value
        );
    }
}
