//! Card definitions and the per-match card library.
//!
//! A `CardDefinition` is static content: the engine consumes it from the
//! external card database and never mutates it. Mutable per-copy state
//! lives on [`crate::cards::CardInstance`].

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::combat::SpeedTier;
use crate::effects::{Predicate, TimedEffect};

/// Unique identifier for a card definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardDefId(pub u32);

impl CardDefId {
    /// Create a new card definition ID.
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

impl std::fmt::Display for CardDefId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CardDef({})", self.0)
    }
}

/// Damage/effect type tags, used by tag-gated mitigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Physical,
    Fire,
    Ice,
    Lightning,
    Arcane,
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TypeTag::Physical => "Physical",
            TypeTag::Fire => "Fire",
            TypeTag::Ice => "Ice",
            TypeTag::Lightning => "Lightning",
            TypeTag::Arcane => "Arcane",
        };
        f.write_str(s)
    }
}

/// Card kind, driving pairwise clash semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardKind {
    Attack,
    Defense,
    Skill,
}

/// Who a card may target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSpec {
    /// One enemy (subject to taunt override and redirects).
    Enemy,
    /// One ally.
    Ally,
    /// The acting character only.
    Self_,
    /// Every living enemy (never redirected).
    AllEnemies,
    /// Every living ally (never redirected).
    AllAllies,
    /// No target at all.
    None,
}

impl TargetSpec {
    /// Strictly single-target specs are subject to taunt and redirect.
    #[must_use]
    pub fn is_single_target(self) -> bool {
        matches!(self, TargetSpec::Enemy | TargetSpec::Ally)
    }

    /// Area specs expand to a whole side.
    #[must_use]
    pub fn is_area(self) -> bool {
        matches!(self, TargetSpec::AllEnemies | TargetSpec::AllAllies)
    }
}

/// Energy cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostSpec {
    Fixed(i32),
    /// Player chooses X at play time; X energy is spent.
    X,
}

/// Printed power.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerSpec {
    /// No power (most skills).
    None,
    Fixed(i32),
    /// Rolled inclusively through the match RNG at play time.
    Range(i32, i32),
}

/// Keyword set on a card.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keywords {
    /// Zero net damage after shield suppresses the hit and makes this
    /// defense reusable.
    pub evade: bool,
    /// Zero net damage after shield opens a one-action counter window.
    pub counter: bool,
    /// Stays in the zone after resolving instead of being discarded.
    pub reuse: bool,
    /// Cancels the opposing card in the same pairwise comparison.
    pub negate: bool,
    /// Adds the base target's adjacent allies.
    pub splash: bool,
    /// Picks N extra random adjacent targets through the RNG.
    pub bounce: Option<u32>,
    /// Explicit redirect: move the effect onto a different member of the
    /// target's team, player-chosen among legal candidates.
    pub redirect: bool,
}

/// A status gate checked before the card may be played.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Restriction {
    /// Actor must have the status active.
    Require { status: String },
    /// Actor must not have the status active.
    Forbid { status: String },
}

/// Conditional card substitution checked when the card is played.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    pub when: Predicate,
    pub into: CardDefId,
}

/// Static definition of a card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: CardDefId,
    pub name: String,
    pub cost: CostSpec,
    pub power: PowerSpec,
    pub speed: SpeedTier,
    pub kind: CardKind,
    pub tags: SmallVec<[TypeTag; 2]>,
    pub target: TargetSpec,
    pub keywords: Keywords,
    /// Structured effect list (preferred path).
    pub effects: Vec<TimedEffect>,
    /// Legacy free-text effect lines, normalized through the adapter.
    pub text_lines: Vec<String>,
    pub transforms: Vec<Transform>,
    pub restrictions: Vec<Restriction>,
}

impl CardDefinition {
    /// Minimal definition; customize with the builder methods.
    #[must_use]
    pub fn new(id: CardDefId, name: impl Into<String>, kind: CardKind) -> Self {
        Self {
            id,
            name: name.into(),
            cost: CostSpec::Fixed(1),
            power: PowerSpec::None,
            speed: SpeedTier::Normal,
            kind,
            tags: SmallVec::new(),
            target: match kind {
                CardKind::Attack => TargetSpec::Enemy,
                CardKind::Defense | CardKind::Skill => TargetSpec::Self_,
            },
            keywords: Keywords::default(),
            effects: Vec::new(),
            text_lines: Vec::new(),
            transforms: Vec::new(),
            restrictions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_cost(mut self, cost: CostSpec) -> Self {
        self.cost = cost;
        self
    }

    #[must_use]
    pub fn with_power(mut self, power: PowerSpec) -> Self {
        self.power = power;
        self
    }

    #[must_use]
    pub fn with_speed(mut self, speed: SpeedTier) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = TypeTag>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: TargetSpec) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn with_keywords(mut self, keywords: Keywords) -> Self {
        self.keywords = keywords;
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: Vec<TimedEffect>) -> Self {
        self.effects = effects;
        self
    }

    #[must_use]
    pub fn with_text_lines(mut self, lines: Vec<String>) -> Self {
        self.text_lines = lines;
        self
    }

    #[must_use]
    pub fn with_transforms(mut self, transforms: Vec<Transform>) -> Self {
        self.transforms = transforms;
        self
    }

    #[must_use]
    pub fn with_restrictions(mut self, restrictions: Vec<Restriction>) -> Self {
        self.restrictions = restrictions;
        self
    }
}

/// The per-match read-only card library.
#[derive(Clone, Debug, Default)]
pub struct CardLibrary {
    defs: FxHashMap<CardDefId, CardDefinition>,
    by_name: FxHashMap<String, CardDefId>,
}

impl CardLibrary {
    /// Create an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition. Later registrations win on name collisions.
    pub fn add(&mut self, def: CardDefinition) {
        self.by_name.insert(def.name.clone(), def.id);
        self.defs.insert(def.id, def);
    }

    /// Look up by id.
    #[must_use]
    pub fn get(&self, id: CardDefId) -> Option<&CardDefinition> {
        self.defs.get(&id)
    }

    /// Look up by printed name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&CardDefinition> {
        self.by_name.get(name).and_then(|id| self.defs.get(id))
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Effect;

    #[test]
    fn test_definition_builder() {
        let def = CardDefinition::new(CardDefId::new(1), "Slash", CardKind::Attack)
            .with_cost(CostSpec::Fixed(2))
            .with_power(PowerSpec::Range(8, 12))
            .with_speed(SpeedTier::Fast)
            .with_tags([TypeTag::Physical])
            .with_effects(vec![TimedEffect::on_use(Effect::power_damage())]);

        assert_eq!(def.name, "Slash");
        assert_eq!(def.cost, CostSpec::Fixed(2));
        assert_eq!(def.target, TargetSpec::Enemy); // Attack default
        assert_eq!(def.tags.as_slice(), &[TypeTag::Physical]);
    }

    #[test]
    fn test_defense_defaults_to_self_target() {
        let def = CardDefinition::new(CardDefId::new(2), "Parry", CardKind::Defense);
        assert_eq!(def.target, TargetSpec::Self_);
    }

    #[test]
    fn test_target_spec_classification() {
        assert!(TargetSpec::Enemy.is_single_target());
        assert!(TargetSpec::Ally.is_single_target());
        assert!(!TargetSpec::Self_.is_single_target());
        assert!(TargetSpec::AllEnemies.is_area());
        assert!(!TargetSpec::Enemy.is_area());
    }

    #[test]
    fn test_library_lookup() {
        let mut library = CardLibrary::new();
        library.add(CardDefinition::new(CardDefId::new(1), "Slash", CardKind::Attack));
        library.add(CardDefinition::new(CardDefId::new(2), "Parry", CardKind::Defense));

        assert_eq!(library.len(), 2);
        assert_eq!(library.get(CardDefId::new(1)).unwrap().name, "Slash");
        assert_eq!(library.by_name("Parry").unwrap().id, CardDefId::new(2));
        assert!(library.by_name("Missing").is_none());
    }
}
