//! Card definitions, instances, and the free-text normalization
//! boundary.

pub mod adapter;
pub mod definition;
pub mod instance;

pub use adapter::{effect_list, EffectLineAdapter, NullAdapter};
pub use definition::{
    CardDefId, CardDefinition, CardKind, CardLibrary, CostSpec, Keywords, PowerSpec, Restriction,
    TargetSpec, Transform, TypeTag,
};
pub use instance::CardInstance;
