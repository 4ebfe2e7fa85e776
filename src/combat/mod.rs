//! Zone stack & clash resolver.

pub mod clash;
pub mod zones;

pub use clash::resolve_zone;
pub use zones::{SpeedTier, StackEntry, Zone, ZoneStack};
