//! Free-text effect normalization boundary.
//!
//! Legacy cards carry un-structured text lines instead of a structured
//! effect list. The parser that interprets those lines lives *outside*
//! the core; it reaches the engine only through this narrow adapter
//! interface, producing the same [`TimedEffect`] variant type the primary
//! interpreter consumes. The core state machine never sees raw text.

use crate::cards::definition::CardDefinition;
use crate::effects::TimedEffect;

/// Narrow normalization interface implemented by the external text
/// parser.
pub trait EffectLineAdapter {
    /// Normalize one text line into a structured effect, or `None` if the
    /// line is not understood.
    fn normalize(&self, line: &str) -> Option<TimedEffect>;
}

/// Adapter that understands nothing. Cards without structured effects
/// resolve with no effects under this adapter.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAdapter;

impl EffectLineAdapter for NullAdapter {
    fn normalize(&self, _line: &str) -> Option<TimedEffect> {
        None
    }
}

/// The effect list the interpreter will run for a definition.
///
/// The structured list is preferred; text lines are consulted only when
/// it is empty. Unparsed lines are skipped (and traced), never guessed.
#[must_use]
pub fn effect_list(def: &CardDefinition, adapter: &dyn EffectLineAdapter) -> Vec<TimedEffect> {
    if !def.effects.is_empty() {
        return def.effects.clone();
    }

    let mut out = Vec::new();
    for line in &def.text_lines {
        match adapter.normalize(line) {
            Some(effect) => out.push(effect),
            None => log::debug!("card '{}': unparsed effect line '{line}'", def.name),
        }
    }
    out
}
