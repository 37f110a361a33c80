//! Grammars shipped with cohl

use crate::error::CohlResult;
use crate::registry::Registry;

pub mod co;

/// Registers every builtin language under its usual tag
pub fn register_builtin_languages(registry: &mut Registry) -> CohlResult<()> {
    registry.register_language(co::CO_TAG, co::grammar(co::CoVersion::Current))
}
