pub mod common;
mod compiled;
mod keywords;
mod pattern_set;
mod raw;
mod regex;

pub use compiled::*;
pub use keywords::{DEFAULT_KEYWORD_PATTERN, KeywordData, KeywordMap, Keywords};
pub use pattern_set::{PatternSet, PatternSetMatch, Terminator};
pub use raw::{ModeRef, RawGrammar, RawMode};
pub use regex::Regex;
