use std::fmt;
use std::sync::{Arc, OnceLock};

use onig::{RegexOptions, SearchOptions, Syntax};
use serde::{Deserialize, Serialize};

/// A regex wrapper that serializes as a string but compiles lazily at runtime
pub struct Regex {
    pattern: String,
    case_insensitive: bool,
    compiled: OnceLock<Option<Arc<onig::Regex>>>,
}

impl Clone for Regex {
    fn clone(&self) -> Self {
        // Create a new regex with the same pattern but fresh lazy compilation
        Regex::with_case(self.pattern.clone(), self.case_insensitive)
    }
}

impl PartialEq for Regex {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.case_insensitive == other.case_insensitive
    }
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

pub(crate) fn regex_options(case_insensitive: bool) -> RegexOptions {
    if case_insensitive {
        RegexOptions::REGEX_OPTION_IGNORECASE
    } else {
        RegexOptions::REGEX_OPTION_NONE
    }
}

const WORD: &str = "0-9A-Za-z_";

/// Rewrites `\w`, `\W`, `\d`, `\D`, `\b` and `\B` to their ASCII meaning.
///
/// Oniguruma treats them as Unicode classes while grammars are written for JavaScript regexes,
/// where `é` is not a word character.
pub(crate) fn ascii_classes(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    // nesting depth of character classes
    let mut class_depth = 0usize;
    // a `]` right after `[` or `[^` is a literal
    let mut class_start = false;

    while let Some(c) = chars.next() {
        let at_class_start = std::mem::take(&mut class_start);
        match c {
            '\\' => {
                let Some(escaped) = chars.next() else {
                    out.push(c);
                    break;
                };
                let in_class = class_depth > 0;
                match (escaped, in_class) {
                    ('w', false) => out.push_str(&format!("[{WORD}]")),
                    ('w', true) => out.push_str(WORD),
                    ('W', _) => out.push_str(&format!("[^{WORD}]")),
                    ('d', false) => out.push_str("[0-9]"),
                    ('d', true) => out.push_str("0-9"),
                    ('D', _) => out.push_str("[^0-9]"),
                    ('b', false) => out.push_str(&format!(
                        "(?:(?<=[{WORD}])(?![{WORD}])|(?<![{WORD}])(?=[{WORD}]))"
                    )),
                    ('B', false) => out.push_str(&format!(
                        "(?:(?<=[{WORD}])(?=[{WORD}])|(?<![{WORD}])(?![{WORD}]))"
                    )),
                    _ => {
                        out.push(c);
                        out.push(escaped);
                    }
                }
            }
            '[' => {
                class_depth += 1;
                out.push(c);
                if chars.peek() == Some(&'^') {
                    chars.next();
                    out.push('^');
                }
                class_start = true;
            }
            ']' if class_depth > 0 && !at_class_start => {
                class_depth -= 1;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

impl Regex {
    pub fn new(pattern: String) -> Self {
        Self::with_case(pattern, false)
    }

    pub fn with_case(pattern: String, case_insensitive: bool) -> Self {
        Self {
            pattern,
            case_insensitive,
            compiled: OnceLock::new(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    fn build(&self) -> Result<onig::Regex, onig::Error> {
        // Ruby syntax: `^`/`$` are line anchors and `.` stops at newlines, which is what
        // highlight.js gets from its `m` flag
        onig::Regex::with_options(
            &ascii_classes(&self.pattern),
            regex_options(self.case_insensitive),
            Syntax::ruby(),
        )
    }

    pub fn compiled(&self) -> Option<&Arc<onig::Regex>> {
        self.compiled
            .get_or_init(|| self.build().ok().map(Arc::new))
            .as_ref()
    }

    /// Validate that this regex pattern compiles successfully
    pub fn validate(&self) -> Result<(), onig::Error> {
        self.build().map(|_| ())
    }

    /// Length of the match starting exactly at `pos`, if any.
    pub fn match_at(&self, text: &str, pos: usize) -> Option<usize> {
        self.compiled()?
            .match_with_options(text, pos, SearchOptions::SEARCH_OPTION_NONE, None)
    }

    /// Leftmost match at or after `pos`, as absolute byte offsets.
    pub fn find_at(&self, text: &str, pos: usize) -> Option<(usize, usize)> {
        let re = self.compiled()?;
        let mut region = onig::Region::new();
        re.search_with_options(
            text,
            pos,
            text.len(),
            SearchOptions::SEARCH_OPTION_NONE,
            Some(&mut region),
        )?;
        region.pos(0)
    }
}

impl Serialize for Regex {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.pattern)
    }
}

impl<'de> Deserialize<'de> for Regex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let pattern = String::deserialize(deserializer)?;
        Ok(Regex::new(pattern))
    }
}
