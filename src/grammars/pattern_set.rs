use std::fmt::{Debug, Formatter};

use onig::{RegSet, RegexOptions, SearchOptions};

use crate::grammars::ModeId;
use crate::grammars::regex::{ascii_classes, regex_options};

/// What a terminator of a mode does when it matches
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Terminator {
    /// The begin pattern of a child mode
    Begin(ModeId),
    /// The end of the current mode, or of one of its ancestors for `ends_with_parent` modes
    End,
    /// A lexeme that invalidates highlighting
    Illegal,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PatternSetMatch {
    pub terminator: Terminator,
    pub start: usize,
    pub end: usize,
}

/// All the terminators of a mode compiled into a single onig RegSet.
///
/// The RegSet is searched with `RegSetLead::Position`: the leftmost match wins and, among
/// patterns matching at the same position, the one added first.
pub struct PatternSet {
    terminators: Vec<Terminator>,
    regset: Option<RegSet>,
}

impl PatternSet {
    pub fn new(items: Vec<(Terminator, String)>, case_insensitive: bool) -> Result<Self, String> {
        if items.is_empty() {
            return Ok(Self {
                terminators: Vec::new(),
                regset: None,
            });
        }

        let (terminators, patterns): (Vec<_>, Vec<_>) = items.into_iter().unzip();
        let patterns: Vec<String> = patterns.iter().map(|p| ascii_classes(p)).collect();
        let pattern_strs: Vec<&str> = patterns.iter().map(|s| s.as_str()).collect();

        let regset = RegSet::with_options(
            &pattern_strs,
            RegexOptions::REGEX_OPTION_CAPTURE_GROUP | regex_options(case_insensitive),
        )
        .map_err(|e| {
            format!(
                "Failed to compile pattern set with {} patterns: {:?}",
                pattern_strs.len(),
                e
            )
        })?;

        Ok(Self {
            terminators,
            regset: Some(regset),
        })
    }

    pub fn len(&self) -> usize {
        self.terminators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminators.is_empty()
    }

    pub(crate) fn find_at(&self, text: &str, pos: usize) -> Option<PatternSetMatch> {
        let regset = self.regset.as_ref()?;

        // We need to specify pos/text.len() because some patterns look behind
        if let Some((pattern_index, captures)) = regset.captures_with_options(
            text,       // Full text (not sliced)
            pos,        // Start searching from this position
            text.len(), // Search to end of text
            onig::RegSetLead::Position,
            SearchOptions::SEARCH_OPTION_NONE,
        ) && let Some((start, end)) = captures.pos(0)
        {
            return Some(PatternSetMatch {
                terminator: self.terminators[pattern_index],
                start,
                end,
            });
        }

        None
    }
}

impl Debug for PatternSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PatternSet({} terminators)", self.terminators.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leftmost_match_wins() {
        let set = PatternSet::new(
            vec![
                (Terminator::Begin(ModeId(1)), "b".to_string()),
                (Terminator::End, "a".to_string()),
            ],
            false,
        )
        .unwrap();
        let m = set.find_at("xab", 0).unwrap();
        assert_eq!(m.terminator, Terminator::End);
        assert_eq!((m.start, m.end), (1, 2));
    }

    #[test]
    fn earlier_pattern_wins_at_same_position() {
        let set = PatternSet::new(
            vec![
                (Terminator::Begin(ModeId(1)), r"\(".to_string()),
                (Terminator::End, r"[(]|$".to_string()),
            ],
            false,
        )
        .unwrap();
        let m = set.find_at("f(x)", 0).unwrap();
        assert_eq!(m.terminator, Terminator::Begin(ModeId(1)));
        assert_eq!((m.start, m.end), (1, 2));
    }

    #[test]
    fn word_boundaries_are_ascii() {
        let set = PatternSet::new(
            vec![(Terminator::Begin(ModeId(1)), r"\b\w+".to_string())],
            false,
        )
        .unwrap();
        let m = set.find_at("héllo", 1).unwrap();
        assert_eq!((m.start, m.end), (3, 6));
    }

    #[test]
    fn empty_set_never_matches() {
        let set = PatternSet::new(vec![], false).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.find_at("anything", 0), None);
    }
}
