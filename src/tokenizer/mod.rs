//! The lexeme loop of highlight.js, run over a [`CompiledGrammar`].
//!
//! Modes are entered and left on terminator matches; the text between terminators is buffered
//! and flushed in the current mode, where it's scanned for keywords.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::grammars::{
    CompiledGrammar, KeywordsId, ModeId, PatternSet, PatternSetMatch, Regex, Terminator,
};
use crate::tokenizer::stack::{Frame, ModeStack};

mod stack;

/// Past that many iterations, a loop that isn't moving forward is considered stuck
const MAX_ITERATIONS: usize = 100_000;
/// The same keyword stops adding relevance after that many hits
const MAX_KEYWORD_HITS: u32 = 7;

/// A span of text classified by a mode or a keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub category: Category,
    /// Byte span within the whole input
    pub span: Range<usize>,
    /// Number of regions enclosing this one
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Byte span within the whole input (start inclusive, end exclusive)
    pub span: Range<usize>,
    /// Categories of the enclosing regions, ordered from outermost to innermost.
    /// Empty for plain text.
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tokenized {
    /// Every non-empty region, in the order they were opened
    pub regions: Vec<Region>,
    /// Contiguous leaf segments covering the whole input
    pub tokens: Vec<Token>,
    /// How much the input looks like the grammar language
    pub relevance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    /// A mode `illegal` pattern matched: the grammar doesn't apply to that input
    Illegal { position: usize, lexeme: String },
    /// The grammar kept matching without moving forward
    RunawayLoop { position: usize },
    /// A terminator set failed to compile
    Regex(String),
}

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizeError::Illegal { position, lexeme } => {
                write!(f, "illegal lexeme {:?} at byte {}", lexeme, position)
            }
            TokenizeError::RunawayLoop { position } => {
                write!(f, "grammar stopped advancing at byte {}", position)
            }
            TokenizeError::Regex(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for TokenizeError {}

/// Collects the output while the loop runs.
/// `last_end_pos` is the start of the pending buffer: everything before it has been emitted.
#[derive(Debug, Clone, Default)]
struct TokenAccumulator {
    regions: Vec<Region>,
    tokens: Vec<Token>,
    /// Indices in `regions` of the regions still open, outermost first
    open: Vec<usize>,
    last_end_pos: usize,
    relevance: u32,
    keyword_hits: HashMap<String, u32>,
}

impl TokenAccumulator {
    fn produce(&mut self, end_pos: usize, keyword: Option<Category>) {
        // Skip empty tokens (zero-width matches)
        if self.last_end_pos >= end_pos {
            return;
        }

        let mut categories: Vec<Category> =
            self.open.iter().map(|i| self.regions[*i].category).collect();
        categories.extend(keyword);

        #[cfg(feature = "debug")]
        log::trace!(
            "[produce]: [{}..{end_pos}] {:?}",
            self.last_end_pos,
            categories
        );

        match self.tokens.last_mut() {
            Some(last) if last.span.end == self.last_end_pos && last.categories == categories => {
                last.span.end = end_pos;
            }
            _ => self.tokens.push(Token {
                span: self.last_end_pos..end_pos,
                categories,
            }),
        }
        self.last_end_pos = end_pos;
    }

    /// Emits `start..end` as a keyword of the given category
    fn keyword(&mut self, start: usize, end: usize, category: Category) {
        self.produce(start, None);
        self.regions.push(Region {
            category,
            span: start..end,
            depth: self.open.len(),
        });
        self.produce(end, Some(category));
    }

    fn open(&mut self, category: Category) -> usize {
        let idx = self.regions.len();
        self.regions.push(Region {
            category,
            span: self.last_end_pos..self.last_end_pos,
            depth: self.open.len(),
        });
        self.open.push(idx);
        idx
    }

    fn close(&mut self, region: usize) {
        self.regions[region].span.end = self.last_end_pos;
        if let Some(pos) = self.open.iter().rposition(|i| *i == region) {
            self.open.truncate(pos);
        }
    }

    fn hit(&mut self, word: String, relevance: u32) {
        let hits = self.keyword_hits.entry(word).or_default();
        *hits += 1;
        if *hits <= MAX_KEYWORD_HITS {
            self.relevance += relevance;
        }
    }

    fn finalize(mut self) -> Tokenized {
        self.regions.retain(|r| !r.span.is_empty());
        Tokenized {
            regions: self.regions,
            tokens: self.tokens,
            relevance: self.relevance,
        }
    }
}

fn next_char_boundary(text: &str, pos: usize) -> Option<usize> {
    text[pos..].chars().next().map(|c| pos + c.len_utf8())
}

#[derive(Debug)]
pub struct Tokenizer<'g> {
    grammar: &'g CompiledGrammar,
    /// Terminator sets by mode and resolved end pattern: a mode ending with its parent
    /// gets a different set depending on where it's nested
    pattern_cache: HashMap<(ModeId, Option<String>), PatternSet>,
    keyword_regexes: HashMap<KeywordsId, Regex>,
}

impl<'g> Tokenizer<'g> {
    pub fn new(grammar: &'g CompiledGrammar) -> Self {
        Self {
            grammar,
            pattern_cache: HashMap::new(),
            keyword_regexes: HashMap::new(),
        }
    }

    fn find_terminator(
        &mut self,
        frame: &Frame,
        text: &str,
        pos: usize,
    ) -> Result<Option<PatternSetMatch>, TokenizeError> {
        let pattern_set = match self
            .pattern_cache
            .entry((frame.mode, frame.terminator_end.clone()))
        {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let set = self
                    .grammar
                    .pattern_set(frame.mode, frame.terminator_end.as_deref())
                    .map_err(TokenizeError::Regex)?;
                e.insert(set)
            }
        };
        Ok(pattern_set.find_at(text, pos))
    }

    /// Flushes the buffer up to `to` in the given mode, highlighting its keywords
    fn process_buffer(&mut self, text: &str, to: usize, mode: ModeId, acc: &mut TokenAccumulator) {
        let start = acc.last_end_pos;
        if to <= start {
            return;
        }
        let grammar = self.grammar;
        let Some(keywords_id) = grammar.mode(mode).keywords else {
            acc.produce(to, None);
            return;
        };
        let keywords = grammar.keyword_map(keywords_id);
        let re = self
            .keyword_regexes
            .entry(keywords_id)
            .or_insert_with(|| Regex::with_case(keywords.pattern.clone(), keywords.case_insensitive));

        // Words are looked for in the buffer alone, like highlight.js does
        let buffer = &text[start..to];
        let mut pos = 0;
        while let Some((word_start, word_end)) = re.find_at(buffer, pos) {
            if word_start == word_end {
                match next_char_boundary(buffer, word_start) {
                    Some(next) => {
                        pos = next;
                        continue;
                    }
                    None => break,
                }
            }
            let word = &buffer[word_start..word_end];
            if let Some(data) = keywords.get(word) {
                acc.keyword(start + word_start, start + word_end, data.category);
                let key = if keywords.case_insensitive {
                    word.to_lowercase()
                } else {
                    word.to_owned()
                };
                acc.hit(key, data.relevance);
            }
            pos = word_end;
        }
        acc.produce(to, None);
    }

    /// Depth of the frame an end match at `pos` closes, if any
    fn end_of_mode(&self, stack: &ModeStack, text: &str, pos: usize) -> Option<usize> {
        let mut depth = stack.len() - 1;
        loop {
            let mode = self.grammar.mode(stack.get(depth).mode);
            if let Some(end) = mode.end
                && self.grammar.regex(end).match_at(text, pos).is_some()
            {
                while depth > 1 && self.grammar.mode(stack.get(depth).mode).ends_parent {
                    depth -= 1;
                }
                return Some(depth);
            }
            if mode.ends_with_parent && depth > 1 {
                depth -= 1;
            } else {
                return None;
            }
        }
    }

    /// Enters `child`, returning where scanning resumes
    fn begin_match(
        &mut self,
        text: &str,
        m: &PatternSetMatch,
        child: ModeId,
        stack: &mut ModeStack,
        acc: &mut TokenAccumulator,
    ) -> usize {
        let grammar = self.grammar;
        let mode = grammar.mode(child);
        #[cfg(feature = "debug")]
        log::trace!(
            "[begin_match] {:?} entering {:?} ({:?})",
            &text[m.start..m.end],
            child,
            mode.category
        );

        let flush_to = if mode.exclude_begin { m.end } else { m.start };
        self.process_buffer(text, flush_to, stack.top().mode, acc);
        let region = mode.category.map(|category| acc.open(category));
        stack.push(grammar, child, region);

        if mode.return_begin && !mode.exclude_begin {
            m.start
        } else {
            m.end
        }
    }

    /// Leaves the mode(s) an end match closes, returning where scanning resumes.
    /// Returns `None` when no open mode owns that end: the lexeme is then plain text.
    fn end_match(
        &mut self,
        text: &str,
        m: &PatternSetMatch,
        stack: &mut ModeStack,
        acc: &mut TokenAccumulator,
    ) -> Option<usize> {
        let grammar = self.grammar;
        let depth = self.end_of_mode(stack, text, m.start)?;
        let origin = grammar.mode(stack.top().mode);
        #[cfg(feature = "debug")]
        log::trace!(
            "[end_match] {:?} closes {} mode(s)",
            &text[m.start..m.end],
            stack.len() - depth
        );

        let flush_to = if origin.return_end || origin.exclude_end {
            m.start
        } else {
            m.end
        };
        let resume = if origin.return_end { m.start } else { m.end };
        self.process_buffer(text, flush_to, origin.id, acc);

        while stack.len() > depth {
            let Some(frame) = stack.pop() else {
                break;
            };
            if let Some(region) = frame.region {
                acc.close(region);
            }
            acc.relevance += grammar.mode(frame.mode).relevance;
        }
        Some(resume)
    }

    pub fn tokenize(&mut self, text: &str) -> Result<Tokenized, TokenizeError> {
        let mut stack = ModeStack::new();
        let mut acc = TokenAccumulator::default();
        let mut pos = 0;
        let mut iterations = 0;
        // start of the previous match, when it was a begin
        let mut last_begin: Option<usize> = None;

        loop {
            iterations += 1;
            let top = stack.top().clone();
            let Some(m) = self.find_terminator(&top, text, pos)? else {
                #[cfg(feature = "debug")]
                log::trace!("[tokenize] no more matches after {pos}");
                break;
            };
            if iterations > MAX_ITERATIONS && iterations > m.start * 3 {
                return Err(TokenizeError::RunawayLoop { position: m.start });
            }

            let previous_begin = last_begin.take();
            match m.terminator {
                Terminator::Begin(child) => {
                    last_begin = Some(m.start);
                    pos = self.begin_match(text, &m, child, &mut stack, &mut acc);
                }
                Terminator::Illegal => {
                    return Err(TokenizeError::Illegal {
                        position: m.start,
                        lexeme: text[m.start..m.end].to_owned(),
                    });
                }
                Terminator::End => {
                    // A mode ending right where it began would close without consuming anything:
                    // keep it open and move one character forward instead
                    let stalled = previous_begin == Some(m.start) && m.start == m.end;
                    let resume = if stalled {
                        None
                    } else {
                        self.end_match(text, &m, &mut stack, &mut acc)
                    };
                    pos = match resume {
                        Some(resume) => resume,
                        None if m.end > m.start => m.end,
                        None => match next_char_boundary(text, m.start) {
                            Some(next) => next,
                            None => break,
                        },
                    };
                }
            }
        }

        self.process_buffer(text, text.len(), stack.top().mode, &mut acc);
        // Unterminated modes run to the end of the input
        while let Some(frame) = stack.pop() {
            if let Some(region) = frame.region {
                acc.close(region);
            }
        }

        Ok(acc.finalize())
    }
}
