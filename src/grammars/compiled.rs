use std::collections::{BTreeMap, HashMap};
use std::ops::Deref;

use crate::category::Category;
use crate::error::{CohlResult, Error};
use crate::grammars::keywords::{KeywordMap, Keywords};
use crate::grammars::pattern_set::{PatternSet, Terminator};
use crate::grammars::raw::{ModeRef, RawGrammar, RawMode};
use crate::grammars::regex::Regex;

/// The root mode of every grammar
pub const ROOT_MODE_ID: ModeId = ModeId(0);

/// End pattern of modes that don't declare one: they close as soon as no child matches
pub const IMMEDIATE_END: &str = r"\B|\b";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ModeId(pub u16);

impl ModeId {
    #[inline]
    pub fn as_index(self) -> usize {
        self.0 as usize
    }
}

impl Deref for ModeId {
    type Target = u16;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RegexId(u16);

impl Deref for RegexId {
    type Target = u16;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct KeywordsId(u16);

impl Deref for KeywordsId {
    type Target = u16;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A compiled match rule. Everything it points to lives in the owning grammar tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Mode {
    pub id: ModeId,
    pub category: Option<Category>,
    /// Only the root has no begin
    pub begin: Option<RegexId>,
    /// `None` for the root and for modes that only end with their parent
    pub end: Option<RegexId>,
    pub illegal: Option<RegexId>,
    pub keywords: Option<KeywordsId>,
    pub relevance: u32,
    pub return_begin: bool,
    pub exclude_begin: bool,
    pub return_end: bool,
    pub exclude_end: bool,
    pub ends_parent: bool,
    pub ends_with_parent: bool,
    /// Child modes in priority order. May point back to this mode or to an ancestor.
    pub contains: Vec<ModeId>,
}

impl Mode {
    fn placeholder(id: ModeId) -> Self {
        Self {
            id,
            category: None,
            begin: None,
            end: None,
            illegal: None,
            keywords: None,
            relevance: 0,
            return_begin: false,
            exclude_begin: false,
            return_end: false,
            exclude_end: false,
            ends_parent: false,
            ends_with_parent: false,
            contains: Vec::new(),
        }
    }
}

/// A grammar compiled into flat tables indexed by [`ModeId`], [`RegexId`] and
/// [`KeywordsId`]. Cycles between modes are plain indices.
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    pub name: String,
    pub aliases: Vec<String>,
    pub case_insensitive: bool,
    pub regexes: Vec<Regex>,
    pub keyword_sets: Vec<KeywordMap>,
    pub modes: Vec<Mode>,
}

/// Builds the begin pattern of a `beginKeywords` mode: whole words not part of a dotted path
fn begin_keywords_pattern(words: &str) -> String {
    let alternatives = words.split_whitespace().collect::<Vec<_>>().join("|");
    format!(r"(?<!\.)\b({alternatives})(?!\.)(?=\b|\s)")
}

impl CompiledGrammar {
    pub fn from_raw_grammar(raw: RawGrammar) -> CohlResult<Self> {
        let mut grammar = Self {
            name: raw.name.clone(),
            aliases: raw.aliases.clone(),
            case_insensitive: raw.case_insensitive,
            regexes: Vec::new(),
            keyword_sets: Vec::new(),
            modes: Vec::new(),
        };

        // First pass: reserve a spot for the root and for every named mode (one per variant)
        // so that references can be resolved before the modes themselves are compiled.
        let root_id = grammar.reserve()?;
        debug_assert_eq!(root_id, ROOT_MODE_ID);
        let mut named: HashMap<&str, Vec<ModeId>> = HashMap::new();
        for (name, mode) in &raw.modes {
            let ids = (0..mode.expanded_len())
                .map(|_| grammar.reserve())
                .collect::<CohlResult<_>>()?;
            named.insert(name.as_str(), ids);
        }

        // Second pass: compile everything, wiring references by index
        grammar.compile_into(ROOT_MODE_ID, &raw.root_mode(), &named, true)?;
        for (name, mode) in &raw.modes {
            grammar.compile_variants_into(&named[name.as_str()], mode, &named)?;
        }

        grammar.validate()?;

        #[cfg(feature = "debug")]
        log::trace!(
            "compiled grammar {}: {} modes, {} regexes, {} keyword sets",
            grammar.name,
            grammar.modes.len(),
            grammar.regexes.len(),
            grammar.keyword_sets.len()
        );

        Ok(grammar)
    }

    /// Ids are `u16`: a table can't grow past `u16::MAX` entries
    fn table_id(&self, index: usize, table: &'static str) -> CohlResult<u16> {
        u16::try_from(index).map_err(|_| Error::GrammarTooLarge {
            grammar: self.name.clone(),
            table,
        })
    }

    fn reserve(&mut self) -> CohlResult<ModeId> {
        let id = ModeId(self.table_id(self.modes.len(), "modes")?);
        // push a placeholder to reserve its spot
        self.modes.push(Mode::placeholder(id));
        Ok(id)
    }

    fn compile_variants_into(
        &mut self,
        ids: &[ModeId],
        raw_mode: &RawMode,
        named: &HashMap<&str, Vec<ModeId>>,
    ) -> CohlResult<()> {
        if raw_mode.variants.is_empty() {
            return self.compile_into(ids[0], raw_mode, named, false);
        }
        for (id, variant) in ids.iter().zip(&raw_mode.variants) {
            self.compile_into(*id, &raw_mode.merged_with(variant), named, false)?;
        }
        Ok(())
    }

    /// Compiles an inline mode, returning one id per variant
    fn compile_inline(
        &mut self,
        raw_mode: &RawMode,
        named: &HashMap<&str, Vec<ModeId>>,
    ) -> CohlResult<Vec<ModeId>> {
        let ids: Vec<ModeId> = (0..raw_mode.expanded_len())
            .map(|_| self.reserve())
            .collect::<CohlResult<_>>()?;
        self.compile_variants_into(&ids, raw_mode, named)?;
        Ok(ids)
    }

    fn compile_into(
        &mut self,
        id: ModeId,
        raw_mode: &RawMode,
        named: &HashMap<&str, Vec<ModeId>>,
        is_root: bool,
    ) -> CohlResult<()> {
        let ends_with_parent = raw_mode.ends_with_parent.unwrap_or(false);

        let begin = if is_root {
            None
        } else if let Some(words) = &raw_mode.begin_keywords {
            Some(self.compile_regex(begin_keywords_pattern(words))?)
        } else {
            let pattern = raw_mode.begin.as_deref().unwrap_or(IMMEDIATE_END);
            Some(self.compile_regex(pattern.to_owned())?)
        };

        let end = match &raw_mode.end {
            Some(pattern) => Some(self.compile_regex(pattern.clone())?),
            None if is_root || ends_with_parent => None,
            None => Some(self.compile_regex(IMMEDIATE_END.to_owned())?),
        };

        let keywords = match (&raw_mode.keywords, &raw_mode.begin_keywords) {
            (Some(keywords), _) => Some(self.compile_keywords(keywords)?),
            (None, Some(words)) => Some(self.compile_keywords(&Keywords::from(words.as_str()))?),
            (None, None) => None,
        };

        let relevance = raw_mode.relevance.unwrap_or(if raw_mode.begin_keywords.is_some() {
            0
        } else {
            1
        });

        let illegal = raw_mode
            .illegal
            .as_ref()
            .map(|pattern| self.compile_regex(pattern.clone()))
            .transpose()?;

        let mut contains = Vec::new();
        for mode_ref in raw_mode.contains.iter().flatten() {
            match mode_ref {
                ModeRef::Reference(name) if name == "self" => contains.push(id),
                ModeRef::Reference(name) => {
                    let ids = named
                        .get(name.as_str())
                        .ok_or_else(|| Error::UnknownNamedMode {
                            grammar: self.name.clone(),
                            name: name.clone(),
                        })?;
                    contains.extend(ids.iter().copied());
                }
                ModeRef::Mode(inline) => {
                    let ids = self.compile_inline(inline, named)?;
                    contains.extend(ids);
                }
            }
        }

        self.modes[id.as_index()] = Mode {
            id,
            category: raw_mode.class_name,
            begin,
            end,
            illegal,
            keywords,
            relevance,
            return_begin: raw_mode.return_begin.unwrap_or(false),
            exclude_begin: raw_mode.exclude_begin.unwrap_or(false),
            return_end: raw_mode.return_end.unwrap_or(false),
            exclude_end: raw_mode.exclude_end.unwrap_or(false),
            ends_parent: raw_mode.ends_parent.unwrap_or(false),
            ends_with_parent,
            contains,
        };
        Ok(())
    }

    fn compile_regex(&mut self, pattern: String) -> CohlResult<RegexId> {
        if let Some(idx) = self.regexes.iter().position(|r| r.pattern() == pattern) {
            return Ok(RegexId(self.table_id(idx, "regexes")?));
        }
        let regex_id = RegexId(self.table_id(self.regexes.len(), "regexes")?);
        self.regexes
            .push(Regex::with_case(pattern, self.case_insensitive));
        Ok(regex_id)
    }

    fn compile_keywords(&mut self, keywords: &Keywords) -> CohlResult<KeywordsId> {
        let map = keywords.compile(self.case_insensitive);
        if let Some(idx) = self.keyword_sets.iter().position(|k| *k == map) {
            return Ok(KeywordsId(self.table_id(idx, "keyword sets")?));
        }
        let id = KeywordsId(self.table_id(self.keyword_sets.len(), "keyword sets")?);
        self.keyword_sets.push(map);
        Ok(id)
    }

    /// Makes sure every pattern compiles so tokenizing never meets a broken regex
    fn validate(&self) -> CohlResult<()> {
        let keyword_patterns = self
            .keyword_sets
            .iter()
            .map(|k| Regex::with_case(k.pattern.clone(), self.case_insensitive));
        for regex in self.regexes.iter().cloned().chain(keyword_patterns) {
            regex.validate().map_err(|e| Error::InvalidRegex {
                pattern: regex.pattern().to_owned(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn mode(&self, id: ModeId) -> &Mode {
        &self.modes[id.as_index()]
    }

    pub fn regex(&self, id: RegexId) -> &Regex {
        &self.regexes[*id as usize]
    }

    pub fn keyword_map(&self, id: KeywordsId) -> &KeywordMap {
        &self.keyword_sets[*id as usize]
    }

    /// The words of the root mode, by category. Used by tooling and tests.
    pub fn root_keywords(&self) -> BTreeMap<Category, Vec<String>> {
        let mut out: BTreeMap<Category, Vec<String>> = BTreeMap::new();
        if let Some(id) = self.mode(ROOT_MODE_ID).keywords {
            for (word, data) in self.keyword_map(id).iter() {
                out.entry(data.category).or_default().push(word.to_owned());
            }
        }
        for words in out.values_mut() {
            words.sort();
        }
        out
    }

    /// The pattern a mode ends on, taking `ends_with_parent` into account.
    /// `parent_end` is the terminator end of the parent frame.
    pub fn terminator_end(&self, id: ModeId, parent_end: Option<&str>) -> Option<String> {
        let mode = self.mode(id);
        let own = mode.end.map(|r| self.regex(r).pattern());
        match (own, parent_end) {
            (Some(own), Some(parent)) if mode.ends_with_parent => {
                Some(format!("(?:{own})|(?:{parent})"))
            }
            (None, Some(parent)) if mode.ends_with_parent => Some(parent.to_owned()),
            (own, _) => own.map(str::to_owned),
        }
    }

    /// Builds the terminators of a mode: child begins in order, then the end, then illegal.
    pub fn pattern_set(&self, id: ModeId, terminator_end: Option<&str>) -> Result<PatternSet, String> {
        let mode = self.mode(id);
        let mut items = Vec::with_capacity(mode.contains.len() + 2);
        for child in &mode.contains {
            if let Some(begin) = self.mode(*child).begin {
                items.push((
                    Terminator::Begin(*child),
                    self.regex(begin).pattern().to_owned(),
                ));
            }
        }
        if let Some(end) = terminator_end {
            items.push((Terminator::End, end.to_owned()));
        }
        if let Some(illegal) = mode.illegal {
            items.push((Terminator::Illegal, self.regex(illegal).pattern().to_owned()));
        }
        PatternSet::new(items, self.case_insensitive)
    }
}
