use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::CohlResult;
use crate::grammars::compiled::CompiledGrammar;
use crate::grammars::keywords::Keywords;

/// An entry of a mode `contains` list
///
/// # Examples
/// ```json
/// [
///   "self",
///   "PARAMS",
///   { "className": "string", "begin": "\"", "end": "\"" }
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModeRef {
    /// `"self"` or the name of a mode in the grammar `modes` table
    Reference(String),
    Mode(Box<RawMode>),
}

impl ModeRef {
    pub fn self_() -> Self {
        ModeRef::Reference("self".to_owned())
    }

    pub fn named(name: &str) -> Self {
        ModeRef::Reference(name.to_owned())
    }
}

impl From<RawMode> for ModeRef {
    fn from(mode: RawMode) -> Self {
        ModeRef::Mode(Box::new(mode))
    }
}

/// A rule recognizing a span of text, in the shape highlight.js uses.
///
/// Every field is optional so that a variant can override only some of its parent fields.
///
/// # Examples
/// ```json
/// {
///   "className": "params",
///   "begin": "\\(",
///   "end": "\\)",
///   "endsParent": true,
///   "relevance": 0,
///   "contains": ["FUN_TYPE"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin: Option<String>,
    /// Space separated words; generates the begin pattern and becomes the mode keywords
    /// unless the mode has its own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin_keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_begin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_begin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_end: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_end: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_parent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_with_parent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Keywords>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub illegal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains: Option<Vec<ModeRef>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<RawMode>,
}

impl RawMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(mut self, category: Category) -> Self {
        self.class_name = Some(category);
        self
    }

    pub fn begin(mut self, pattern: &str) -> Self {
        self.begin = Some(pattern.to_owned());
        self
    }

    pub fn begin_keywords(mut self, words: &str) -> Self {
        self.begin_keywords = Some(words.to_owned());
        self
    }

    pub fn end(mut self, pattern: &str) -> Self {
        self.end = Some(pattern.to_owned());
        self
    }

    /// The begin lexeme is not consumed: it is scanned again inside the new mode
    pub fn return_begin(mut self) -> Self {
        self.return_begin = Some(true);
        self
    }

    /// The begin lexeme stays outside of the mode span
    pub fn exclude_begin(mut self) -> Self {
        self.exclude_begin = Some(true);
        self
    }

    /// The end lexeme is not consumed: it is scanned again in the parent mode
    pub fn return_end(mut self) -> Self {
        self.return_end = Some(true);
        self
    }

    /// The end lexeme stays outside of the mode span and goes back to the parent
    pub fn exclude_end(mut self) -> Self {
        self.exclude_end = Some(true);
        self
    }

    /// Ending this mode also ends its parent
    pub fn ends_parent(mut self) -> Self {
        self.ends_parent = Some(true);
        self
    }

    /// The mode also ends whenever its parent would
    pub fn ends_with_parent(mut self) -> Self {
        self.ends_with_parent = Some(true);
        self
    }

    pub fn keywords(mut self, keywords: impl Into<Keywords>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    pub fn illegal(mut self, pattern: &str) -> Self {
        self.illegal = Some(pattern.to_owned());
        self
    }

    pub fn relevance(mut self, relevance: u32) -> Self {
        self.relevance = Some(relevance);
        self
    }

    pub fn contains(mut self, modes: Vec<ModeRef>) -> Self {
        self.contains = Some(modes);
        self
    }

    pub fn variants(mut self, variants: Vec<RawMode>) -> Self {
        self.variants = variants;
        self
    }

    /// The mode a variant stands for: our fields, overridden by whatever the variant sets.
    pub(crate) fn merged_with(&self, variant: &RawMode) -> RawMode {
        RawMode {
            class_name: variant.class_name.or(self.class_name),
            begin: variant.begin.clone().or_else(|| self.begin.clone()),
            begin_keywords: variant
                .begin_keywords
                .clone()
                .or_else(|| self.begin_keywords.clone()),
            end: variant.end.clone().or_else(|| self.end.clone()),
            return_begin: variant.return_begin.or(self.return_begin),
            exclude_begin: variant.exclude_begin.or(self.exclude_begin),
            return_end: variant.return_end.or(self.return_end),
            exclude_end: variant.exclude_end.or(self.exclude_end),
            ends_parent: variant.ends_parent.or(self.ends_parent),
            ends_with_parent: variant.ends_with_parent.or(self.ends_with_parent),
            keywords: variant.keywords.clone().or_else(|| self.keywords.clone()),
            illegal: variant.illegal.clone().or_else(|| self.illegal.clone()),
            relevance: variant.relevance.or(self.relevance),
            contains: variant.contains.clone().or_else(|| self.contains.clone()),
            // variants don't nest
            variants: Vec::new(),
        }
    }

    /// How many compiled modes this raw mode turns into
    pub(crate) fn expanded_len(&self) -> usize {
        self.variants.len().max(1)
    }
}

/// A whole language definition, as written by hand or loaded from JSON.
///
/// The top level fields describe the root mode. `modes` holds named modes that can be
/// referenced from any `contains` list, including their own, which is how recursive
/// constructs like nested function types are expressed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawGrammar {
    pub name: String,
    pub aliases: Vec<String>,
    pub case_insensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Keywords>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub illegal: Option<String>,
    pub contains: Vec<ModeRef>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub modes: BTreeMap<String, RawMode>,
}

impl RawGrammar {
    pub fn load_from_file(path: impl AsRef<Path>) -> CohlResult<Self> {
        let file = File::open(path.as_ref())?;
        let reader = std::io::BufReader::new(file);
        let raw_grammar = serde_json::from_reader(reader)?;
        Ok(raw_grammar)
    }

    pub fn load_from_str(content: &str) -> CohlResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn compile(self) -> CohlResult<CompiledGrammar> {
        CompiledGrammar::from_raw_grammar(self)
    }

    /// The root mode of the grammar
    pub(crate) fn root_mode(&self) -> RawMode {
        RawMode {
            keywords: self.keywords.clone(),
            illegal: self.illegal.clone(),
            contains: Some(self.contains.clone()),
            ..Default::default()
        }
    }
}
