use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Pattern used to find candidate words when a keyword table doesn't set one
pub const DEFAULT_KEYWORD_PATTERN: &str = r"\w+";

/// Words that are too common across languages to count towards relevance
const COMMON_KEYWORDS: [&str; 11] = [
    "of", "and", "for", "in", "not", "or", "if", "then", "parent", "list", "value",
];

/// The words of a grammar or a mode, grouped by category.
///
/// A word can carry a relevance suffix, eg `"goto|3"`. Without one, a word counts for 1
/// unless it's one of the very common English words.
///
/// Deserializes either from a single whitespace separated string (all keywords) or from an
/// object like highlight.js keyword objects:
/// ```json
/// { "keyword": ["if", "else"], "literal": ["true"], "built_in": [], "type": ["int"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawKeywords")]
pub struct Keywords {
    #[serde(rename = "$pattern", skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub keyword: Vec<String>,
    pub literal: Vec<String>,
    pub built_in: Vec<String>,
    #[serde(rename = "type")]
    pub type_: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawKeywords {
    Words(String),
    Table {
        #[serde(rename = "$pattern", default)]
        pattern: Option<String>,
        #[serde(default)]
        keyword: Vec<String>,
        #[serde(default)]
        literal: Vec<String>,
        #[serde(default)]
        built_in: Vec<String>,
        #[serde(rename = "type", default)]
        type_: Vec<String>,
    },
}

impl From<RawKeywords> for Keywords {
    fn from(raw: RawKeywords) -> Self {
        match raw {
            RawKeywords::Words(words) => Keywords::from(words.as_str()),
            RawKeywords::Table {
                pattern,
                keyword,
                literal,
                built_in,
                type_,
            } => Keywords {
                pattern,
                keyword,
                literal,
                built_in,
                type_,
            },
        }
    }
}

impl From<&str> for Keywords {
    fn from(words: &str) -> Self {
        Keywords {
            keyword: words.split_whitespace().map(str::to_owned).collect(),
            ..Default::default()
        }
    }
}

fn to_owned_words(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_owned()).collect()
}

impl Keywords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword(mut self, words: &[&str]) -> Self {
        self.keyword = to_owned_words(words);
        self
    }

    pub fn literal(mut self, words: &[&str]) -> Self {
        self.literal = to_owned_words(words);
        self
    }

    pub fn built_in(mut self, words: &[&str]) -> Self {
        self.built_in = to_owned_words(words);
        self
    }

    pub fn types(mut self, words: &[&str]) -> Self {
        self.type_ = to_owned_words(words);
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_owned());
        self
    }

    /// Words of the given category, in declaration order and with their relevance suffix
    pub fn words(&self, category: Category) -> &[String] {
        match category {
            Category::Keyword => &self.keyword,
            Category::Literal => &self.literal,
            Category::BuiltIn => &self.built_in,
            Category::Type => &self.type_,
            _ => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keyword.is_empty()
            && self.literal.is_empty()
            && self.built_in.is_empty()
            && self.type_.is_empty()
    }

    pub(crate) fn compile(&self, case_insensitive: bool) -> KeywordMap {
        let mut words = HashMap::new();
        for category in [
            Category::Keyword,
            Category::Literal,
            Category::BuiltIn,
            Category::Type,
        ] {
            for entry in self.words(category) {
                let (word, relevance) = split_relevance(entry);
                let word = if case_insensitive {
                    word.to_lowercase()
                } else {
                    word.to_owned()
                };
                // the first category claiming a word keeps it
                words.entry(word).or_insert(KeywordData {
                    category,
                    relevance,
                });
            }
        }

        KeywordMap {
            pattern: self
                .pattern
                .clone()
                .unwrap_or_else(|| DEFAULT_KEYWORD_PATTERN.to_owned()),
            case_insensitive,
            words,
        }
    }
}

fn split_relevance(entry: &str) -> (&str, u32) {
    if let Some((word, relevance)) = entry.split_once('|')
        && let Ok(relevance) = relevance.parse()
    {
        return (word, relevance);
    }
    let relevance = if COMMON_KEYWORDS.contains(&entry.to_lowercase().as_str()) {
        0
    } else {
        1
    };
    (entry, relevance)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KeywordData {
    pub category: Category,
    pub relevance: u32,
}

/// Word -> category lookup built from a [`Keywords`] table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMap {
    pub pattern: String,
    pub case_insensitive: bool,
    words: HashMap<String, KeywordData>,
}

impl KeywordMap {
    pub fn get(&self, word: &str) -> Option<KeywordData> {
        if self.case_insensitive {
            self.words.get(&word.to_lowercase()).copied()
        } else {
            self.words.get(word).copied()
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, KeywordData)> {
        self.words.iter().map(|(word, data)| (word.as_str(), *data))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
