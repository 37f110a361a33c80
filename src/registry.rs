use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use crate::error::{CohlResult, Error};
use crate::grammars::{CompiledGrammar, RawGrammar};
use crate::highlight::{HighlightedText, MergingOptions, split_into_lines};
use crate::tokenizer::{Region, Token, TokenizeError, Tokenized, Tokenizer};

/// The default grammar name, where nothing is highlighted
pub const PLAIN_GRAMMAR_NAME: &str = "plain";

/// Grammars registered for the whole process, see [`register_global_language`]
static GLOBAL_LANGUAGES: LazyLock<papaya::HashMap<String, Arc<CompiledGrammar>>> =
    LazyLock::new(papaya::HashMap::new);

/// Compiles the grammar and makes it available to the whole process under `tag`.
///
/// Registering a tag again replaces the previous grammar: the last registration wins.
pub fn register_global_language(
    tag: &str,
    grammar: RawGrammar,
) -> CohlResult<Arc<CompiledGrammar>> {
    let compiled = Arc::new(grammar.compile()?);
    let tag = tag.to_lowercase();
    let languages = GLOBAL_LANGUAGES.pin();
    if languages.insert(tag.clone(), compiled.clone()).is_some() {
        log::debug!("Replacing global grammar for `{tag}`");
    } else {
        log::debug!("Registered global grammar `{}` as `{tag}`", compiled.name);
    }
    Ok(compiled)
}

/// The grammar last registered globally under `tag`, if any
pub fn global_language(tag: &str) -> Option<Arc<CompiledGrammar>> {
    GLOBAL_LANGUAGES.pin().get(tag.to_lowercase().as_str()).cloned()
}

/// Options for highlighting by the registry, NOT rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightOptions<'a> {
    pub(crate) lang: &'a str,
    pub(crate) merge_same_category_tokens: bool,
    pub(crate) fallback_to_plain: bool,
}

impl<'a> HighlightOptions<'a> {
    /// Creates a new highlight options with the given language tag.
    pub fn new(lang: &'a str) -> Self {
        Self {
            lang,
            merge_same_category_tokens: true,
            fallback_to_plain: false,
        }
    }

    /// Merges neighbouring tokens with the same categories into a single token
    pub fn merge_same_category_tokens(mut self, value: bool) -> Self {
        self.merge_same_category_tokens = value;
        self
    }

    /// Whether to fallback to the plain grammar if the requested
    /// grammar is not found.
    pub fn fallback_to_plain(mut self, value: bool) -> Self {
        self.fallback_to_plain = value;
        self
    }
}

/// Highlighted code with language, relevance and tokens
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightedCode {
    /// The tag of the grammar that was used, `plain` if none was
    pub language: String,
    /// How much the content looked like `language`
    pub relevance: u32,
    /// The grammar rejected the content and it was highlighted as plain text instead
    pub illegal: bool,
    /// Every region found by the tokenizer, with spans in the normalized content
    pub regions: Vec<Region>,
    /// The generated tokens. Each line is a Vector
    pub lines: Vec<Vec<HighlightedText>>,
}

#[inline]
pub(crate) fn normalize_string(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// The whole content as a single unclassified token
fn plain_tokenized(content: &str) -> Tokenized {
    let tokens = if content.is_empty() {
        Vec::new()
    } else {
        vec![Token {
            span: 0..content.len(),
            categories: Vec::new(),
        }]
    };
    Tokenized {
        tokens,
        ..Default::default()
    }
}

/// The main struct in cohl.
///
/// Maps language tags to compiled grammars and is responsible for highlighting a text. It is
/// not responsible for actually rendering those highlighted texts.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    // Vector of compiled grammars for ID-based access
    grammars: Vec<Arc<CompiledGrammar>>,
    // tag -> grammar ID
    grammar_id_by_tag: HashMap<String, usize>,
    // alias -> grammar ID, tags take precedence
    grammar_id_by_alias: HashMap<String, usize>,
    // tags passed to `register_language`, in registration order
    languages: Vec<String>,
}

impl Registry {
    fn add_compiled(&mut self, tag: &str, grammar: Arc<CompiledGrammar>) {
        let tag = tag.to_lowercase();
        let aliases = grammar.aliases.clone();
        // an alias of another grammar is not replaced in place: that grammar keeps its slot
        let grammar_id = match self.grammar_id_by_tag.get(&tag) {
            Some(&id) => {
                log::debug!(
                    "Replacing grammar `{}` registered as `{tag}` with `{}`",
                    self.grammars[id].name,
                    grammar.name
                );
                self.grammars[id] = grammar;
                id
            }
            None => {
                log::debug!("Registered grammar `{}` as `{tag}`", grammar.name);
                self.grammars.push(grammar);
                self.grammars.len() - 1
            }
        };
        if !self.languages.contains(&tag) {
            self.languages.push(tag.clone());
        }
        self.grammar_id_by_tag.insert(tag.clone(), grammar_id);
        for alias in aliases {
            self.add_alias(&tag, &alias);
        }
    }

    /// Compiles the grammar and registers it under `tag` and the grammar aliases.
    ///
    /// If the tag was already registered, the new grammar replaces the old one.
    pub fn register_language(&mut self, tag: &str, grammar: RawGrammar) -> CohlResult<()> {
        let compiled = grammar.compile()?;
        self.add_compiled(tag, Arc::new(compiled));
        Ok(())
    }

    /// Reads a JSON grammar file and registers it under `tag`.
    pub fn add_grammar_from_path(&mut self, tag: &str, path: impl AsRef<Path>) -> CohlResult<()> {
        let raw_grammar = RawGrammar::load_from_file(path)?;
        self.register_language(tag, raw_grammar)
    }

    /// Copies every grammar registered with [`register_global_language`] into this registry.
    pub fn add_global_languages(&mut self) {
        let mut globals: Vec<(String, Arc<CompiledGrammar>)> = GLOBAL_LANGUAGES
            .pin()
            .iter()
            .map(|(tag, grammar)| (tag.clone(), grammar.clone()))
            .collect();
        globals.sort_by(|a, b| a.0.cmp(&b.0));
        for (tag, grammar) in globals {
            self.add_compiled(&tag, grammar);
        }
    }

    /// Adds an empty grammar that will not match any token. Useful as a fallback if the grammar is not found.
    ///
    /// It will get the `plain` grammar name.
    pub fn add_plain_grammar(&mut self, aliases: &[&str]) -> CohlResult<()> {
        let raw = RawGrammar {
            name: PLAIN_GRAMMAR_NAME.to_owned(),
            ..Default::default()
        };
        self.register_language(PLAIN_GRAMMAR_NAME, raw)?;
        for alias in aliases {
            self.add_alias(PLAIN_GRAMMAR_NAME, alias);
        }
        Ok(())
    }

    /// Adds an alias for the given grammar
    pub fn add_alias(&mut self, grammar_name: &str, alias: &str) {
        if let Some(grammar_id) = self.grammar_id(grammar_name) {
            self.grammar_id_by_alias
                .insert(alias.to_lowercase(), grammar_id);
        }
    }

    fn grammar_id(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.grammar_id_by_tag
            .get(&name)
            .or_else(|| self.grammar_id_by_alias.get(&name))
            .copied()
    }

    /// Checks whether the given lang is available in the registry with its tag
    /// or aliases
    pub fn contains_grammar(&self, name: &str) -> bool {
        self.grammar_id(name).is_some()
    }

    /// The grammar registered under that tag or alias
    pub fn get_grammar(&self, name: &str) -> Option<&Arc<CompiledGrammar>> {
        self.grammar_id(name).map(|id| &self.grammars[id])
    }

    /// The registered tags, aliases excluded, in registration order
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(String::as_str)
    }

    fn build_code(
        language: &str,
        content: &str,
        tokenized: Tokenized,
        illegal: bool,
        merge_same_category_tokens: bool,
    ) -> HighlightedCode {
        let merging_options = MergingOptions {
            merge_same_category_tokens,
        };
        HighlightedCode {
            language: language.to_owned(),
            relevance: tokenized.relevance,
            illegal,
            lines: split_into_lines(content, &tokenized.tokens, merging_options),
            regions: tokenized.regions,
        }
    }

    /// The main entry point for the actual cohl usage.
    ///
    /// This returns the raw output of the tokenizer split into lines. It's up to you to use
    /// a provided renderer or to use your own afterwards.
    ///
    /// Content rejected by the grammar through an `illegal` pattern is not an error: it is
    /// returned as plain text with `illegal` set.
    pub fn highlight(&self, content: &str, options: HighlightOptions) -> CohlResult<HighlightedCode> {
        let requested = options.lang.to_lowercase();
        let normalized_content = normalize_string(content);

        let (language, grammar) = match self.get_grammar(&requested) {
            Some(grammar) => (requested.as_str(), Some(grammar)),
            None if options.fallback_to_plain => {
                log::debug!("No grammar for `{requested}`, highlighting as plain text");
                (PLAIN_GRAMMAR_NAME, self.get_grammar(PLAIN_GRAMMAR_NAME))
            }
            None => return Err(Error::GrammarNotFound(options.lang.to_string())),
        };
        let Some(grammar) = grammar else {
            return Ok(Self::build_code(
                language,
                &normalized_content,
                plain_tokenized(&normalized_content),
                false,
                options.merge_same_category_tokens,
            ));
        };

        let (tokenized, illegal) = match Tokenizer::new(grammar).tokenize(&normalized_content) {
            Ok(tokenized) => (tokenized, false),
            Err(TokenizeError::Illegal { position, lexeme }) => {
                log::debug!(
                    "Illegal lexeme {lexeme:?} at byte {position} for `{language}`, falling back to plain text"
                );
                (plain_tokenized(&normalized_content), true)
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Self::build_code(
            language,
            &normalized_content,
            tokenized,
            illegal,
            options.merge_same_category_tokens,
        ))
    }

    /// Highlights the content with every candidate grammar and keeps the most relevant one.
    ///
    /// Candidates are the given tags, or every registered language but `plain` if `subset` is
    /// `None`. Ties go to the earlier candidate and grammars rejecting the content are never
    /// picked. When nothing fits, the content is returned as plain text.
    pub fn highlight_auto(
        &self,
        content: &str,
        subset: Option<&[&str]>,
    ) -> CohlResult<HighlightedCode> {
        let normalized_content = normalize_string(content);
        let candidates: Vec<String> = match subset {
            Some(tags) => tags.iter().map(|t| t.to_lowercase()).collect(),
            None => self
                .languages
                .iter()
                .filter(|t| t.as_str() != PLAIN_GRAMMAR_NAME)
                .cloned()
                .collect(),
        };

        let mut best: Option<(&str, Tokenized)> = None;
        for tag in &candidates {
            let Some(grammar) = self.get_grammar(tag) else {
                continue;
            };
            match Tokenizer::new(grammar).tokenize(&normalized_content) {
                Ok(tokenized) => {
                    let better = best
                        .as_ref()
                        .is_none_or(|(_, b)| tokenized.relevance > b.relevance);
                    if better {
                        best = Some((tag.as_str(), tokenized));
                    }
                }
                Err(err) => log::debug!("`{tag}` rejected by auto detection: {err}"),
            }
        }

        let (language, tokenized) = match best {
            Some(found) => found,
            None => (PLAIN_GRAMMAR_NAME, plain_tokenized(&normalized_content)),
        };
        Ok(Self::build_code(
            language,
            &normalized_content,
            tokenized,
            false,
            true,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::grammars::{Keywords, RawMode};
    use crate::languages::co::{self, CoVersion};

    fn co_registry() -> Registry {
        let mut registry = Registry::default();
        registry
            .register_language("co", co::grammar(CoVersion::Current))
            .unwrap();
        registry
    }

    fn flatten(code: &HighlightedCode) -> Vec<(String, Option<Category>)> {
        code.lines
            .iter()
            .flatten()
            .map(|t| (t.text.clone(), t.category()))
            .collect()
    }

    #[test]
    fn highlights_registered_language() {
        let registry = co_registry();
        let code = registry
            .highlight("// hello\r\nx", HighlightOptions::new("CO"))
            .unwrap();
        assert_eq!(code.language, "co");
        assert!(!code.illegal);
        assert_eq!(code.lines.len(), 2);
        assert_eq!(
            code.lines[0],
            vec![HighlightedText {
                text: "// hello".to_owned(),
                categories: vec![Category::Comment],
            }]
        );
        assert_eq!(code.regions[0].category, Category::Comment);
        assert_eq!(code.regions[0].span, 0..8);
    }

    #[test]
    fn unknown_language() {
        let registry = co_registry();
        assert!(matches!(
            registry.highlight("x", HighlightOptions::new("go")),
            Err(Error::GrammarNotFound(_))
        ));

        let code = registry
            .highlight("fun x", HighlightOptions::new("go").fallback_to_plain(true))
            .unwrap();
        assert_eq!(code.language, PLAIN_GRAMMAR_NAME);
        assert_eq!(flatten(&code), vec![("fun x".to_owned(), None)]);
    }

    #[test]
    fn can_highlight_plain_grammar() {
        let mut registry = Registry::default();
        registry.add_plain_grammar(&["text"]).unwrap();
        assert!(registry.contains_grammar("TEXT"));
        let code = registry
            .highlight("a\n\nb", HighlightOptions::new("text"))
            .unwrap();
        assert_eq!(code.language, "text");
        assert_eq!(code.lines.len(), 3);
        assert!(code.lines[1].is_empty());
        assert!(code.regions.is_empty());
    }

    #[test]
    fn illegal_content_falls_back_to_plain() {
        let registry = co_registry();
        let code = registry
            .highlight("x </b>", HighlightOptions::new("co"))
            .unwrap();
        assert!(code.illegal);
        assert_eq!(code.relevance, 0);
        assert!(code.regions.is_empty());
        assert_eq!(flatten(&code), vec![("x </b>".to_owned(), None)]);
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = co_registry();
        let comment = |registry: &Registry| {
            let code = registry
                .highlight("// x", HighlightOptions::new("co"))
                .unwrap();
            code.lines[0][0].category()
        };
        assert_eq!(comment(&registry), Some(Category::Comment));

        registry
            .register_language("co", RawGrammar {
                name: "Bare".to_owned(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(comment(&registry), None);
        assert_eq!(registry.get_grammar("co").unwrap().name, "Bare");
        assert_eq!(registry.languages().collect::<Vec<_>>(), vec!["co"]);

        registry
            .register_language("co", co::grammar(CoVersion::Current))
            .unwrap();
        assert_eq!(comment(&registry), Some(Category::Comment));
    }

    #[test]
    fn grammar_aliases_are_registered() {
        let mut registry = Registry::default();
        registry
            .register_language("tiny", RawGrammar {
                name: "Tiny".to_owned(),
                aliases: vec!["TI".to_owned()],
                keywords: Some(Keywords::from("let")),
                ..Default::default()
            })
            .unwrap();
        assert!(registry.contains_grammar("ti"));
        let code = registry
            .highlight("let", HighlightOptions::new("ti"))
            .unwrap();
        assert_eq!(code.language, "ti");
        assert_eq!(code.lines[0][0].category(), Some(Category::Keyword));
    }

    #[test]
    fn registering_over_an_alias_leaves_its_grammar_alone() {
        let mut registry = Registry::default();
        registry
            .register_language("tiny", RawGrammar {
                name: "Tiny".to_owned(),
                aliases: vec!["ti".to_owned()],
                ..Default::default()
            })
            .unwrap();
        registry
            .register_language("ti", co::grammar(CoVersion::Current))
            .unwrap();

        assert_eq!(registry.get_grammar("tiny").unwrap().name, "Tiny");
        assert_eq!(registry.get_grammar("ti").unwrap().name, "Co");
        assert_eq!(registry.languages().collect::<Vec<_>>(), vec!["tiny", "ti"]);

        // a tag shadows an alias of the same name
        registry.add_alias("tiny", "ti");
        assert_eq!(registry.get_grammar("ti").unwrap().name, "Co");
    }

    #[test]
    fn malformed_grammar_is_rejected() {
        let mut registry = Registry::default();
        let raw = RawGrammar {
            name: "Broken".to_owned(),
            contains: vec![RawMode::new().begin("(").into()],
            ..Default::default()
        };
        assert!(registry.register_language("broken", raw).is_err());
        assert!(!registry.contains_grammar("broken"));
    }

    #[test]
    fn auto_detection_picks_most_relevant() {
        let mut registry = Registry::default();
        registry
            .register_language("words", RawGrammar {
                name: "Words".to_owned(),
                keywords: Some(Keywords::from("then")),
                ..Default::default()
            })
            .unwrap();
        registry
            .register_language("co", co::grammar(CoVersion::Current))
            .unwrap();

        let code = registry
            .highlight_auto("fun main() {\n  return nil\n}", None)
            .unwrap();
        assert_eq!(code.language, "co");
        assert!(code.relevance > 0);

        // nothing scores: the first candidate wins
        let code = registry.highlight_auto("???", None).unwrap();
        assert_eq!(code.language, "words");

        let code = registry
            .highlight_auto("fun main() {}", Some(&["words"]))
            .unwrap();
        assert_eq!(code.language, "words");
    }

    #[test]
    fn auto_detection_skips_illegal_grammars() {
        let registry = co_registry();
        let code = registry.highlight_auto("</div>", None).unwrap();
        assert_eq!(code.language, PLAIN_GRAMMAR_NAME);
        assert!(!code.illegal);
    }

    #[test]
    fn global_registration_replaces() {
        let first = register_global_language(
            "co-global-test",
            co::grammar(CoVersion::Hash),
        )
        .unwrap();
        let found = global_language("CO-GLOBAL-TEST").unwrap();
        assert!(Arc::ptr_eq(&first, &found));

        let second = register_global_language(
            "co-global-test",
            co::grammar(CoVersion::Current),
        )
        .unwrap();
        let found = global_language("co-global-test").unwrap();
        assert!(Arc::ptr_eq(&second, &found));
        assert!(!Arc::ptr_eq(&first, &found));
        assert!(global_language("never-registered").is_none());

        let mut registry = Registry::default();
        registry.add_global_languages();
        assert!(registry.contains_grammar("co-global-test"));
    }
}
