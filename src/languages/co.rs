//! Highlighting for Co.
//!
//! Co's surface syntax changed over time and the grammar followed it. [`CoVersion::Current`]
//! is the one to use; the two older snapshots are kept so that old documentation pages can
//! still be rendered exactly as they were.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::grammars::common::{
    C_NUMBER_RE, UNDERSCORE_IDENT_RE, apos_string_mode, c_number_mode, comment,
    quote_string_mode, shebang, title_mode, underscore_title_mode,
};
use crate::grammars::{Keywords, ModeRef, RawGrammar, RawMode};

/// Tag fenced code blocks use for Co
pub const CO_TAG: &str = "co";

/// Which snapshot of the Co syntax to highlight
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoVersion {
    /// `//` comments, generics and nested function types in signatures
    #[default]
    Current,
    /// Deprecated: `//` comments, separate type table, flat signatures
    Slash,
    /// Deprecated: `#` comments, type names listed as keywords, no type declarations
    Hash,
}

/// The words of one Co version, by category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoTables {
    pub keyword: &'static [&'static str],
    pub literal: &'static [&'static str],
    pub built_in: &'static [&'static str],
    pub types: &'static [&'static str],
}

const LITERALS: &[&str] = &["true", "false", "nil"];

const CURRENT_TABLES: CoTables = CoTables {
    keyword: &[
        "auto",
        "break",
        "case",
        "const",
        "continue",
        "default",
        "else",
        "fallthrough",
        "for",
        "fun",
        "goto",
        "if",
        "import",
        "interface",
        "mut",
        "return",
        "select",
        "struct",
        "switch",
        "type",
        "var",
    ],
    literal: LITERALS,
    built_in: &["copy", "panic", "print"],
    types: &[
        "bool", "i8", "i16", "i32", "i64", "int", "u8", "u16", "u32", "u64", "uint", "f32", "f64",
        "byte", "str",
    ],
};

const OLD_BUILT_INS: &[&str] = &["append", "cap", "copy", "len", "make", "panic", "print"];

const OLD_KEYWORDS: &[&str] = &[
    "auto",
    "break",
    "default",
    "fun",
    "interface",
    "select",
    "case",
    "struct",
    "else",
    "goto",
    "switch",
    "const",
    "fallthrough",
    "if",
    "type",
    "continue",
    "for",
    "import",
    "return",
    "var",
];

const OLD_TYPES: &[&str] = &[
    "bool", "i8", "i16", "i32", "i64", "isize", "int", "u8", "u16", "u32", "u64", "usize",
    "uint", "f32", "f64", "byte", "rune", "str",
];

const SLASH_TABLES: CoTables = CoTables {
    keyword: OLD_KEYWORDS,
    literal: LITERALS,
    built_in: OLD_BUILT_INS,
    types: OLD_TYPES,
};

// type names were plain keywords back then
const HASH_KEYWORDS: &[&str] = &[
    "auto",
    "break",
    "default",
    "fun",
    "interface",
    "select",
    "case",
    "struct",
    "else",
    "goto",
    "switch",
    "const",
    "fallthrough",
    "if",
    "type",
    "continue",
    "for",
    "import",
    "return",
    "var",
    "bool",
    "i8",
    "i16",
    "i32",
    "i64",
    "isize",
    "int",
    "u8",
    "u16",
    "u32",
    "u64",
    "usize",
    "uint",
    "f32",
    "f64",
    "byte",
    "rune",
    "str",
];

const HASH_TABLES: CoTables = CoTables {
    keyword: HASH_KEYWORDS,
    literal: LITERALS,
    built_in: OLD_BUILT_INS,
    types: &[],
};

impl CoVersion {
    pub const ALL: [CoVersion; 3] = [CoVersion::Current, CoVersion::Slash, CoVersion::Hash];

    pub fn tables(self) -> &'static CoTables {
        match self {
            CoVersion::Current => &CURRENT_TABLES,
            CoVersion::Slash => &SLASH_TABLES,
            CoVersion::Hash => &HASH_TABLES,
        }
    }

    pub fn is_deprecated(self) -> bool {
        self != CoVersion::Current
    }
}

impl CoTables {
    pub fn keywords(&self) -> Keywords {
        Keywords::new()
            .keyword(self.keyword)
            .literal(self.literal)
            .built_in(self.built_in)
            .types(self.types)
    }

    /// Every word with the category it gets when written on its own
    pub fn by_category(&self) -> BTreeMap<Category, &'static [&'static str]> {
        BTreeMap::from([
            (Category::Keyword, self.keyword),
            (Category::Literal, self.literal),
            (Category::BuiltIn, self.built_in),
            (Category::Type, self.types),
        ])
    }
}

fn comments(version: CoVersion) -> Vec<ModeRef> {
    match version {
        CoVersion::Hash => vec![comment("#", "$").into(), comment(r"#\*", r"\*#").into()],
        CoVersion::Current | CoVersion::Slash => vec![
            comment(r"/\*", r"\*/").into(),
            RawMode::new()
                .class(Category::Comment)
                .begin("//")
                .end("$")
                .contains(vec![
                    RawMode::new()
                        .class(Category::ErrorMsg)
                        .begin("error:")
                        .end("$")
                        .into(),
                ])
                .into(),
        ],
    }
}

fn strings() -> RawMode {
    RawMode::new()
        .class(Category::String)
        .variants(vec![quote_string_mode(), apos_string_mode()])
}

fn numbers() -> RawMode {
    RawMode::new().class(Category::Number).variants(vec![
        // imaginary/typed suffix, preferred over the plain form
        RawMode::new().begin(&format!("{C_NUMBER_RE}[i]")).relevance(1),
        c_number_mode(),
    ])
}

fn with_comments(mut modes: Vec<ModeRef>, version: CoVersion) -> Vec<ModeRef> {
    modes.extend(comments(version));
    modes
}

/// `fun f(cb fun(fun(int) int) str)`: parameters may themselves be function types, at any
/// depth, so FUN_TYPE and PARAMS refer to each other by name.
fn current_named_modes(keywords: &Keywords) -> BTreeMap<String, RawMode> {
    let fun_type = RawMode::new().variants(vec![
        RawMode::new()
            .class(Category::Funtype)
            .begin("fun")
            .return_begin()
            .contains(vec![
                RawMode::new().class(Category::Type).begin("fun").into(),
                ModeRef::named("PARAMS"),
            ]),
        RawMode::new()
            .begin(r"\(")
            .end(r"\)")
            .contains(vec![ModeRef::named("FUN_TYPE")]),
    ]);

    let params = RawMode::new()
        .class(Category::Params)
        .begin(r"\(")
        .end(r"\)")
        .ends_parent()
        .keywords(keywords.clone())
        .relevance(0)
        .contains(with_comments(
            vec![ModeRef::named("FUN_TYPE")],
            CoVersion::Current,
        ));

    BTreeMap::from([
        ("FUN_TYPE".to_owned(), fun_type),
        ("PARAMS".to_owned(), params),
    ])
}

fn current_function(keywords: &Keywords) -> RawMode {
    RawMode::new()
        .class(Category::Function)
        .begin_keywords("fun")
        .end("[(]|$")
        .return_begin()
        .exclude_end()
        .keywords(keywords.clone())
        .relevance(5)
        .contains(with_comments(
            vec![
                RawMode::new()
                    .begin(&format!(r"{UNDERSCORE_IDENT_RE}\s*\("))
                    .return_begin()
                    .relevance(0)
                    .contains(vec![underscore_title_mode().into()])
                    .into(),
                RawMode::new()
                    .class(Category::Type)
                    .begin("<")
                    .end(">")
                    .keywords("reified")
                    .relevance(0)
                    .into(),
                ModeRef::named("PARAMS"),
            ],
            CoVersion::Current,
        ))
}

fn flat_function(keywords: &Keywords, version: CoVersion) -> RawMode {
    RawMode::new()
        .class(Category::Function)
        .begin_keywords("fun")
        .end(r"\s*(\{|$)")
        .exclude_end()
        .contains(with_comments(
            vec![
                title_mode().into(),
                RawMode::new()
                    .class(Category::Params)
                    .begin(r"\(")
                    .end(r"\)")
                    .keywords(keywords.clone())
                    .illegal(r#"["']"#)
                    .contains(comments(version))
                    .into(),
            ],
            version,
        ))
}

fn type_declaration(version: CoVersion) -> RawMode {
    RawMode::new()
        .class(Category::Typedef)
        .begin_keywords("type")
        .end(r"\s*$")
        .exclude_end()
        .contains(with_comments(vec![title_mode().into()], version))
}

/// The Co grammar for the given version.
///
/// Top level rules are tried in this order: shebang, comments, strings, numbers, function
/// signatures, type declarations.
pub fn grammar(version: CoVersion) -> RawGrammar {
    let keywords = version.tables().keywords();

    let mut contains: Vec<ModeRef> = vec![shebang(Some("co")).into()];
    contains.extend(comments(version));
    contains.push(strings().into());
    contains.push(numbers().into());

    let modes = match version {
        CoVersion::Current => {
            contains.push(current_function(&keywords).into());
            contains.push(type_declaration(version).into());
            current_named_modes(&keywords)
        }
        CoVersion::Slash => {
            contains.push(flat_function(&keywords, version).into());
            contains.push(type_declaration(version).into());
            BTreeMap::new()
        }
        CoVersion::Hash => {
            contains.push(flat_function(&keywords, version).into());
            BTreeMap::new()
        }
    };

    RawGrammar {
        name: "Co".to_owned(),
        aliases: Vec::new(),
        case_insensitive: false,
        keywords: Some(keywords),
        illegal: Some("</".to_owned()),
        contains,
        modes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{Region, Tokenizer};

    fn tokenize(version: CoVersion, text: &str) -> Vec<Region> {
        let grammar = grammar(version).compile().unwrap();
        Tokenizer::new(&grammar).tokenize(text).unwrap().regions
    }

    /// (category, text) of every region, in opening order
    fn regions(version: CoVersion, text: &str) -> Vec<(Category, String)> {
        tokenize(version, text)
            .into_iter()
            .map(|r| (r.category, text[r.span].to_owned()))
            .collect()
    }

    fn has_region(regions: &[(Category, String)], category: Category, text: &str) -> bool {
        regions.iter().any(|(c, t)| *c == category && t == text)
    }

    #[test]
    fn every_table_word_gets_its_category() {
        for version in CoVersion::ALL {
            for (category, words) in version.tables().by_category() {
                for word in words {
                    // `fun` and `type` also open their signature/declaration span
                    let found = regions(version, word);
                    assert!(has_region(&found, category, word), "{word} in {version:?}");
                    assert!(
                        found.iter().all(|(_, text)| text == word),
                        "{word} in {version:?}: {found:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn current_tables() {
        let tables = CoVersion::Current.tables();
        assert!(tables.keyword.contains(&"mut"));
        assert!(!tables.built_in.contains(&"len"));
        assert!(!tables.types.contains(&"rune"));
        let old = CoVersion::Slash.tables();
        assert!(old.built_in.contains(&"append"));
        assert!(old.types.contains(&"usize"));
        assert!(CoVersion::Hash.tables().keyword.contains(&"rune"));
        assert!(CoVersion::Hash.is_deprecated());
        assert!(!CoVersion::Current.is_deprecated());
    }

    #[test]
    fn line_comment_with_error_message() {
        let text = "x := y // error: undefined y";
        let found = regions(CoVersion::Current, text);
        assert_eq!(
            found,
            vec![
                (Category::Comment, "// error: undefined y".to_owned()),
                (Category::ErrorMsg, "error: undefined y".to_owned()),
            ]
        );
    }

    #[test]
    fn error_message_stops_at_end_of_line() {
        let text = "// error: bad\nvar";
        let found = regions(CoVersion::Current, text);
        assert_eq!(
            found,
            vec![
                (Category::Comment, "// error: bad".to_owned()),
                (Category::ErrorMsg, "error: bad".to_owned()),
                (Category::Keyword, "var".to_owned()),
            ]
        );
    }

    #[test]
    fn block_comment_spans_lines() {
        let text = "/* a\n b */ nil";
        let found = regions(CoVersion::Current, text);
        assert_eq!(
            found,
            vec![
                (Category::Comment, "/* a\n b */".to_owned()),
                (Category::Literal, "nil".to_owned()),
            ]
        );
    }

    #[test]
    fn hash_comments() {
        let found = regions(CoVersion::Hash, "# note\ntrue");
        assert_eq!(
            found,
            vec![
                (Category::Comment, "# note".to_owned()),
                (Category::Literal, "true".to_owned()),
            ]
        );
        // `//` means nothing there
        assert!(regions(CoVersion::Hash, "// x").is_empty());
    }

    #[test]
    fn strings_include_delimiters() {
        for text in [r#""hello world""#, "'c'", r#""a \" b""#, r"'\n'"] {
            assert_eq!(
                regions(CoVersion::Current, text),
                vec![(Category::String, text.to_owned())]
            );
        }
    }

    #[test]
    fn imaginary_numbers_are_one_token() {
        assert_eq!(
            regions(CoVersion::Current, "42i"),
            vec![(Category::Number, "42i".to_owned())]
        );
        assert_eq!(
            regions(CoVersion::Current, "0x2A 3.5"),
            vec![
                (Category::Number, "0x2A".to_owned()),
                (Category::Number, "3.5".to_owned()),
            ]
        );
    }

    #[test]
    fn imaginary_rule_wins_over_plain_numbers() {
        let grammar = grammar(CoVersion::Current).compile().unwrap();
        let tokenized = Tokenizer::new(&grammar).tokenize("42i").unwrap();
        // the imaginary variant has relevance 1, the plain one 0
        assert_eq!(tokenized.relevance, 1);
        let plain = Tokenizer::new(&grammar).tokenize("42").unwrap();
        assert_eq!(plain.relevance, 0);
    }

    #[test]
    fn nested_function_types() {
        let text = "fun f(cb fun(fun(int) int) str)";
        let found = regions(CoVersion::Current, text);
        assert_eq!(found[0], (Category::Function, text.to_owned()));
        assert!(has_region(&found, Category::Keyword, "fun"));
        assert!(has_region(&found, Category::Title, "f"));
        assert!(has_region(
            &found,
            Category::Params,
            "(cb fun(fun(int) int) str)"
        ));
        assert!(has_region(&found, Category::Params, "(fun(int) int)"));
        assert!(has_region(&found, Category::Params, "(int)"));
        assert!(has_region(&found, Category::Funtype, "fun(fun(int) int)"));
        assert!(has_region(&found, Category::Funtype, "fun(int)"));
        assert!(has_region(&found, Category::Type, "str"));
        let params = found.iter().filter(|(c, _)| *c == Category::Params).count();
        assert_eq!(params, 3);
    }

    #[test]
    fn function_type_nesting_depth_five() {
        let mut ty = "int".to_owned();
        for _ in 0..5 {
            ty = format!("fun({ty}) int");
        }
        let text = format!("fun deep(cb {ty}) {{\n  return\n}}");
        let found = regions(CoVersion::Current, &text);
        let params = found.iter().filter(|(c, _)| *c == Category::Params).count();
        assert_eq!(params, 6);
        assert!(has_region(&found, Category::Keyword, "return"));
    }

    #[test]
    fn function_with_generics() {
        let text = "fun map<T>(xs T) T";
        let found = regions(CoVersion::Current, text);
        assert!(has_region(&found, Category::Function, "fun map<T>(xs T)"));
        assert!(has_region(&found, Category::Type, "<T>"));
        assert!(has_region(&found, Category::Params, "(xs T)"));
    }

    #[test]
    fn function_without_params_ends_at_line_end() {
        let text = "fun main\nvar";
        let found = regions(CoVersion::Current, text);
        assert_eq!(found[0], (Category::Function, "fun main".to_owned()));
        assert!(has_region(&found, Category::Keyword, "var"));
    }

    #[test]
    fn flat_function_signatures() {
        let text = "fun add(a int, b int) int {";
        let found = regions(CoVersion::Slash, text);
        assert!(has_region(&found, Category::Function, "fun add(a int, b int) int"));
        assert!(has_region(&found, Category::Title, "add"));
        assert!(has_region(&found, Category::Params, "(a int, b int)"));
        assert!(has_region(&found, Category::Type, "int"));
    }

    #[test]
    fn type_declarations() {
        let text = "type Point struct  \nnil";
        let found = regions(CoVersion::Current, text);
        assert_eq!(
            found,
            vec![
                (Category::Typedef, "type Point struct".to_owned()),
                (Category::Keyword, "type".to_owned()),
                (Category::Title, "Point".to_owned()),
                (Category::Title, "struct".to_owned()),
                (Category::Literal, "nil".to_owned()),
            ]
        );
        // no type declaration rule in the oldest version
        assert_eq!(
            regions(CoVersion::Hash, "type Point"),
            vec![(Category::Keyword, "type".to_owned())]
        );
    }

    #[test]
    fn shebang_first_line_only() {
        let text = "#!/usr/bin/env co\nvar";
        let found = regions(CoVersion::Current, text);
        assert_eq!(found[0], (Category::Meta, "#!/usr/bin/env co".to_owned()));
    }

    #[test]
    fn markup_is_illegal() {
        let grammar = grammar(CoVersion::Current).compile().unwrap();
        assert!(Tokenizer::new(&grammar).tokenize("var x </b>").is_err());
    }

    #[test]
    fn unterminated_block_comment_absorbs_the_rest() {
        let text = "var /* never closed\nfun f()";
        let found = regions(CoVersion::Current, text);
        assert_eq!(
            found,
            vec![
                (Category::Keyword, "var".to_owned()),
                (Category::Comment, "/* never closed\nfun f()".to_owned()),
            ]
        );
    }

    #[test]
    fn tokenizing_is_idempotent() {
        let text = "fun f(cb fun(int) str) {\n  print(\"hi\") // error: x\n}\ntype T int";
        let grammar = grammar(CoVersion::Current).compile().unwrap();
        let first = Tokenizer::new(&grammar).tokenize(text).unwrap();
        let second = Tokenizer::new(&grammar).tokenize(text).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn all_versions_compile() {
        for version in CoVersion::ALL {
            let grammar = grammar(version).compile().unwrap();
            assert_eq!(grammar.name, "Co");
            assert!(grammar.aliases.is_empty());
        }
    }
}
