//! Building blocks shared by grammars, matching the stock highlight.js modes so grammars
//! written against highlight.js keep their behaviour.

use crate::category::Category;
use crate::grammars::raw::RawMode;

pub const IDENT_RE: &str = r"[a-zA-Z]\w*";
pub const UNDERSCORE_IDENT_RE: &str = r"[a-zA-Z_]\w*";
/// Integers, floats with optional exponent and hex numbers
pub const C_NUMBER_RE: &str = r"(-?)(\b0[xX][a-fA-F0-9]+|(\b\d+(\.\d*)?|\.\d+)([eE][-+]?\d+)?)";

const DOCTAG_WORDS: &str = "TODO|FIXME|NOTE|BUG|OPTIMIZE|HACK|XXX";

/// Escapes regex metacharacters so `text` matches literally
pub fn escape_regex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if "\\^$.|?*+()[]{}/-".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn backslash_escape() -> RawMode {
    RawMode::new().begin(r"\\[\s\S]").relevance(0)
}

/// `"str"`, can't span lines
pub fn quote_string_mode() -> RawMode {
    RawMode::new()
        .class(Category::String)
        .begin("\"")
        .end("\"")
        .illegal(r"\n")
        .contains(vec![backslash_escape().into()])
}

/// `'c'`, can't span lines. The length of the content is not checked.
pub fn apos_string_mode() -> RawMode {
    RawMode::new()
        .class(Category::String)
        .begin("'")
        .end("'")
        .illegal(r"\n")
        .contains(vec![backslash_escape().into()])
}

pub fn c_number_mode() -> RawMode {
    RawMode::new()
        .class(Category::Number)
        .begin(C_NUMBER_RE)
        .relevance(0)
}

pub fn title_mode() -> RawMode {
    RawMode::new()
        .class(Category::Title)
        .begin(IDENT_RE)
        .relevance(0)
}

pub fn underscore_title_mode() -> RawMode {
    RawMode::new()
        .class(Category::Title)
        .begin(UNDERSCORE_IDENT_RE)
        .relevance(0)
}

fn doctag_mode() -> RawMode {
    RawMode::new()
        .class(Category::Doctag)
        .begin(&format!("[ ]*(?=({DOCTAG_WORDS}):)"))
        .end(&format!("({DOCTAG_WORDS}):"))
        .exclude_begin()
        .relevance(0)
}

/// A comment from `begin` to `end`, with `TODO:`-like markers highlighted inside
pub fn comment(begin: &str, end: &str) -> RawMode {
    RawMode::new()
        .class(Category::Comment)
        .begin(begin)
        .end(end)
        .contains(vec![doctag_mode().into()])
}

/// `#!/usr/bin/env <binary>` on the very first line only
pub fn shebang(binary: Option<&str>) -> RawMode {
    let begin = match binary {
        Some(binary) => format!(r"\A#![ ]*/.*\b{}\b.*", escape_regex(binary)),
        None => r"\A#![ ]*/".to_owned(),
    };
    RawMode::new()
        .class(Category::Meta)
        .begin(&begin)
        .end("$")
        .relevance(0)
}
