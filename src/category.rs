//! The fixed set of labels a grammar can attach to a span of text.
//!
//! Names follow highlight.js class names so the generated HTML works with existing
//! highlight.js stylesheets (`hljs-keyword`, `hljs-built_in`...).

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Keyword,
    Literal,
    BuiltIn,
    Type,
    String,
    Number,
    Comment,
    /// `TODO:`-like markers inside comments
    Doctag,
    Function,
    /// A `fun` introducing a function type in parameter position
    Funtype,
    Title,
    Params,
    Typedef,
    /// Text following `error:` in a line comment
    #[serde(rename = "errormsg")]
    ErrorMsg,
    Meta,
}

impl Category {
    pub const ALL: [Category; 15] = [
        Category::Keyword,
        Category::Literal,
        Category::BuiltIn,
        Category::Type,
        Category::String,
        Category::Number,
        Category::Comment,
        Category::Doctag,
        Category::Function,
        Category::Funtype,
        Category::Title,
        Category::Params,
        Category::Typedef,
        Category::ErrorMsg,
        Category::Meta,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Keyword => "keyword",
            Category::Literal => "literal",
            Category::BuiltIn => "built_in",
            Category::Type => "type",
            Category::String => "string",
            Category::Number => "number",
            Category::Comment => "comment",
            Category::Doctag => "doctag",
            Category::Function => "function",
            Category::Funtype => "funtype",
            Category::Title => "title",
            Category::Params => "params",
            Category::Typedef => "typedef",
            Category::ErrorMsg => "errormsg",
            Category::Meta => "meta",
        }
    }

    /// Parses a highlight.js class name
    pub fn from_name(name: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// The CSS class for this category with the given prefix, eg `hljs-errormsg`
    pub fn css_class(self, prefix: &str) -> String {
        format!("{prefix}{}", self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
