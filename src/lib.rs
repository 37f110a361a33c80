//! Syntax highlighting for the Co language and the configuration of its documentation site.
//!
//! Grammars are tables of modes in the highlight.js style, written with the builders of
//! [`grammars`] or loaded from JSON, and run by a small lexeme-loop engine.
//!
//! ```no_run
//! use cohl::{HighlightOptions, HtmlRenderer, Registry, RenderOptions};
//!
//! let mut registry = Registry::default();
//! cohl::languages::register_builtin_languages(&mut registry)?;
//! let highlighted = registry.highlight("fun main() {}", HighlightOptions::new("co"))?;
//! let html = HtmlRenderer::default().render(&highlighted, &RenderOptions::default());
//! # Ok::<(), cohl::Error>(())
//! ```

mod category;
mod error;
pub mod grammars;
pub mod languages;
mod registry;
pub mod site;
mod themes;

mod highlight;
mod markdown_fence;
mod renderers;
mod tokenizer;

pub use category::Category;
pub use error::Error;
pub use highlight::HighlightedText;
pub use markdown_fence::{ParsedFence, highlight_fence, parse_markdown_fence};
pub use registry::{
    HighlightOptions, HighlightedCode, PLAIN_GRAMMAR_NAME, Registry, global_language,
    register_global_language,
};
pub use renderers::{
    RenderOptions,
    html::{DEFAULT_CLASS_PREFIX, HtmlRenderer},
    terminal::TerminalRenderer,
};
pub use themes::{Color, FontStyle, RawStyle, RawTheme, Style, StyleModifier, Theme};
pub use tokenizer::{Region, Token, TokenizeError, Tokenized, Tokenizer};

/// Layout rules the HTML renderer output relies on, colors aside
pub const COHL_CSS: &str = r#".cohl-l {
  display: block;
}
.cohl-ln {
  display: inline-block;
  user-select: none;
  white-space: pre;
  margin-right: 0.4em;
  padding: 0.4em;
  min-width: 3ch;
  text-align: right;
  opacity: 0.8;
}
"#;
