use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::renderers::html::HtmlEscaped;
use crate::themes::{Color, Theme};
use crate::tokenizer::Token;

/// A piece of a single line with the categories it's nested in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightedText {
    pub text: String,
    /// Outermost first, empty for plain text
    pub categories: Vec<Category>,
}

impl HighlightedText {
    /// The innermost category, the one that decides how this text looks
    pub fn category(&self) -> Option<Category> {
        self.categories.last().copied()
    }

    /// Renders this text as nested `<span>`, one per category.
    /// Plain text is only escaped.
    pub fn as_html(&self, class_prefix: &str) -> String {
        let escaped = HtmlEscaped(self.text.as_str());
        let mut out = String::with_capacity(self.text.len() + 30 * self.categories.len());
        for category in &self.categories {
            out.push_str(&format!(
                r#"<span class="{}">"#,
                category.css_class(class_prefix)
            ));
        }
        out.push_str(&escaped.to_string());
        for _ in &self.categories {
            out.push_str("</span>");
        }
        out
    }

    /// Appends this text to `out` with ANSI truecolor escapes
    pub fn as_ansi(&self, theme: &Theme, background: Option<Color>, out: &mut String) {
        let style = theme.style_for(&self.categories);
        out.push_str("\x1b[");
        style.foreground.as_ansi_fg(out);
        if let Some(bg) = background {
            out.push(';');
            bg.as_ansi_bg(out);
        }
        for code in style.font_style.ansi_codes() {
            out.push(';');
            out.push_str(code);
        }
        out.push('m');
        out.push_str(&self.text);
        out.push_str("\x1b[0m");
    }
}

/// Options for token merging behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergingOptions {
    /// Neighbouring pieces of a line with the same categories become one
    pub merge_same_category_tokens: bool,
}

impl Default for MergingOptions {
    fn default() -> Self {
        Self {
            merge_same_category_tokens: true,
        }
    }
}

/// Cuts the tokenizer output on newlines. There is always one entry per line of `content`,
/// empty lines giving an empty vec.
pub(crate) fn split_into_lines(
    content: &str,
    tokens: &[Token],
    options: MergingOptions,
) -> Vec<Vec<HighlightedText>> {
    let mut lines: Vec<Vec<HighlightedText>> = vec![Vec::new()];

    for token in tokens {
        let text = &content[token.span.clone()];
        for (idx, part) in text.split('\n').enumerate() {
            if idx > 0 {
                lines.push(Vec::new());
            }
            if part.is_empty() {
                continue;
            }
            let Some(line) = lines.last_mut() else {
                continue;
            };
            match line.last_mut() {
                Some(prev)
                    if options.merge_same_category_tokens
                        && prev.categories == token.categories =>
                {
                    prev.text.push_str(part);
                }
                _ => line.push(HighlightedText {
                    text: part.to_owned(),
                    categories: token.categories.clone(),
                }),
            }
        }
    }

    lines
}
