use crate::registry::HighlightedCode;
use crate::renderers::RenderOptions;
use std::collections::BTreeMap;
use std::fmt;

/// Prefix of the category classes, the one highlight.js stylesheets expect
pub const DEFAULT_CLASS_PREFIX: &str = "hljs-";

#[derive(Debug, PartialEq, Clone)]
/// A renderer that will output proper HTML code.
///
/// Nothing is styled inline: categories become classes and the look comes from a stylesheet,
/// eg one made by [`Theme::generate_css`](crate::Theme::generate_css).
pub struct HtmlRenderer {
    /// Any metadata we want to add as `<code>` data-* attribute
    pub other_metadata: BTreeMap<String, String>,
    /// Prepended to the category names to get the span classes
    pub class_prefix: String,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self {
            other_metadata: BTreeMap::new(),
            class_prefix: DEFAULT_CLASS_PREFIX.to_owned(),
        }
    }
}

impl HtmlRenderer {
    /// Renders the given highlighted code to an HTML string, escaping characters.
    /// Line spans are not separated: they need [`COHL_CSS`](crate::COHL_CSS) to be displayed as blocks.
    pub fn render(&self, highlighted: &HighlightedCode, options: &RenderOptions) -> String {
        let lang = HtmlEscaped(&highlighted.language);

        let mut lines = Vec::with_capacity(highlighted.lines.len());
        for (idx, line_tokens) in highlighted.lines.iter().enumerate() {
            let line_num = idx + 1; // 1-indexed

            if options.is_hidden(line_num) {
                continue;
            }

            let line_content: String = line_tokens
                .iter()
                .map(|tok| tok.as_html(&self.class_prefix))
                .collect();

            // Line number (uses original source line number)
            let line_number_html = if options.show_line_numbers {
                let display_line_num = options.line_number(idx);
                format!(r#"<span class="cohl-ln">{display_line_num}</span>"#)
            } else {
                String::new()
            };

            let class = if options.is_highlighted(line_num) {
                "cohl-l cohl-hl"
            } else {
                "cohl-l"
            };
            lines.push(format!(
                r#"<span class="{class}">{line_number_html}{line_content}</span>"#
            ));
        }
        let lines = lines.join("");

        // Build data attributes from other_metadata
        let mut data_attrs = format!(r#"class="language-{lang}" data-lang="{lang}""#);
        for (key, value) in &self.other_metadata {
            // lowercase and replace non-alphanumeric chars with hyphens
            let slugified_key: String = key
                .to_lowercase()
                .chars()
                .map(|c| {
                    if c.is_alphanumeric() || c == '-' {
                        c
                    } else {
                        '-'
                    }
                })
                .collect();
            data_attrs.push_str(&format!(
                r#" data-{slugified_key}="{}""#,
                HtmlEscaped(value)
            ));
        }

        format!(r#"<pre class="cohl"><code {data_attrs}>{lines}</code></pre>"#)
    }
}

// From syntect
pub(crate) struct HtmlEscaped<'a>(pub &'a str);
impl fmt::Display for HtmlEscaped<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Because the internet is always right, turns out there's not that many
        // characters to escape: http://stackoverflow.com/questions/7381974
        let Self(s) = *self;
        let pile_o_bits = s;
        let mut last = 0;
        for (i, ch) in s.bytes().enumerate() {
            let escaped = match ch {
                b'>' => "&gt;",
                b'<' => "&lt;",
                b'&' => "&amp;",
                b'\'' => "&#39;",
                b'"' => "&quot;",
                _ => continue,
            };
            fmt.write_str(&pile_o_bits[last..i])?;
            fmt.write_str(escaped)?;
            last = i + 1;
        }

        if last < s.len() {
            fmt.write_str(&pile_o_bits[last..])?;
        }
        Ok(())
    }
}
