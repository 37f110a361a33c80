//! Info strings of Markdown fenced code blocks, eg ```` ```co,linenos,hl_lines=2-3 ````

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::error::CohlResult;
use crate::registry::{HighlightOptions, PLAIN_GRAMMAR_NAME, Registry};
use crate::renderers::RenderOptions;
use crate::renderers::html::HtmlRenderer;

#[derive(Debug)]
pub struct ParsedFence<'f> {
    pub lang: &'f str,
    pub options: RenderOptions,
    /// Every other `key=value`, rendered as `data-*` attributes
    pub rest: BTreeMap<String, String>,
}

fn parse_range(s: &str) -> Option<RangeInclusive<usize>> {
    match s.split_once('-') {
        Some((from, to)) => {
            let mut from = from.parse().ok()?;
            let mut to = to.parse().ok()?;
            if to < from {
                std::mem::swap(&mut from, &mut to);
            }
            Some(from..=to)
        }
        None => {
            let val = s.parse().ok()?;
            Some(val..=val)
        }
    }
}

/// Space separated ranges, invalid ones are ignored
fn parse_ranges(s: &str) -> Vec<RangeInclusive<usize>> {
    s.split_whitespace().filter_map(parse_range).collect()
}

pub fn parse_markdown_fence(fence: &str) -> ParsedFence<'_> {
    let mut language = None;
    let mut options = RenderOptions::default();
    let mut rest = BTreeMap::new();

    for token in fence.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let (key, value) = match token.split_once('=') {
            Some((key, value)) => (key.trim(), Some(value.trim())),
            None => (token, None),
        };
        match (key, value) {
            ("linenos", _) => options.show_line_numbers = true,
            ("linenostart", Some(value)) => {
                if let Ok(start) = value.parse() {
                    options.line_number_start = start;
                }
            }
            ("hl_lines", Some(value)) => options.highlight_lines.extend(parse_ranges(value)),
            ("hide_lines", Some(value)) => options.hide_lines.extend(parse_ranges(value)),
            (key, Some(value)) => {
                rest.insert(key.to_string(), value.to_string());
            }
            (key, None) => language = Some(key),
        }
    }

    ParsedFence {
        lang: language.unwrap_or(""),
        options,
        rest,
    }
}

/// Renders a fenced code block to HTML with the grammar registered under the fence language.
///
/// Blocks without a language, or with one the registry doesn't know, are rendered as plain
/// text.
pub fn highlight_fence(registry: &Registry, info: &str, code: &str) -> CohlResult<String> {
    let fence = parse_markdown_fence(info);
    let lang = if fence.lang.is_empty() {
        PLAIN_GRAMMAR_NAME
    } else {
        fence.lang
    };
    let highlighted = registry.highlight(code, HighlightOptions::new(lang).fallback_to_plain(true))?;
    let renderer = HtmlRenderer {
        other_metadata: fence.rest,
        ..Default::default()
    };
    Ok(renderer.render(&highlighted, &fence.options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammars::RawGrammar;
    use crate::languages::co::{self, CoVersion};

    #[test]
    fn test_language_only() {
        let result = parse_markdown_fence("co");
        assert_eq!(result.lang, "co");
        assert_eq!(result.options, RenderOptions::default());
        assert!(result.rest.is_empty());
    }

    #[test]
    fn test_empty_string() {
        let result = parse_markdown_fence("");
        assert_eq!(result.lang, "");
        assert_eq!(result.options, RenderOptions::default());
        assert!(result.rest.is_empty());
    }

    #[test]
    fn test_line_number_start() {
        let result = parse_markdown_fence("co,linenos,linenostart=-2");
        assert_eq!(result.lang, "co");
        assert!(result.options.show_line_numbers);
        assert_eq!(result.options.line_number_start, -2);

        let result = parse_markdown_fence("co,linenostart=x");
        assert_eq!(result.options.line_number_start, 1);
    }

    #[test]
    fn test_line_ranges() {
        let result = parse_markdown_fence("co,hl_lines=1-3 5 9-7 x,hide_lines=2 4-6");
        assert_eq!(result.options.highlight_lines, vec![1..=3, 5..=5, 7..=9]);
        assert_eq!(result.options.hide_lines, vec![2..=2, 4..=6]);
    }

    #[test]
    fn test_complex_combination() {
        let result = parse_markdown_fence(
            " co , linenos,linenostart=10,hl_lines=1-3 5,hide_lines=2,name = test,copy=true",
        );
        assert_eq!(result.lang, "co");
        assert!(result.options.show_line_numbers);
        assert_eq!(result.options.line_number_start, 10);
        assert_eq!(result.options.highlight_lines, vec![1..=3, 5..=5]);
        assert_eq!(result.options.hide_lines, vec![2..=2]);
        assert_eq!(result.rest.get("name"), Some(&"test".to_string()));
        assert_eq!(result.rest.get("copy"), Some(&"true".to_string()));
    }

    #[test]
    fn highlights_co_fence() {
        let mut registry = Registry::default();
        registry
            .register_language("co", co::grammar(CoVersion::Current))
            .unwrap();
        let html = highlight_fence(&registry, "co,linenos,name=demo", "// hi").unwrap();
        insta::assert_snapshot!(html, @r#"<pre class="cohl"><code class="language-co" data-lang="co" data-name="demo"><span class="cohl-l"><span class="cohl-ln">1</span><span class="hljs-comment">// hi</span></span></code></pre>"#);

        // re-registering the tag changes what fences use
        registry
            .register_language("co", RawGrammar {
                name: "Bare".to_owned(),
                ..Default::default()
            })
            .unwrap();
        let html = highlight_fence(&registry, "co", "// hi").unwrap();
        assert!(!html.contains("hljs-comment"));
    }

    #[test]
    fn huge_line_number_start_is_clamped() {
        let registry = Registry::default();
        let html = highlight_fence(
            &registry,
            "plain,linenos,linenostart=9223372036854775807",
            "a\nb",
        )
        .unwrap();
        assert_eq!(html.matches(r#"<span class="cohl-ln">9223372036854775807</span>"#).count(), 2);
    }

    #[test]
    fn unknown_fence_language_is_plain() {
        let registry = Registry::default();
        let html = highlight_fence(&registry, "", "a < b").unwrap();
        assert_eq!(
            html,
            r#"<pre class="cohl"><code class="language-plain" data-lang="plain"><span class="cohl-l">a &lt; b</span></code></pre>"#
        );
        let html = highlight_fence(&registry, "zig", "x").unwrap();
        assert!(html.contains(r#"data-lang="plain""#));
    }
}
