use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::CohlResult;
use crate::themes::color::Color;
use crate::themes::font_style::FontStyle;
use crate::themes::raw::RawTheme;

/// A complete style with concrete values
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct Style {
    pub foreground: Color,
    pub font_style: FontStyle,
}

impl Default for Style {
    fn default() -> Style {
        Style {
            foreground: Color::BLACK,
            font_style: FontStyle::empty(),
        }
    }
}

/// What a theme sets for one category. Unset values are inherited from the enclosing
/// category, and ultimately from the theme default style.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct StyleModifier {
    pub foreground: Option<Color>,
    pub font_style: Option<FontStyle>,
}

impl StyleModifier {
    pub fn apply_to(&self, base: &Style) -> Style {
        Style {
            foreground: self.foreground.unwrap_or(base.foreground),
            font_style: self.font_style.unwrap_or(base.font_style),
        }
    }
}

/// Category -> style mapping used by the terminal renderer and for CSS generation
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    /// Style of text outside of any region
    pub default_style: Style,
    pub background: Color,
    pub highlight_background: Option<Color>,
    pub line_number_foreground: Option<Color>,
    pub styles: BTreeMap<Category, StyleModifier>,
}

fn optional_color(value: Option<&str>) -> CohlResult<Option<Color>> {
    value.map(Color::from_hex).transpose()
}

impl Theme {
    pub fn from_raw_theme(raw: RawTheme) -> CohlResult<Self> {
        let mut styles = BTreeMap::new();
        for (category, style) in &raw.styles {
            styles.insert(
                *category,
                StyleModifier {
                    foreground: optional_color(style.foreground.as_deref())?,
                    font_style: style.font_style.as_deref().map(FontStyle::parse),
                },
            );
        }

        Ok(Self {
            default_style: Style {
                foreground: Color::from_hex(&raw.foreground)?,
                font_style: FontStyle::empty(),
            },
            background: Color::from_hex(&raw.background)?,
            highlight_background: optional_color(raw.highlight_background.as_deref())?,
            line_number_foreground: optional_color(raw.line_number_foreground.as_deref())?,
            styles,
            name: raw.name,
        })
    }

    /// The light theme used when none is given
    pub fn default_theme() -> Self {
        let fg = |hex: &str| StyleModifier {
            foreground: Color::from_hex(hex).ok(),
            font_style: None,
        };
        let styled = |hex: &str, font_style: FontStyle| StyleModifier {
            foreground: Color::from_hex(hex).ok(),
            font_style: Some(font_style),
        };

        let styles = BTreeMap::from([
            (Category::Keyword, fg("#D73A49")),
            (Category::Literal, fg("#005CC5")),
            (Category::BuiltIn, fg("#E36209")),
            (Category::Type, fg("#6F42C1")),
            (Category::String, fg("#032F62")),
            (Category::Number, fg("#005CC5")),
            (Category::Comment, styled("#6A737D", FontStyle::ITALIC)),
            (Category::Doctag, styled("#D73A49", FontStyle::BOLD)),
            (Category::Title, fg("#6F42C1")),
            (Category::ErrorMsg, styled("#B31D28", FontStyle::BOLD)),
            (Category::Meta, fg("#735C0F")),
        ]);

        Self {
            name: "cohl-light".to_owned(),
            default_style: Style {
                foreground: Color::rgb(0x24, 0x29, 0x2E),
                font_style: FontStyle::empty(),
            },
            background: Color::WHITE,
            highlight_background: Some(Color::rgb(0xFF, 0xFB, 0xDD)),
            line_number_foreground: Some(Color::rgb(0x95, 0x9D, 0xA5)),
            styles,
        }
    }

    /// Resolves the style of text nested in the given categories (outermost first)
    pub fn style_for(&self, categories: &[Category]) -> Style {
        categories
            .iter()
            .filter_map(|c| self.styles.get(c))
            .fold(self.default_style, |style, modifier| modifier.apply_to(&style))
    }

    /// Generates a stylesheet for the HTML renderer output.
    /// Category classes get the given prefix, eg `hljs-`.
    pub fn generate_css(&self, prefix: &str) -> String {
        let mut css = format!(
            "pre.cohl {{\n  {}\n  {}\n}}\n",
            self.default_style.foreground.as_css_color_property(),
            self.background.as_css_bg_color_property()
        );
        if let Some(bg) = self.highlight_background {
            css.push_str(&format!(
                ".cohl-hl {{\n  {}\n}}\n",
                bg.as_css_bg_color_property()
            ));
        }
        if let Some(fg) = self.line_number_foreground {
            css.push_str(&format!(
                ".cohl-ln {{\n  {}\n}}\n",
                fg.as_css_color_property()
            ));
        }

        for (category, modifier) in &self.styles {
            let mut properties = Vec::new();
            if let Some(fg) = modifier.foreground {
                properties.push(fg.as_css_color_property());
            }
            if let Some(font_style) = modifier.font_style {
                properties.extend(font_style.css_attributes().map(str::to_owned));
            }
            if properties.is_empty() {
                continue;
            }
            css.push_str(&format!(".{} {{\n", category.css_class(prefix)));
            for property in properties {
                css.push_str(&format!("  {property}\n"));
            }
            css.push_str("}\n");
        }
        css
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme() -> Theme {
        RawTheme::load_from_str(
            r##"{
                "name": "test",
                "foreground": "#111111",
                "background": "#FFFFFF",
                "styles": {
                    "comment": {"foreground": "#00FF00", "fontStyle": "italic"},
                    "errormsg": {"fontStyle": "bold"},
                    "function": {}
                }
            }"##,
        )
        .unwrap()
        .compile()
        .unwrap()
    }

    #[test]
    fn inner_categories_inherit() {
        let theme = theme();
        assert_eq!(theme.style_for(&[]), theme.default_style);
        let comment = theme.style_for(&[Category::Comment]);
        assert_eq!(comment.foreground, Color::rgb(0, 255, 0));
        assert_eq!(comment.font_style, FontStyle::ITALIC);

        let error = theme.style_for(&[Category::Comment, Category::ErrorMsg]);
        assert_eq!(error.foreground, Color::rgb(0, 255, 0));
        assert_eq!(error.font_style, FontStyle::BOLD);

        // no style of its own
        assert_eq!(theme.style_for(&[Category::Params]), theme.default_style);
    }

    #[test]
    fn invalid_color_fails_to_compile() {
        let raw = RawTheme::load_from_str(
            r##"{"name": "t", "foreground": "#12", "background": "#fff"}"##,
        )
        .unwrap();
        assert!(matches!(
            raw.compile(),
            Err(crate::Error::InvalidHexColor { .. })
        ));
    }

    #[test]
    fn css_output() {
        let css = theme().generate_css("hljs-");
        assert_eq!(
            css,
            "pre.cohl {
  color: #111111;
  background-color: #FFFFFF;
}
.hljs-comment {
  color: #00FF00;
  font-style: italic;
}
.hljs-errormsg {
  font-weight: bold;
}
"
        );
    }

    #[test]
    fn default_theme_styles_every_leaf_category() {
        let theme = Theme::default();
        for category in [
            Category::Keyword,
            Category::Literal,
            Category::BuiltIn,
            Category::Type,
            Category::String,
            Category::Number,
            Category::Comment,
            Category::ErrorMsg,
        ] {
            assert_ne!(theme.style_for(&[category]), theme.default_style, "{category}");
        }
    }
}
