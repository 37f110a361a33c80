use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Debug,
)]
pub struct FontStyle {
    bits: u8,
}

impl FontStyle {
    /// Bold font style
    pub const BOLD: Self = Self { bits: 1 };
    /// Underline font style
    pub const UNDERLINE: Self = Self { bits: 2 };
    /// Italic font style
    pub const ITALIC: Self = Self { bits: 4 };

    /// Returns an empty set of flags
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Parses a space separated list like `"bold italic"`. Unknown words are ignored.
    pub fn parse(font_style_str: &str) -> Self {
        let mut font_style = Self::empty();
        for word in font_style_str.split_whitespace() {
            match word {
                "bold" => font_style.insert(FontStyle::BOLD),
                "italic" => font_style.insert(FontStyle::ITALIC),
                "underline" => font_style.insert(FontStyle::UNDERLINE),
                _ => {}
            }
        }
        font_style
    }

    pub fn insert(&mut self, other: Self) {
        self.bits |= other.bits;
    }

    pub(crate) fn css_attributes(&self) -> impl Iterator<Item = &'static str> {
        [
            (FontStyle::BOLD, "font-weight: bold;"),
            (FontStyle::ITALIC, "font-style: italic;"),
            (FontStyle::UNDERLINE, "text-decoration: underline;"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, attr)| attr)
    }

    /// SGR codes for the terminal
    pub(crate) fn ansi_codes(&self) -> impl Iterator<Item = &'static str> {
        [
            (FontStyle::BOLD, "1"),
            (FontStyle::ITALIC, "3"),
            (FontStyle::UNDERLINE, "4"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, code)| code)
    }
}
