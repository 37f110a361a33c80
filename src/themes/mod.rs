mod color;
mod font_style;
mod raw;
mod theme;

pub use color::Color;
pub use font_style::FontStyle;
pub use raw::{RawStyle, RawTheme};
pub use theme::{Style, StyleModifier, Theme};
