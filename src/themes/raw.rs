use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::CohlResult;
use crate::themes::theme::Theme;

/// Style of a category as written in a theme file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
}

/// Raw theme loaded from a JSON theme file:
/// ```json
/// {
///   "name": "Paper",
///   "foreground": "#24292E",
///   "background": "#FFFFFF",
///   "styles": { "keyword": { "foreground": "#D73A49", "fontStyle": "bold" } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTheme {
    pub name: String,
    pub foreground: String,
    pub background: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number_foreground: Option<String>,
    #[serde(default)]
    pub styles: BTreeMap<Category, RawStyle>,
}

impl RawTheme {
    pub fn load_from_file(path: impl AsRef<Path>) -> CohlResult<Self> {
        let file = File::open(path)?;
        let theme = serde_json::from_reader(file)?;
        Ok(theme)
    }

    pub fn load_from_str(content: &str) -> CohlResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parses all the colors
    pub fn compile(self) -> CohlResult<Theme> {
        Theme::from_raw_theme(self)
    }
}
