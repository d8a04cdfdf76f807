//! Available themes.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Page layout used by a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Vertical,
    Sidebar,
    Grid,
}

/// Presentation settings of a theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeConfig {
    pub id: Theme,
    pub name: &'static str,
    pub class_name: &'static str,
    pub font_family: &'static str,
    pub layout: Layout,
}

/// A selectable theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Default,
    Dark,
    Playful,
}

/// Every theme, in display order.
pub const ALL_THEMES: [Theme; 3] = [Theme::Default, Theme::Dark, Theme::Playful];

impl Theme {
    /// Identifier used for persistence.
    pub fn id(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Dark => "dark",
            Self::Playful => "playful",
        }
    }

    /// Returns the presentation settings of this theme.
    pub fn config(self) -> ThemeConfig {
        match self {
            Self::Default => ThemeConfig {
                id: self,
                name: "Theme 1 (Default)",
                class_name: "theme-default",
                font_family: "font-inter",
                layout: Layout::Vertical,
            },
            Self::Dark => ThemeConfig {
                id: self,
                name: "Theme 2 (Dark Sidebar)",
                class_name: "theme-dark",
                font_family: "font-playfair",
                layout: Layout::Sidebar,
            },
            Self::Playful => ThemeConfig {
                id: self,
                name: "Theme 3 (Playful Grid)",
                class_name: "theme-playful",
                font_family: "font-pacifico",
                layout: Layout::Grid,
            },
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The string is not the id of a known theme.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown theme '{0}'")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_THEMES
            .into_iter()
            .find(|theme| theme.id() == s)
            .ok_or_else(|| UnknownTheme(s.to_owned()))
    }
}
