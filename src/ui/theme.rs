use std::fs;
use std::path::{Path, PathBuf};

use ratatui::style::Color;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Embed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

pub const DARK: &str = "dark";
pub const LIGHT: &str = "light";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThemeColors {
    pub bg: String,
    pub fg: String,
    pub text_correct: String,
    pub text_incorrect: String,
    pub text_incorrect_bg: String,
    pub text_pending: String,
    pub text_cursor_bg: String,
    pub text_cursor_fg: String,
    pub accent: String,
    pub border: String,
    pub border_focused: String,
    pub header_bg: String,
    pub header_fg: String,
    pub key_idle: String,
    pub key_idle_fg: String,
    pub key_seen: String,
    pub key_seen_fg: String,
    pub key_held: String,
    pub key_held_fg: String,
    pub error: String,
    pub warning: String,
    pub success: String,
}

impl Theme {
    /// Load `name` from the user theme directory, then from the bundled set.
    pub fn load(name: &str) -> Option<Self> {
        Self::load_with_user_dir(name, Self::user_dir().as_deref())
    }

    pub fn load_with_user_dir(name: &str, user_dir: Option<&Path>) -> Option<Self> {
        if let Some(dir) = user_dir {
            let user_theme_path = dir.join(format!("{name}.toml"));
            if let Ok(content) = fs::read_to_string(&user_theme_path) {
                match toml::from_str::<Theme>(&content) {
                    Ok(theme) => return Some(theme),
                    Err(e) => warn!(path = %user_theme_path.display(), "bad user theme: {e}"),
                }
            }
        }

        let filename = format!("{name}.toml");
        let file = ThemeAssets::get(&filename)?;
        let content = std::str::from_utf8(file.data.as_ref()).ok()?;
        toml::from_str::<Theme>(content).ok()
    }

    fn user_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("keycheck").join("themes"))
    }

    pub fn available_themes() -> Vec<String> {
        ThemeAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(|n| n.to_string()))
            .collect()
    }

    /// Name of the opposite theme for the dark/light toggle.
    pub fn toggled_name(&self) -> &'static str {
        if self.name == LIGHT { DARK } else { LIGHT }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::load(DARK).unwrap_or_else(|| Self {
            name: DARK.to_string(),
            colors: ThemeColors::default(),
        })
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            bg: "#14161b".to_string(),
            fg: "#d8dee9".to_string(),
            text_correct: "#a3be8c".to_string(),
            text_incorrect: "#bf616a".to_string(),
            text_incorrect_bg: "#3b2228".to_string(),
            text_pending: "#616e88".to_string(),
            text_cursor_bg: "#d8dee9".to_string(),
            text_cursor_fg: "#14161b".to_string(),
            accent: "#88c0d0".to_string(),
            border: "#3b4252".to_string(),
            border_focused: "#88c0d0".to_string(),
            header_bg: "#1f232b".to_string(),
            header_fg: "#eceff4".to_string(),
            key_idle: "#2e3440".to_string(),
            key_idle_fg: "#81a1c1".to_string(),
            key_seen: "#4c566a".to_string(),
            key_seen_fg: "#eceff4".to_string(),
            key_held: "#ebcb8b".to_string(),
            key_held_fg: "#14161b".to_string(),
            error: "#bf616a".to_string(),
            warning: "#ebcb8b".to_string(),
            success: "#a3be8c".to_string(),
        }
    }
}

impl ThemeColors {
    pub fn parse_color(hex: &str) -> Color {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Color::Rgb(r, g, b);
            }
        }
        Color::White
    }

    pub fn bg(&self) -> Color { Self::parse_color(&self.bg) }
    pub fn fg(&self) -> Color { Self::parse_color(&self.fg) }
    pub fn text_correct(&self) -> Color { Self::parse_color(&self.text_correct) }
    pub fn text_incorrect(&self) -> Color { Self::parse_color(&self.text_incorrect) }
    pub fn text_incorrect_bg(&self) -> Color { Self::parse_color(&self.text_incorrect_bg) }
    pub fn text_pending(&self) -> Color { Self::parse_color(&self.text_pending) }
    pub fn text_cursor_bg(&self) -> Color { Self::parse_color(&self.text_cursor_bg) }
    pub fn text_cursor_fg(&self) -> Color { Self::parse_color(&self.text_cursor_fg) }
    pub fn accent(&self) -> Color { Self::parse_color(&self.accent) }
    pub fn border(&self) -> Color { Self::parse_color(&self.border) }
    pub fn border_focused(&self) -> Color { Self::parse_color(&self.border_focused) }
    pub fn header_bg(&self) -> Color { Self::parse_color(&self.header_bg) }
    pub fn header_fg(&self) -> Color { Self::parse_color(&self.header_fg) }
    pub fn key_idle(&self) -> Color { Self::parse_color(&self.key_idle) }
    pub fn key_idle_fg(&self) -> Color { Self::parse_color(&self.key_idle_fg) }
    pub fn key_seen(&self) -> Color { Self::parse_color(&self.key_seen) }
    pub fn key_seen_fg(&self) -> Color { Self::parse_color(&self.key_seen_fg) }
    pub fn key_held(&self) -> Color { Self::parse_color(&self.key_held) }
    pub fn key_held_fg(&self) -> Color { Self::parse_color(&self.key_held_fg) }
    pub fn error(&self) -> Color { Self::parse_color(&self.error) }
    pub fn warning(&self) -> Color { Self::parse_color(&self.warning) }
    pub fn success(&self) -> Color { Self::parse_color(&self.success) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_themes_parse() {
        let mut names = Theme::available_themes();
        names.sort();
        assert_eq!(names, vec!["dark", "light"]);
        for name in names {
            assert!(Theme::load_with_user_dir(&name, None).is_some(), "{name}");
        }
    }

    #[test]
    fn test_user_dir_overrides_bundled() {
        let dir = TempDir::new().unwrap();
        let mut custom = Theme::load_with_user_dir(DARK, None).unwrap();
        custom.colors.accent = "#ff0000".to_string();
        fs::write(dir.path().join("dark.toml"), toml::to_string(&custom).unwrap()).unwrap();

        let loaded = Theme::load_with_user_dir(DARK, Some(dir.path())).unwrap();
        assert_eq!(loaded.colors.accent(), Color::Rgb(255, 0, 0));
    }

    #[test]
    fn test_unknown_theme_is_none() {
        assert!(Theme::load_with_user_dir("solarized", None).is_none());
    }

    #[test]
    fn test_toggle_alternates() {
        let dark = Theme::load_with_user_dir(DARK, None).unwrap();
        assert_eq!(dark.toggled_name(), LIGHT);
        let light = Theme::load_with_user_dir(LIGHT, None).unwrap();
        assert_eq!(light.toggled_name(), DARK);
    }

    #[test]
    fn test_parse_color_falls_back_to_white() {
        assert_eq!(ThemeColors::parse_color("#0a0b0c"), Color::Rgb(10, 11, 12));
        assert_eq!(ThemeColors::parse_color("nope"), Color::White);
    }
}
