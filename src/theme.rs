//! Theme loading: token colours plus btop-style `theme[key]="value"` UI colours.

use dropcombo::{TOKEN_KINDS, TokenKind};
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const TOKEN_DEFAULTS: [Color; TOKEN_KINDS] = [
    Color::Rgb(0xFF, 0x44, 0x44), // fire
    Color::Rgb(0x44, 0x44, 0xFF), // water
    Color::Rgb(0x44, 0xFF, 0x44), // wood
    Color::Rgb(0xFF, 0xFF, 0x44), // light
    Color::Rgb(0xAA, 0x44, 0xFF), // dark
    Color::Rgb(0xFF, 0x44, 0xFF), // heart
];

/// Theme keys that override token colours, indexed like [`TokenKind::ALL`].
const TOKEN_KEYS: [&str; TOKEN_KINDS] = [
    "token_fire",
    "token_water",
    "token_wood",
    "token_light",
    "token_dark",
    "token_heart",
];

/// Token palette and UI colours. UI defaults are One Dark.
#[derive(Debug, Clone)]
pub struct Theme {
    pub tokens: [Color; TOKEN_KINDS],
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (combo, counts).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text (help line).
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            tokens: TOKEN_DEFAULTS,
            bg: Color::Rgb(0x31, 0x35, 0x3F),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70),
        }
    }
}

impl Theme {
    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// No path means defaults; a path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let s = std::fs::read_to_string(path)?;
        Ok(Self::from_map(&parse_theme_file(&s)))
    }

    /// Keys missing or unparsable in `map` keep their default.
    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let defaults = Self::default();
        let mut tokens = defaults.tokens;
        for (slot, key) in tokens.iter_mut().zip(TOKEN_KEYS) {
            if let Some(color) = get(key) {
                *slot = color;
            }
        }
        Self {
            tokens,
            bg: get("meter_bg").unwrap_or(defaults.bg),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
            inactive_fg: get("inactive_fg").unwrap_or(defaults.inactive_fg),
        }
    }

    #[inline]
    pub fn token_color(&self, kind: TokenKind) -> Color {
        self.tokens[kind.index()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    if !s.is_ascii() {
        return Err(invalid());
    }
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#FF4444").unwrap();
        assert!(matches!(c, Color::Rgb(0xFF, 0x44, 0x44)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
        // Three hex letters are a colour, not a word.
        let c = parse_hex("bad").unwrap();
        assert!(matches!(c, Color::Rgb(0xBB, 0xAA, 0xDD)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GG0000").is_err());
        // Multi-byte input must not panic on slicing.
        assert!(parse_hex("aéabc").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_token_override_keeps_other_defaults() {
        let map = parse_theme_file("# comment\ntheme[token_water]='#0000FF'\ntheme[title]=\"nope\"");
        let theme = Theme::from_map(&map);
        assert_eq!(theme.token_color(TokenKind::Water), Color::Rgb(0, 0, 0xFF));
        assert_eq!(theme.token_color(TokenKind::Fire), TOKEN_DEFAULTS[0]);
        assert_eq!(theme.title, Theme::default().title);
    }
}
