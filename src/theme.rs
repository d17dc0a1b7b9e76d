//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::Palette;
use crate::piece::PieceColor;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Blob colours and UI colours, One Dark unless a theme file overrides them.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Indexed by [`PieceColor::index`]: red, blue, green, yellow.
    pub blobs: [Color; 4],
    /// Well background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, chain).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Hints and secondary text.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

const ONEDARK_BLOBS: [Color; 4] = [
    Color::Rgb(0xE0, 0x6C, 0x75), // cpu_end / red
    Color::Rgb(0x61, 0xAF, 0xEF), // cpu_box / blue
    Color::Rgb(0x98, 0xC3, 0x79), // mem_box / green
    Color::Rgb(0xE5, 0xC0, 0x7B), // title / yellow
];

const HIGH_CONTRAST_BLOBS: [Color; 4] = [
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0x00, 0x88, 0xFF),
    Color::Rgb(0x00, 0xFF, 0x00),
    Color::Rgb(0xFF, 0xFF, 0x00),
];

// Blue/orange/teal/magenta stay apart under the common colour-vision deficiencies.
const COLORBLIND_BLOBS: [Color; 4] = [
    Color::Rgb(0xEE, 0x77, 0x33),
    Color::Rgb(0x00, 0x77, 0xBB),
    Color::Rgb(0x00, 0x99, 0x88),
    Color::Rgb(0xEE, 0x33, 0x77),
];

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    pub fn onedark_default() -> Self {
        Self {
            blobs: ONEDARK_BLOBS,
            bg: Color::Rgb(0x31, 0x35, 0x3F),          // meter_bg
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),    // div_line
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),     // main_fg
            title: Color::Rgb(0xE5, 0xC0, 0x7B),       // title
            inactive_fg: Color::Rgb(0x5C, 0x63, 0x70), // inactive_fg
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// A missing path (or None) gives the One Dark defaults; `palette` is applied on top.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            _ => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => self.blobs = HIGH_CONTRAST_BLOBS,
            Palette::Colorblind => self.blobs = COLORBLIND_BLOBS,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |keys: &[&str]| keys.iter().find_map(|k| map.get(*k).and_then(|v| parse_hex(v).ok()));
        let base = Self::onedark_default();
        // Keys match onedark.theme.
        Self {
            blobs: [
                get(&["cpu_end", "temp_end"]).unwrap_or(base.blobs[0]),
                get(&["cpu_box"]).unwrap_or(base.blobs[1]),
                get(&["mem_box", "cpu_start"]).unwrap_or(base.blobs[2]),
                get(&["title", "cpu_mid"]).unwrap_or(base.blobs[3]),
            ],
            bg: get(&["meter_bg"]).unwrap_or(base.bg),
            div_line: get(&["div_line"]).unwrap_or(base.div_line),
            main_fg: get(&["main_fg"]).unwrap_or(base.main_fg),
            title: get(&["title"]).unwrap_or(base.title),
            inactive_fg: get(&["inactive_fg"]).unwrap_or(base.inactive_fg),
        }
    }

    #[inline]
    pub fn blob_color(&self, color: PieceColor) -> Color {
        self.blobs[color.index()]
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
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .ok_or_else(invalid)
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
