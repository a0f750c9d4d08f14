use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::density::Tier;
use crate::{Error, Result};

const LIGHT_BACKGROUND: &str = "#f8f9fb";
const LIGHT_GRID: &str = "#e3e7ed";
const LIGHT_TEXT: &str = "#1f2933";
const LIGHT_PATH: &str = "#9aa5b1";
const LIGHT_SAFE: &str = "#2f9e44";
const LIGHT_WARNING: &str = "#f08c00";
const LIGHT_DANGER: &str = "#e03131";
const LIGHT_BADGE_TEXT: &str = "#ffffff";
const LIGHT_MARKER: &str = "#364fc7";
const LIGHT_CLOSED: &str = "#868e96";
const LIGHT_PANEL: &str = "#ffffff";
const LIGHT_PANEL_BORDER: &str = "#cbd2d9";

const BUILTIN_THEMES: &[(&str, &str)] = &[
    ("dark", include_str!("../themes/dark.toml")),
    ("high_contrast", include_str!("../themes/high_contrast.toml")),
    ("light", include_str!("../themes/light.toml")),
];

const FONT_SIZE: f32 = 12.0;
const ZONE_FILL_OPACITY: f32 = 0.18;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_grid")]
    pub grid: String,
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_zone_fill_opacity")]
    pub zone_fill_opacity: f32,

    #[serde(default = "default_safe")]
    pub safe: String,
    #[serde(default = "default_warning")]
    pub warning: String,
    #[serde(default = "default_danger")]
    pub danger: String,
    #[serde(default = "default_badge_text")]
    pub badge_text: String,

    #[serde(default = "default_marker")]
    pub marker: String,
    /// Marker color per occupant type.
    #[serde(default)]
    pub marker_tints: BTreeMap<String, String>,
    #[serde(default = "default_closed")]
    pub closed: String,

    #[serde(default = "default_panel")]
    pub panel: String,
    #[serde(default = "default_panel_border")]
    pub panel_border: String,

    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

fn default_background() -> String {
    LIGHT_BACKGROUND.to_string()
}
fn default_grid() -> String {
    LIGHT_GRID.to_string()
}
fn default_text() -> String {
    LIGHT_TEXT.to_string()
}
fn default_path() -> String {
    LIGHT_PATH.to_string()
}
fn default_zone_fill_opacity() -> f32 {
    ZONE_FILL_OPACITY
}
fn default_safe() -> String {
    LIGHT_SAFE.to_string()
}
fn default_warning() -> String {
    LIGHT_WARNING.to_string()
}
fn default_danger() -> String {
    LIGHT_DANGER.to_string()
}
fn default_badge_text() -> String {
    LIGHT_BADGE_TEXT.to_string()
}
fn default_marker() -> String {
    LIGHT_MARKER.to_string()
}
fn default_closed() -> String {
    LIGHT_CLOSED.to_string()
}
fn default_panel() -> String {
    LIGHT_PANEL.to_string()
}
fn default_panel_border() -> String {
    LIGHT_PANEL_BORDER.to_string()
}
fn default_font_family() -> String {
    "sans-serif".to_string()
}
fn default_font_size() -> f32 {
    FONT_SIZE
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_builtin("light").expect("built-in light theme must parse")
    }
}

impl Theme {
    pub fn from_builtin(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        let content = BUILTIN_THEMES
            .iter()
            .find(|(n, _)| *n == normalized)
            .map(|(_, c)| *c)
            .ok_or_else(|| {
                Error::Config(format!(
                    "Unknown built-in theme '{}'. Available: {}",
                    name,
                    Self::list_builtins().join(", ")
                ))
            })?;
        Self::from_toml(content)
    }

    pub fn list_builtins() -> Vec<&'static str> {
        BUILTIN_THEMES.iter().map(|(n, _)| *n).collect()
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let theme: Self = toml::from_str(content)?;
        theme.validate()?;
        Ok(theme)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let theme: Self = serde_yaml::from_str(content)?;
        theme.validate()?;
        Ok(theme)
    }

    /// Every color must be `#rrggbb`; the values are written into SVG
    /// attributes verbatim.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("background", &self.background),
            ("grid", &self.grid),
            ("text", &self.text),
            ("path", &self.path),
            ("safe", &self.safe),
            ("warning", &self.warning),
            ("danger", &self.danger),
            ("badge_text", &self.badge_text),
            ("marker", &self.marker),
            ("closed", &self.closed),
            ("panel", &self.panel),
            ("panel_border", &self.panel_border),
        ];
        let tints = self.marker_tints.iter().map(|(k, v)| (k.as_str(), v));

        for (field, value) in named.into_iter().chain(tints) {
            if parse_hex_rgb(value).is_none() {
                return Err(Error::Config(format!(
                    "theme color `{}` must be #rrggbb (got {:?})",
                    field, value
                )));
            }
        }
        Ok(())
    }

    pub fn tier_color(&self, tier: Tier) -> &str {
        match tier {
            Tier::Safe => &self.safe,
            Tier::Warning => &self.warning,
            Tier::Danger => &self.danger,
        }
    }

    /// Path stroke shaded from `path` toward `danger` as congestion rises.
    pub fn path_color(&self, congestion: f64) -> String {
        blend_hex(&self.path, &self.danger, congestion as f32)
    }

    pub fn marker_color(&self, kind: Option<&str>) -> &str {
        kind.and_then(|k| self.marker_tints.get(k))
            .map_or(self.marker.as_str(), String::as_str)
    }
}

/// Parse `#rrggbb` into unit floats.
pub fn parse_hex_rgb(value: &str) -> Option<(f32, f32, f32)> {
    let hex = value.trim().strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;
    Some((r, g, b))
}

/// Linear mix of two `#rrggbb` colors; `t` is clamped to 0..=1. Falls back
/// to `from` when either color is malformed.
pub fn blend_hex(from: &str, to: &str, t: f32) -> String {
    let (Some(a), Some(b)) = (parse_hex_rgb(from), parse_hex_rgb(to)) else {
        return from.to_string();
    };
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let channel = |x: f32, y: f32| ((x + (y - x) * t) * 255.0).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        channel(a.0, b.0),
        channel(a.1, b.1),
        channel(a.2, b.2)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_builtin_accepts_hyphenated_and_case_insensitive_names() {
        let underscore = Theme::from_builtin("high_contrast").expect("underscore variant");
        let hyphen = Theme::from_builtin("High-Contrast").expect("hyphen variant");
        assert_eq!(underscore, hyphen);
    }

    #[test]
    fn every_builtin_parses() {
        for name in Theme::list_builtins() {
            let theme = Theme::from_builtin(name).expect("builtin parses");
            for tier in Tier::ALL {
                assert!(parse_hex_rgb(theme.tier_color(tier)).is_some(), "{name}");
            }
        }
    }

    #[test]
    fn unknown_builtin_lists_alternatives() {
        let err = Theme::from_builtin("sepia").expect_err("unknown theme");
        assert!(err.to_string().contains("light"));
    }

    #[test]
    fn partial_yaml_falls_back_to_light_defaults() {
        let theme = Theme::from_yaml("danger: \"#ff0000\"\n").expect("partial yaml");
        assert_eq!(theme.danger, "#ff0000");
        assert_eq!(theme.safe, LIGHT_SAFE);
    }

    #[test]
    fn colors_must_be_hex() {
        let err = Theme::from_toml("danger = '#f00\" onload=\"x'\n").expect_err("bad color");
        assert!(err.to_string().contains("danger"));
        assert!(Theme::from_yaml("marker_tints:\n  vip: red\n").is_err());
        assert!(Theme::from_toml("safe = '#00AA00'\n").is_ok());
    }

    #[test]
    fn blend_hits_both_ends() {
        assert_eq!(blend_hex("#000000", "#ffffff", 0.0), "#000000");
        assert_eq!(blend_hex("#000000", "#ffffff", 1.0), "#ffffff");
        assert_eq!(blend_hex("#000000", "#ff0000", 0.5), "#800000");
        assert_eq!(blend_hex("#000000", "#ffffff", 9.0), "#ffffff");
        let theme = Theme::default();
        assert_eq!(theme.path_color(0.0), theme.path);
        assert_eq!(theme.path_color(1.0), theme.danger);
    }

    #[test]
    fn marker_tint_falls_back_to_default() {
        let theme = Theme::default();
        assert_eq!(theme.marker_color(Some("vip")), "#ae3ec9");
        assert_eq!(theme.marker_color(Some("unknown")), theme.marker);
        assert_eq!(theme.marker_color(None), theme.marker);
    }
}
