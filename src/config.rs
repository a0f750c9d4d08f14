use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::density::Thresholds;
use crate::layout::SizeFactors;
use crate::theme::Theme;
use crate::{Error, Result};

const MARKER_RADIUS: f32 = 3.0;

/// Renderer configuration. Every field has a default so partial files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Fallback density thresholds; a venue may override them.
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub zone_scale: SizeFactors,
    #[serde(default = "default_marker_radius")]
    pub marker_radius: f32,
    /// Built-in theme name.
    #[serde(default = "default_theme_name")]
    pub theme: String,
    /// Inline palette; replaces the named theme when present.
    #[serde(default)]
    pub palette: Option<Theme>,
}

fn default_marker_radius() -> f32 {
    MARKER_RADIUS
}
fn default_theme_name() -> String {
    "light".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            zone_scale: SizeFactors::default(),
            marker_radius: MARKER_RADIUS,
            theme: default_theme_name(),
            palette: None,
        }
    }
}

impl RenderConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validated()
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validated()
    }

    /// Load from disk. `.yaml`/`.yml` parse as YAML; anything else tries
    /// TOML first, then YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml(&content),
            _ => Self::from_toml(&content).or_else(|toml_err| {
                Self::from_yaml(&content).map_err(|_| toml_err)
            }),
        }
    }

    pub fn resolve_theme(&self) -> Result<Theme> {
        match &self.palette {
            Some(palette) => Ok(palette.clone()),
            None => Theme::from_builtin(&self.theme),
        }
    }

    fn validated(self) -> Result<Self> {
        if !self.thresholds.is_valid() {
            return Err(Error::Config(format!(
                "thresholds must satisfy 0 <= low < high (got low={}, high={})",
                self.thresholds.low, self.thresholds.high
            )));
        }
        if !(self.zone_scale.width > 0.0 && self.zone_scale.height > 0.0) {
            return Err(Error::Config("zone_scale factors must be positive".to_string()));
        }
        if !(self.marker_radius.is_finite() && self.marker_radius > 0.0) {
            return Err(Error::Config("marker_radius must be positive".to_string()));
        }
        if let Some(palette) = &self.palette {
            palette.validate()?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_all_defaults() {
        assert_eq!(RenderConfig::from_toml("").expect("empty"), RenderConfig::default());
    }

    #[test]
    fn toml_overrides_thresholds_and_palette() {
        let config = RenderConfig::from_toml(
            r##"
            marker_radius = 2.5

            [thresholds]
            low = 3.0
            high = 3.5

            [palette]
            danger = "#990000"
            "##,
        )
        .expect("valid config");

        assert_eq!(config.thresholds, Thresholds { low: 3.0, high: 3.5 });
        assert_eq!(config.marker_radius, 2.5);
        let theme = config.resolve_theme().expect("palette");
        assert_eq!(theme.danger, "#990000");
    }

    #[test]
    fn yaml_selects_builtin_theme() {
        let config = RenderConfig::from_yaml("theme: dark\nzone_scale:\n  width: 8.0\n")
            .expect("valid yaml");
        assert_eq!(config.zone_scale.width, 8.0);
        assert_eq!(config.zone_scale.height, 4.0);
        assert_eq!(
            config.resolve_theme().expect("dark"),
            Theme::from_builtin("dark").expect("dark")
        );
    }

    #[test]
    fn palette_colors_are_checked() {
        let err = RenderConfig::from_toml("[palette]\nsafe = 'green\" stroke=\"x'\n")
            .expect_err("quote in color");
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("safe"));
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let err = RenderConfig::from_toml("[thresholds]\nlow = 4.0\nhigh = 2.0\n")
            .expect_err("inverted");
        assert!(matches!(err, Error::Config(_)));
    }
}
