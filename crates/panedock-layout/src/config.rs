#![forbid(unsafe_code)]

//! Docking configuration.
//!
//! [`DockConfig`] groups every tunable constant of the docking engine. It can
//! be loaded from TOML or JSON at startup; every field has a default, so a
//! partial file only overrides what it names.
//!
//! ```toml
//! # panedock.toml
//! ratio_min = 0.15
//! ratio_max = 0.85
//! region_margin = 0.3
//! ```

use std::fmt;
use std::path::Path;

use panedock_core::geometry::Sides;
use serde::{Deserialize, Serialize};

/// Tunable parameters for the panel tree and the drag orchestration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockConfig {
    /// Lowest split ratio any split node may hold.
    pub ratio_min: f32,
    /// Highest split ratio any split node may hold.
    pub ratio_max: f32,
    /// Share given to the newly created panel when a drop splits a leaf.
    pub split_insert_ratio: f32,
    /// Edge fraction of a viewport that classifies a drop as a split region.
    pub region_margin: f32,
    /// Gap between the two children of a split, also the divider hit area.
    pub divider_thickness: f32,
    /// Height of the tab label strip at the top of each leaf.
    pub tab_bar_height: f32,
    /// Padding applied inside every split container.
    pub panel_padding: Sides,
    /// Pointer travel before a pressed tab label starts dragging.
    pub drag_threshold: f32,
    /// Merge a non-root leaf away once its last tab is dragged out.
    pub collapse_empty_panels: bool,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            ratio_min: 0.1,
            ratio_max: 0.9,
            split_insert_ratio: 0.3,
            region_margin: 0.25,
            divider_thickness: 4.0,
            tab_bar_height: 24.0,
            panel_padding: Sides::default(),
            drag_threshold: 3.0,
            collapse_empty_panels: true,
        }
    }
}

impl DockConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.checked()
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.checked()
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(self.ratio_min > 0.0 && self.ratio_min < 1.0) {
            errors.push(format!("ratio_min must be in (0, 1), got {}", self.ratio_min));
        }
        if !(self.ratio_max > 0.0 && self.ratio_max < 1.0) {
            errors.push(format!("ratio_max must be in (0, 1), got {}", self.ratio_max));
        }
        if self.ratio_min > self.ratio_max {
            errors.push(format!(
                "ratio_min ({}) must not exceed ratio_max ({})",
                self.ratio_min, self.ratio_max
            ));
        }
        if !(self.split_insert_ratio >= self.ratio_min && self.split_insert_ratio <= 0.5) {
            errors.push(format!(
                "split_insert_ratio must be in [ratio_min, 0.5], got {}",
                self.split_insert_ratio
            ));
        }
        if !(self.region_margin >= 0.0 && self.region_margin < 0.5) {
            errors.push(format!(
                "region_margin must be in [0, 0.5), got {}",
                self.region_margin
            ));
        }
        if !(self.divider_thickness >= 0.0) {
            errors.push(format!(
                "divider_thickness must be >= 0, got {}",
                self.divider_thickness
            ));
        }
        if !(self.tab_bar_height >= 0.0) {
            errors.push(format!(
                "tab_bar_height must be >= 0, got {}",
                self.tab_bar_height
            ));
        }
        if !(self.drag_threshold >= 0.0) {
            errors.push(format!(
                "drag_threshold must be >= 0, got {}",
                self.drag_threshold
            ));
        }

        errors
    }

    /// Clamp a split ratio into `[ratio_min, ratio_max]`.
    ///
    /// Infinite inputs clamp to the nearest bound; NaN maps to the midpoint.
    /// Bounds given in the wrong order are swapped and non-finite bounds
    /// fall back to `0.0` / `1.0`, so an unvalidated config never panics.
    #[must_use]
    pub fn clamp_ratio(&self, ratio: f32) -> f32 {
        let (lo, hi) = self.ratio_bounds();
        if ratio.is_nan() {
            return (lo + hi) / 2.0;
        }
        ratio.max(lo).min(hi)
    }

    /// Effective `(low, high)` ratio bounds used by [`Self::clamp_ratio`].
    #[must_use]
    pub fn ratio_bounds(&self) -> (f32, f32) {
        let min = if self.ratio_min.is_finite() { self.ratio_min } else { 0.0 };
        let max = if self.ratio_max.is_finite() { self.ratio_max } else { 1.0 };
        (min.min(max), min.max(max))
    }

    fn checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}

/// Errors from loading a [`DockConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Parsed successfully but failed range validation.
    Invalid(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "config I/O error: {err}"),
            Self::Toml(err) => write!(f, "config TOML error: {err}"),
            Self::Json(err) => write!(f, "config JSON error: {err}"),
            Self::Invalid(errors) => write!(f, "invalid config: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Toml(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        assert!(DockConfig::default().validate().is_empty());
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = DockConfig::from_toml_str("ratio_min = 0.2\nregion_margin = 0.3\n")
            .expect("partial toml should load");
        assert_eq!(config.ratio_min, 0.2);
        assert_eq!(config.region_margin, 0.3);
        assert_eq!(config.ratio_max, 0.9);
        assert!(config.collapse_empty_panels);
    }

    #[test]
    fn json_with_padding_loads() {
        let config = DockConfig::from_json_str(
            r#"{"panel_padding": {"top": 1.0, "right": 2.0, "bottom": 3.0, "left": 4.0}}"#,
        )
        .expect("json should load");
        assert_eq!(config.panel_padding, Sides::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn inverted_ratio_bounds_are_rejected() {
        let err = DockConfig::from_toml_str("ratio_min = 0.8\nratio_max = 0.2\n")
            .expect_err("inverted bounds must fail");
        let ConfigError::Invalid(errors) = err else {
            panic!("expected validation error, got {err}");
        };
        assert!(errors.iter().any(|e| e.contains("must not exceed")));
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        let err = DockConfig::from_toml_str("ratio_min = [").expect_err("parse must fail");
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn file_loaders_read_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "drag_threshold = 8.0").expect("write config");
        let config = DockConfig::from_toml_file(file.path()).expect("toml file should load");
        assert_eq!(config.drag_threshold, 8.0);

        let missing = DockConfig::from_json_file("/definitely/not/here.json");
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn clamp_ratio_handles_out_of_range_and_nan() {
        let config = DockConfig::default();
        assert_eq!(config.clamp_ratio(1.5), 0.9);
        assert_eq!(config.clamp_ratio(-1.0), 0.1);
        assert_eq!(config.clamp_ratio(f32::INFINITY), 0.9);
        assert_eq!(config.clamp_ratio(f32::NEG_INFINITY), 0.1);
        assert!((config.clamp_ratio(f32::NAN) - 0.5).abs() < 1e-6);
        assert_eq!(config.clamp_ratio(0.42), 0.42);
    }

    #[test]
    fn clamp_ratio_tolerates_unvalidated_bounds() {
        let inverted = DockConfig {
            ratio_min: 0.9,
            ratio_max: 0.1,
            ..DockConfig::default()
        };
        assert!(!inverted.validate().is_empty());
        assert_eq!(inverted.clamp_ratio(0.95), 0.9);
        assert_eq!(inverted.clamp_ratio(0.05), 0.1);
        assert_eq!(inverted.clamp_ratio(0.7), 0.7);
        assert!((inverted.clamp_ratio(f32::NAN) - 0.5).abs() < 1e-6);

        let nan_bounds = DockConfig {
            ratio_min: f32::NAN,
            ratio_max: f32::INFINITY,
            ..DockConfig::default()
        };
        assert_eq!(nan_bounds.clamp_ratio(1.5), 1.0);
        assert_eq!(nan_bounds.clamp_ratio(-0.5), 0.0);
    }
}
