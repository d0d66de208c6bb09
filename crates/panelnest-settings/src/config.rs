//! Configuration for PanelNest
//!
//! Provides the defaults the planner, the offcut report and the CIX exporter
//! start from. Supports JSON and TOML files stored in a platform-specific
//! configuration directory.
//!
//! Configuration is organized into sections:
//! - Sheet stock (size, margin, kerf, thickness)
//! - Offcut report thresholds
//! - Machine and export preferences

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
use panelnest_core::{MachineType, SheetParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "settings.toml";

/// Named stock sizes offered alongside a custom size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetPreset {
    /// Size entered by hand
    #[default]
    Custom,
    /// 2800 x 2070 MDF board
    Mdf2800x2070,
    /// 3050 x 1220 plywood board
    Ply3050x1220,
}

impl SheetPreset {
    /// Stock width and height; `None` for a custom size.
    pub fn dimensions(self) -> Option<(f64, f64)> {
        match self {
            Self::Custom => None,
            Self::Mdf2800x2070 => Some((2800.0, 2070.0)),
            Self::Ply3050x1220 => Some((3050.0, 1220.0)),
        }
    }
}

impl std::fmt::Display for SheetPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Custom => write!(f, "Custom"),
            Self::Mdf2800x2070 => write!(f, "MDF 2800x2070"),
            Self::Ply3050x1220 => write!(f, "Ply 3050x1220"),
        }
    }
}

/// Sheet stock settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSettings {
    /// Preset the size was taken from
    pub preset: SheetPreset,
    pub width: f64,
    pub height: f64,
    /// Unused border around the sheet edge
    pub margin: f64,
    /// Blade/cutter width
    pub kerf: f64,
    /// Board thickness written to CIX programs
    pub thickness: f64,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            preset: SheetPreset::Custom,
            width: 2440.0,
            height: 1220.0,
            margin: 10.0,
            kerf: 6.0,
            thickness: 18.0,
        }
    }
}

impl SheetSettings {
    pub fn params(&self) -> SheetParams {
        SheetParams::new(self.width, self.height, self.margin, self.kerf)
    }
}

/// Offcut report thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffcutSettings {
    pub min_width: f64,
    pub min_height: f64,
    pub min_area: f64,
}

impl Default for OffcutSettings {
    fn default() -> Self {
        Self {
            min_width: 120.0,
            min_height: 120.0,
            min_area: 25_000.0,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestSettings {
    pub machine_type: MachineType,
    /// Heatmap cell edge length
    pub heatmap_cell_size: f64,
    /// Spacing of the manual placement legality grid
    pub grid_step: f64,
    /// Router used for part contours when a template names none
    pub default_routing_tool: String,
    // Tables last so the TOML form stays valid.
    pub sheet: SheetSettings,
    pub offcut: OffcutSettings,
}

impl Default for NestSettings {
    fn default() -> Self {
        Self {
            machine_type: MachineType::FlatBed,
            heatmap_cell_size: 100.0,
            grid_step: 25.0,
            default_routing_tool: "E001".to_string(),
            sheet: SheetSettings::default(),
            offcut: OffcutSettings::default(),
        }
    }
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> ConfigResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Format::Json),
        Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Format::Toml),
        _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
    }
}

fn out_of_range(key: &str, value: f64) -> ConfigError {
    ConfigError::ValueOutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
}

impl NestSettings {
    /// Create new settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the sheet to a preset's stock size; `Custom` keeps the current size.
    pub fn apply_preset(&mut self, preset: SheetPreset) {
        if let Some((width, height)) = preset.dimensions() {
            self.sheet.width = width;
            self.sheet.height = height;
        }
        self.sheet.preset = preset;
    }

    /// Load settings from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;
        let settings: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate settings
    pub fn validate(&self) -> ConfigResult<()> {
        let sheet = &self.sheet;
        if !(sheet.width > 0.0) {
            return Err(out_of_range("sheet.width", sheet.width));
        }
        if !(sheet.height > 0.0) {
            return Err(out_of_range("sheet.height", sheet.height));
        }
        if !(sheet.margin >= 0.0) {
            return Err(out_of_range("sheet.margin", sheet.margin));
        }
        if !(sheet.kerf >= 0.0) {
            return Err(out_of_range("sheet.kerf", sheet.kerf));
        }
        if sheet.params().usable_rect().area() <= 0.0 {
            return Err(ConfigError::NoUsableArea {
                width: sheet.width,
                height: sheet.height,
                margin: sheet.margin,
            });
        }

        if !(self.heatmap_cell_size > 0.0) {
            return Err(out_of_range("heatmap_cell_size", self.heatmap_cell_size));
        }
        if !(self.grid_step > 0.0) {
            return Err(out_of_range("grid_step", self.grid_step));
        }

        Ok(())
    }
}

/// Platform config location, e.g. `~/.config/panelnest/settings.toml`.
pub fn default_config_path() -> SettingsResult<PathBuf> {
    let mut path = dirs::config_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| SettingsError::ConfigDirectory("no config or home directory".to_string()))?;
    path.push("panelnest");
    path.push(CONFIG_FILE_NAME);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = NestSettings::default();
        assert_eq!(settings.sheet.params(), SheetParams::new(2440.0, 1220.0, 10.0, 6.0));
        assert_eq!(settings.sheet.thickness, 18.0);
        assert_eq!(settings.machine_type, MachineType::FlatBed);
        assert_eq!(settings.offcut.min_area, 25_000.0);
        assert_eq!(settings.default_routing_tool, "E001");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_apply_preset() {
        let mut settings = NestSettings::new();
        settings.apply_preset(SheetPreset::Mdf2800x2070);
        assert_eq!((settings.sheet.width, settings.sheet.height), (2800.0, 2070.0));

        settings.apply_preset(SheetPreset::Custom);
        assert_eq!(settings.sheet.preset, SheetPreset::Custom);
        assert_eq!(settings.sheet.width, 2800.0);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = NestSettings::new();
        settings.sheet.kerf = -1.0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::ValueOutOfRange { ref key, .. }) if key == "sheet.kerf"
        ));

        let mut settings = NestSettings::new();
        settings.sheet.margin = 700.0;
        assert!(matches!(settings.validate(), Err(ConfigError::NoUsableArea { .. })));

        let mut settings = NestSettings::new();
        settings.sheet.width = f64::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: NestSettings = toml::from_str("[sheet]\nwidth = 3050.0\n").unwrap();
        assert_eq!(settings.sheet.width, 3050.0);
        assert_eq!(settings.sheet.height, 1220.0);
        assert_eq!(settings.grid_step, 25.0);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = NestSettings::new().save_to_file(Path::new("settings.yaml"));
        assert!(matches!(
            result,
            Err(SettingsError::Config(ConfigError::UnsupportedFormat(_)))
        ));
    }

    #[test]
    fn test_default_config_path_ends_with_file_name() {
        if let Ok(path) = default_config_path() {
            assert!(path.ends_with(Path::new("panelnest").join(CONFIG_FILE_NAME)));
        }
    }
}
