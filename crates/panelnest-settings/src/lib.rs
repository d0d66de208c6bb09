//! PanelNest Settings Crate
//!
//! Typed defaults for sheet stock, machine choice, offcut reporting and CIX
//! export, persisted as JSON or TOML.

pub mod config;
pub mod error;

pub use config::{
    default_config_path, NestSettings, OffcutSettings, SheetPreset, SheetSettings, CONFIG_FILE_NAME,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
