//! # PanelNest
//!
//! Sheet nesting for cabinet and furniture panels, with manual layout editing
//! and CNC output:
//! - Best-of planning over orientation strategies and packing heuristics
//! - Flat-bed (free nesting) and beam-saw (guillotine) modes
//! - Move/rotate edits validated against sheet margin and kerf clearance
//! - Reusable offcut reports and per-sheet usage heatmaps
//! - CIX machining programs, DXF drawings and DXF save files
//!
//! ## Architecture
//!
//! PanelNest is organized as a workspace with multiple crates:
//!
//! 1. **panelnest-core** - Geometry, panel demand rows, layout and machining types
//! 2. **panelnest-nesting** - Packing bins, planner, manual edits, offcut analysis
//! 3. **panelnest-camtools** - CIX codec, tooling mapping, DXF drawings, save files, export bundles
//! 4. **panelnest-settings** - Configuration with JSON/TOML persistence
//! 5. **panelnest** - This facade, re-exporting the crates above

pub use panelnest_camtools as camtools;
pub use panelnest_core as core;
pub use panelnest_nesting as nesting;
pub use panelnest_settings as settings;

pub use panelnest_core::{
    normalize_panels, Layout, MachineType, PanelDemand, PlacedPart, PlacementError, Rect, Sheet,
    SheetParams,
};

pub use panelnest_nesting::{
    build_sheet_usage_heatmap, calculate_sheet_offcuts, compute_position_grid, move_part,
    move_part_to, plan, plan_beam_saw, plan_for, rotate_part_90, OffcutThresholds, PlanSummary,
};

pub use panelnest_camtools::{
    create_cix_zip, create_dxf_zip, load_nest_file, load_nest_from_path, parse_program,
    save_nest_to_path, CamToolError, LoadedNest, NestPayload,
};

pub use panelnest_settings::{NestSettings, SettingsError, SheetPreset};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Offcut thresholds configured in the settings.
pub fn offcut_thresholds(settings: &NestSettings) -> OffcutThresholds {
    OffcutThresholds {
        min_width: settings.offcut.min_width,
        min_height: settings.offcut.min_height,
        min_area: settings.offcut.min_area,
    }
}

/// Plan a cut list on the configured sheet and machine.
pub fn plan_with_settings(panels: &[PanelDemand], settings: &NestSettings) -> Option<Layout> {
    plan_for(settings.machine_type, panels, settings.sheet.params())
}

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support, `info` when unset
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    tracing::info!("PanelNest {} (built {})", VERSION, BUILD_DATE);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offcut_thresholds_follow_settings() {
        let mut settings = NestSettings::default();
        settings.offcut.min_width = 300.0;
        let thresholds = offcut_thresholds(&settings);
        assert_eq!(thresholds.min_width, 300.0);
        assert_eq!(thresholds.min_area, settings.offcut.min_area);
    }

    #[test]
    fn test_plan_with_settings_uses_machine_and_sheet() {
        let mut settings = NestSettings::default();
        settings.machine_type = MachineType::BeamSaw;
        settings.apply_preset(SheetPreset::Ply3050x1220);
        let panels = vec![PanelDemand::new("Side", 560.0, 720.0, 2)];

        let layout = plan_with_settings(&panels, &settings).expect("layout");
        assert_eq!(layout.sheet_width, 3050.0);
        assert_eq!(Some(layout), plan_beam_saw(&panels, 3050.0, 1220.0, 10.0, 6.0));
    }
}
