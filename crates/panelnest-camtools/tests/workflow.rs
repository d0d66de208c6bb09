//! Settings to plan, analysis, export and a save/load round trip

use panelnest_camtools::{create_cix_zip, create_dxf_zip, load_nest_from_path, save_nest_to_path, NestPayload};
use panelnest_core::{Layout, MachineType, PanelDemand};
use panelnest_nesting::{
    build_sheet_usage_heatmap, calculate_sheet_offcuts, plan_for, rotate_part_90, OffcutThresholds, PlanSummary,
};
use panelnest_settings::{NestSettings, SheetPreset};
use tempfile::TempDir;

fn cut_list() -> Vec<PanelDemand> {
    vec![
        PanelDemand::new("Side", 560.0, 720.0, 2),
        PanelDemand::new("Top", 800.0, 560.0, 1),
        PanelDemand::new("Door", 397.0, 713.0, 2).with_grain_locked(true),
        PanelDemand::new("Shelf", 764.0, 300.0, 3),
    ]
}

fn planned(panels: &[PanelDemand], settings: &NestSettings) -> Layout {
    plan_for(settings.machine_type, panels, settings.sheet.params()).expect("layout")
}

#[test]
fn test_plan_analyze_export_save_load() {
    let mut settings = NestSettings::default();
    settings.apply_preset(SheetPreset::Mdf2800x2070);
    let panels = cut_list();

    let layout = planned(&panels, &settings);
    assert!(PlanSummary::of(&panels, &layout).is_complete());
    assert_eq!(layout.sheet_width, 2800.0);

    let sheet = &layout.sheets[0];
    let thresholds = OffcutThresholds {
        min_width: settings.offcut.min_width,
        min_height: settings.offcut.min_height,
        min_area: settings.offcut.min_area,
    };
    let report = calculate_sheet_offcuts(&layout, sheet, thresholds);
    assert!(report.used_area > 0.0);
    let heatmap = build_sheet_usage_heatmap(&layout, sheet, settings.heatmap_cell_size);
    assert!(!heatmap.is_empty());

    assert!(!create_dxf_zip(&layout).unwrap().is_empty());
    assert!(!create_cix_zip(&layout, None, &panels, &settings).unwrap().is_empty());

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cabinet.dxf");
    let payload = NestPayload::build(
        "Cabinet",
        settings.machine_type,
        settings.sheet.params(),
        panels,
        Some(layout.clone()),
        None,
    );
    save_nest_to_path(&path, &payload).unwrap();
    let loaded = load_nest_from_path(&path).unwrap();
    assert_eq!(loaded.layout, Some(layout));
    assert_eq!(loaded.machine_type, MachineType::FlatBed);
}

#[test]
fn test_rejected_rotation_reports_reason() {
    let settings = NestSettings::default();
    let layout = planned(&[PanelDemand::new("Long", 2000.0, 300.0, 1)], &settings);
    let id = layout.sheets[0].parts[0].id.clone();

    let err = rotate_part_90(&layout, 0, &id).unwrap_err();
    assert_eq!(err.to_string(), "Out of sheet bounds (margin respected).");
}
