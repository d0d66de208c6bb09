//! Nest save files
//!
//! A nest is saved as a DXF drawing of its first sheet with the complete
//! [`NestPayload`] embedded as a snapshot comment. Loading dispatches on the
//! file extension: `.dxf` files restore the snapshot (or rebuild panels from
//! geometry when there is none) and `.cix` programs become a one-panel nest
//! that carries the program as its tooling.

use crate::cix::parse_program;
use crate::drawing::{decode_drawing, drawing_to_bytes, encode_with_snapshot, sheet_drawing, DecodedDrawing};
use crate::error::{CamToolResult, FileFormatError};
use chrono::{DateTime, Utc};
use panelnest_core::{normalize_panels, CixPreview, Layout, MachineType, PanelDemand, SheetParams};
use panelnest_nesting::plan_for;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

pub const PAYLOAD_VERSION: u32 = 1;
pub const DEFAULT_NEST_NAME: &str = "Untitled";

fn payload_version() -> u32 {
    PAYLOAD_VERSION
}

fn default_nest_name() -> String {
    DEFAULT_NEST_NAME.to_string()
}

fn default_sheet_w() -> f64 {
    2440.0
}

fn default_sheet_h() -> f64 {
    1220.0
}

fn default_margin() -> f64 {
    10.0
}

fn default_kerf() -> f64 {
    6.0
}

/// Panels are stored as plain rows and pass through normalization on the way in.
fn deserialize_panels<'de, D>(deserializer: D) -> Result<Vec<PanelDemand>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(normalize_panels(&rows))
}

/// Sheet scalars of a saved nest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayloadSettings {
    #[serde(default = "default_sheet_w")]
    pub sheet_w: f64,
    #[serde(default = "default_sheet_h")]
    pub sheet_h: f64,
    #[serde(default = "default_margin")]
    pub margin: f64,
    #[serde(default = "default_kerf")]
    pub kerf: f64,
}

impl Default for PayloadSettings {
    fn default() -> Self {
        Self {
            sheet_w: default_sheet_w(),
            sheet_h: default_sheet_h(),
            margin: default_margin(),
            kerf: default_kerf(),
        }
    }
}

impl From<SheetParams> for PayloadSettings {
    fn from(params: SheetParams) -> Self {
        Self {
            sheet_w: params.sheet_width,
            sheet_h: params.sheet_height,
            margin: params.margin,
            kerf: params.kerf,
        }
    }
}

impl From<PayloadSettings> for SheetParams {
    fn from(settings: PayloadSettings) -> Self {
        SheetParams::new(settings.sheet_w, settings.sheet_h, settings.margin, settings.kerf)
    }
}

/// Everything needed to restore a nest exactly.
///
/// Every field has a default so older or hand-edited snapshots still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestPayload {
    #[serde(default = "payload_version")]
    pub version: u32,
    #[serde(default = "default_nest_name")]
    pub nest_name: String,
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub machine_type: MachineType,
    #[serde(default)]
    pub settings: PayloadSettings,
    #[serde(default, deserialize_with = "deserialize_panels")]
    pub panels: Vec<PanelDemand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cix_preview: Option<CixPreview>,
}

impl NestPayload {
    /// Assemble a payload, planning a layout when none is supplied.
    pub fn build(
        nest_name: impl Into<String>,
        machine_type: MachineType,
        params: SheetParams,
        panels: Vec<PanelDemand>,
        layout: Option<Layout>,
        cix_preview: Option<CixPreview>,
    ) -> Self {
        let layout = match layout {
            Some(layout) => Some(layout),
            None if !panels.is_empty() => plan_for(machine_type, &panels, params),
            None => None,
        };
        Self {
            version: PAYLOAD_VERSION,
            nest_name: nest_name.into(),
            saved_at: Utc::now(),
            machine_type,
            settings: params.into(),
            panels,
            layout,
            cix_preview,
        }
    }

    pub fn params(&self) -> SheetParams {
        self.settings.into()
    }

    pub fn into_loaded(self) -> LoadedNest {
        LoadedNest {
            params: self.params(),
            nest_name: self.nest_name,
            machine_type: self.machine_type,
            panels: self.panels,
            layout: self.layout,
            cix_preview: self.cix_preview,
        }
    }
}

/// A nest restored from disk, ready for planning and editing.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedNest {
    pub nest_name: String,
    pub machine_type: MachineType,
    pub params: SheetParams,
    pub panels: Vec<PanelDemand>,
    pub layout: Option<Layout>,
    pub cix_preview: Option<CixPreview>,
}

/// Serialize a payload into a DXF save file.
pub fn payload_to_dxf(payload: &NestPayload) -> CamToolResult<Vec<u8>> {
    let json = serde_json::to_string(payload)?;
    let params = payload.params();
    let parts = payload
        .layout
        .as_ref()
        .and_then(|layout| layout.sheets.first())
        .map(|sheet| sheet.parts.as_slice())
        .unwrap_or_default();
    let drawing = drawing_to_bytes(&sheet_drawing(params.sheet_width, params.sheet_height, parts))?;
    Ok(encode_with_snapshot(&json, &drawing))
}

fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default_nest_name)
}

fn load_dxf(stem: String, bytes: &[u8]) -> CamToolResult<LoadedNest> {
    match decode_drawing(bytes)? {
        DecodedDrawing::Snapshot(json) => {
            let payload: NestPayload = serde_json::from_str(&json)?;
            Ok(payload.into_loaded())
        }
        DecodedDrawing::Geometry { sheet, panels } => {
            let defaults = PayloadSettings::default();
            let (sheet_w, sheet_h) = sheet.unwrap_or((defaults.sheet_w, defaults.sheet_h));
            let params = SheetParams::new(sheet_w, sheet_h, defaults.margin, defaults.kerf);
            Ok(NestPayload::build(stem, MachineType::default(), params, panels, None, None).into_loaded())
        }
    }
}

fn load_cix(stem: String, bytes: &[u8]) -> CamToolResult<LoadedNest> {
    let preview = parse_program(&String::from_utf8_lossy(bytes))?;
    info!(
        "Loaded CIX program {} ({}x{}, {} operations)",
        stem,
        preview.panel_width,
        preview.panel_length,
        preview.operations.len()
    );
    let panel = PanelDemand::new(stem.clone(), preview.panel_width, preview.panel_length, 1)
        .with_tooling(preview.to_template());
    let params = PayloadSettings::default().into();
    Ok(NestPayload::build(stem, MachineType::default(), params, vec![panel], None, Some(preview)).into_loaded())
}

/// Load a nest from file contents, dispatching on the file name's extension.
pub fn load_nest_file(file_name: &str, bytes: &[u8]) -> CamToolResult<LoadedNest> {
    let extension = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let stem = file_stem(file_name);
    match extension.as_str() {
        "dxf" => load_dxf(stem, bytes),
        "cix" => load_cix(stem, bytes),
        _ => Err(FileFormatError::UnknownExtension(file_name.to_string()).into()),
    }
}

pub fn save_nest_to_path(path: &Path, payload: &NestPayload) -> CamToolResult<()> {
    fs::write(path, payload_to_dxf(payload)?)?;
    info!("Saved nest '{}' to {}", payload.nest_name, path.display());
    Ok(())
}

pub fn load_nest_from_path(path: &Path) -> CamToolResult<LoadedNest> {
    let bytes = fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    load_nest_file(&file_name, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CamToolError;

    fn panels() -> Vec<PanelDemand> {
        vec![
            PanelDemand::new("Side", 560.0, 720.0, 2),
            PanelDemand::new("Door", 400.0, 700.0, 1).with_grain_locked(true),
        ]
    }

    #[test]
    fn test_build_plans_missing_layout() {
        let params = SheetParams::new(2440.0, 1220.0, 10.0, 6.0);
        let payload = NestPayload::build("Kitchen", MachineType::FlatBed, params, panels(), None, None);
        assert_eq!(payload.version, PAYLOAD_VERSION);
        assert_eq!(payload.layout.as_ref().map(Layout::part_count), Some(3));

        let empty = NestPayload::build("Empty", MachineType::FlatBed, params, Vec::new(), None, None);
        assert!(empty.layout.is_none());
    }

    #[test]
    fn test_payload_defaults_when_fields_are_missing() {
        let payload: NestPayload = serde_json::from_str("{}").unwrap();
        let loaded = payload.into_loaded();
        assert_eq!(loaded.nest_name, "Untitled");
        assert_eq!(loaded.params, SheetParams::new(2440.0, 1220.0, 10.0, 6.0));
        assert_eq!(loaded.machine_type, MachineType::FlatBed);
        assert!(loaded.panels.is_empty());
    }

    #[test]
    fn test_payload_panels_are_normalized() {
        let json = r#"{"machine_type": "Selco", "panels": [{"Label": "Shelf", "Width": "500", "Length": 300, "Qty": "2", "Grain?": "yes"}]}"#;
        let payload: NestPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.machine_type, MachineType::BeamSaw);
        assert_eq!(payload.panels.len(), 1);
        assert_eq!(payload.panels[0].width, 500.0);
        assert_eq!(payload.panels[0].quantity, 2);
        assert!(payload.panels[0].grain_locked);
    }

    #[test]
    fn test_dxf_save_restores_payload_exactly() {
        let params = SheetParams::new(2800.0, 2070.0, 15.0, 4.0);
        let payload = NestPayload::build("Wardrobe", MachineType::BeamSaw, params, panels(), None, None);
        let bytes = payload_to_dxf(&payload).unwrap();

        let loaded = load_nest_file("wardrobe.DXF", &bytes).unwrap();
        assert_eq!(loaded, payload.into_loaded());
    }

    #[test]
    fn test_save_file_opens_as_plain_drawing() {
        use crate::drawing::{CUT_LINES_LAYER, SHEET_BOUNDARY_LAYER};

        let params = SheetParams::new(2440.0, 1220.0, 10.0, 6.0);
        let payload = NestPayload::build("Kitchen", MachineType::FlatBed, params, panels(), None, None);
        let bytes = payload_to_dxf(&payload).unwrap();

        // A CAD reader sees the snapshot only as comments.
        let drawing = dxf::Drawing::load(&mut bytes.as_slice()).unwrap();
        let on_layer = |layer: &str| drawing.entities().filter(|e| e.common.layer == layer).count();
        assert_eq!(on_layer(SHEET_BOUNDARY_LAYER), 1);
        assert_eq!(on_layer(CUT_LINES_LAYER), 3);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let err = load_nest_file("nest.svg", b"<svg/>").unwrap_err();
        assert!(matches!(
            err,
            CamToolError::FileFormat(FileFormatError::UnknownExtension(_))
        ));
    }

    #[test]
    fn test_cix_file_becomes_single_panel_nest() {
        let program = "BEGIN MAINDATA\nLPX=600\nLPY=400\nLPZ=18\nEND MAINDATA\n";
        let loaded = load_nest_file("cabinet_side.cix", program.as_bytes()).unwrap();
        assert_eq!(loaded.nest_name, "cabinet_side");
        assert_eq!(loaded.panels.len(), 1);
        assert_eq!(loaded.panels[0].label, "cabinet_side");
        assert_eq!((loaded.panels[0].width, loaded.panels[0].length), (600.0, 400.0));
        assert!(loaded.panels[0].tooling.is_some());
        assert_eq!(loaded.cix_preview.map(|p| p.panel_thickness), Some(18.0));
        assert_eq!(loaded.layout.map(|l| l.part_count()), Some(1));
    }
}
