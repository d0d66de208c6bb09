//! Per-sheet export bundles
//!
//! Both bundles are zip archives in memory with one file per sheet, named
//! `Sheet_<n>` after the sheet's 1-based position in the layout.

use crate::cix::CixEmitter;
use crate::drawing::{drawing_to_bytes, sheet_drawing};
use crate::error::CamToolResult;
use crate::tooling::ToolingLookup;
use panelnest_core::{CixPreview, Layout, PanelDemand};
use panelnest_settings::NestSettings;
use std::io::{Cursor, Write};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn write_bundle<I>(files: I) -> CamToolResult<Vec<u8>>
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, contents) in files {
        zip.start_file(name, options)?;
        zip.write_all(&contents)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// One `Sheet_<n>.dxf` drawing per sheet.
pub fn create_dxf_zip(layout: &Layout) -> CamToolResult<Vec<u8>> {
    let files = layout
        .sheets
        .iter()
        .enumerate()
        .map(|(i, sheet)| {
            let drawing = sheet_drawing(layout.sheet_width, layout.sheet_height, &sheet.parts);
            Ok((format!("Sheet_{}.dxf", i + 1), drawing_to_bytes(&drawing)?))
        })
        .collect::<CamToolResult<Vec<_>>>()?;
    info!("Exporting {} DXF sheets", files.len());
    write_bundle(files)
}

/// One `Sheet_<n>.cix` program per non-empty sheet.
///
/// Parts pick up tooling from their panel's template, falling back to the
/// loaded program when one is given. Board thickness comes from that program
/// too, otherwise from the settings.
pub fn create_cix_zip(
    layout: &Layout,
    shared_preview: Option<&CixPreview>,
    panels: &[PanelDemand],
    settings: &NestSettings,
) -> CamToolResult<Vec<u8>> {
    let lookup = ToolingLookup::from_panels(panels).with_shared(shared_preview.map(CixPreview::to_template));
    let thickness = shared_preview
        .map(|p| p.panel_thickness)
        .filter(|t| *t > 0.0)
        .unwrap_or(settings.sheet.thickness);
    let emitter = CixEmitter::new(layout.sheet_width, layout.sheet_height, thickness)
        .with_default_tool(settings.default_routing_tool.clone());

    let files: Vec<(String, Vec<u8>)> = layout
        .sheets
        .iter()
        .enumerate()
        .filter(|(_, sheet)| !sheet.parts.is_empty())
        .map(|(i, sheet)| {
            let program = emitter.emit(&sheet.parts, &lookup);
            (format!("Sheet_{}.cix", i + 1), program.into_bytes())
        })
        .collect();
    info!("Exporting {} CIX programs", files.len());
    write_bundle(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelnest_core::{PlacedPart, Sheet, SheetParams};
    use std::io::Read;
    use zip::ZipArchive;

    fn layout() -> Layout {
        let mut layout = Layout::new(SheetParams::new(2440.0, 1220.0, 10.0, 6.0));
        layout.sheets = vec![
            Sheet {
                sheet_index: 0,
                parts: vec![PlacedPart {
                    id: "S1-P1".to_string(),
                    source_label: "Side".to_string(),
                    x: 10.0,
                    y: 10.0,
                    w: 560.0,
                    h: 720.0,
                    rotated: false,
                }],
            },
            Sheet {
                sheet_index: 1,
                parts: Vec::new(),
            },
        ];
        layout
    }

    fn entries(bytes: Vec<u8>) -> Vec<(String, String)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut contents = String::new();
                file.read_to_string(&mut contents).unwrap();
                (file.name().to_string(), contents)
            })
            .collect()
    }

    #[test]
    fn test_dxf_zip_has_every_sheet() {
        let files = entries(create_dxf_zip(&layout()).unwrap());
        let names: Vec<&str> = files.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Sheet_1.dxf", "Sheet_2.dxf"]);
        assert!(files[0].1.contains("CUT_LINES"));
    }

    #[test]
    fn test_cix_zip_skips_empty_sheets_and_uses_settings() {
        let mut settings = NestSettings::default();
        settings.sheet.thickness = 19.0;
        settings.default_routing_tool = "E042".to_string();

        let files = entries(create_cix_zip(&layout(), None, &[], &settings).unwrap());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "Sheet_1.cix");
        assert!(files[0].1.contains("LPZ=19"));
        assert!(files[0].1.contains("E042"));
    }

    #[test]
    fn test_cix_zip_takes_thickness_from_loaded_program() {
        let preview = CixPreview {
            panel_width: 560.0,
            panel_length: 720.0,
            panel_thickness: 25.0,
            ..CixPreview::default()
        };
        let files = entries(create_cix_zip(&layout(), Some(&preview), &[], &NestSettings::default()).unwrap());
        assert!(files[0].1.contains("LPZ=25"));
    }
}
