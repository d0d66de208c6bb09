//! DXF drawings of nested sheets
//!
//! Sheets are drawn on three named layers so that any CAD viewer can show
//! them: the sheet outline, one closed polyline per cut part, and the
//! part labels with their finished sizes. The same layers are what the
//! lossy loader in [`container`] reads back.

pub mod container;

pub use container::{decode_drawing, encode_with_snapshot, DecodedDrawing, SNAPSHOT_BEGIN, SNAPSHOT_END};

use crate::cix::format_number;
use crate::error::FileFormatResult;
use dxf::entities::{Entity, EntityType, LwPolyline, Text};
use dxf::enums::{AcadVersion, HorizontalTextJustification, VerticalTextJustification};
use dxf::tables::Layer;
use dxf::{Color, Drawing, LwPolylineVertex, Point};
use panelnest_core::PlacedPart;

pub const SHEET_BOUNDARY_LAYER: &str = "SHEET_BOUNDARY";
pub const CUT_LINES_LAYER: &str = "CUT_LINES";
pub const LABELS_LAYER: &str = "LABELS";

const LABEL_HEIGHT: f64 = 20.0;
const SIZE_HEIGHT: f64 = 15.0;
/// Size text sits this far below the label.
const SIZE_OFFSET: f64 = 25.0;

fn add_layer(drawing: &mut Drawing, name: &str, color: u8) {
    drawing.add_layer(Layer {
        name: name.to_string(),
        color: Color::from_index(color),
        ..Default::default()
    });
}

fn add_rectangle(drawing: &mut Drawing, layer: &str, x: f64, y: f64, w: f64, h: f64) {
    let mut polyline = LwPolyline::default();
    for (px, py) in [(x, y), (x + w, y), (x + w, y + h), (x, y + h)] {
        polyline.vertices.push(LwPolylineVertex {
            x: px,
            y: py,
            ..Default::default()
        });
    }
    polyline.set_is_closed(true);

    let mut entity = Entity::new(EntityType::LwPolyline(polyline));
    entity.common.layer = layer.to_string();
    drawing.add_entity(entity);
}

fn add_centered_text(drawing: &mut Drawing, value: String, x: f64, y: f64, height: f64) {
    let anchor = Point::new(x, y, 0.0);
    let text = Text {
        location: anchor.clone(),
        second_alignment_point: anchor,
        text_height: height,
        value,
        horizontal_text_justification: HorizontalTextJustification::Center,
        vertical_text_justification: VerticalTextJustification::Middle,
        ..Default::default()
    };
    let mut entity = Entity::new(EntityType::Text(text));
    entity.common.layer = LABELS_LAYER.to_string();
    drawing.add_entity(entity);
}

/// Drawing of one sheet with its parts, labels and sizes.
pub fn sheet_drawing(sheet_width: f64, sheet_height: f64, parts: &[PlacedPart]) -> Drawing {
    let mut drawing = Drawing::new();
    drawing.header.version = AcadVersion::R2000;
    add_layer(&mut drawing, SHEET_BOUNDARY_LAYER, 1);
    add_layer(&mut drawing, CUT_LINES_LAYER, 3);
    add_layer(&mut drawing, LABELS_LAYER, 7);

    add_rectangle(&mut drawing, SHEET_BOUNDARY_LAYER, 0.0, 0.0, sheet_width, sheet_height);
    for part in parts {
        add_rectangle(&mut drawing, CUT_LINES_LAYER, part.x, part.y, part.w, part.h);
        let (cx, cy) = (part.x + part.w / 2.0, part.y + part.h / 2.0);
        add_centered_text(&mut drawing, part.source_label.clone(), cx, cy, LABEL_HEIGHT);
        add_centered_text(
            &mut drawing,
            format!("{}x{}", format_number(part.w), format_number(part.h)),
            cx,
            cy - SIZE_OFFSET,
            SIZE_HEIGHT,
        );
    }
    drawing
}

/// Serialize a drawing to DXF text.
pub fn drawing_to_bytes(drawing: &Drawing) -> FileFormatResult<Vec<u8>> {
    let mut buffer = Vec::new();
    drawing.save(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_drawing_layers_and_entities() {
        let parts = vec![PlacedPart {
            id: "S1-P1".to_string(),
            source_label: "Side".to_string(),
            x: 10.0,
            y: 10.0,
            w: 560.0,
            h: 720.0,
            rotated: false,
        }];
        let drawing = sheet_drawing(2440.0, 1220.0, &parts);

        let layers: Vec<&str> = drawing.layers().map(|l| l.name.as_str()).collect();
        for name in [SHEET_BOUNDARY_LAYER, CUT_LINES_LAYER, LABELS_LAYER] {
            assert!(layers.contains(&name), "missing layer {name}");
        }

        let texts: Vec<String> = drawing
            .entities()
            .filter_map(|e| match &e.specific {
                EntityType::Text(t) => Some(t.value.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["Side".to_string(), "560x720".to_string()]);
        assert_eq!(drawing.entities().count(), 4);
    }
}
