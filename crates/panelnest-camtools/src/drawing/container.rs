//! Nest snapshots inside DXF files
//!
//! A saved nest is an ordinary DXF drawing whose leading `999` comment
//! group carries the whole planning state as base64-encoded JSON, framed by
//! [`SNAPSHOT_BEGIN`] and [`SNAPSHOT_END`]. CAD programs ignore comments, so
//! the file still opens as a drawing, and loading it recovers the JSON byte
//! for byte.
//!
//! Files without the markers come from elsewhere. They are rebuilt from
//! their geometry instead: the outline on the sheet boundary layer gives the
//! sheet size and every outline on the cut lines layer becomes one panel.

use super::{CUT_LINES_LAYER, LABELS_LAYER, SHEET_BOUNDARY_LAYER};
use crate::error::{FileFormatError, FileFormatResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dxf::entities::EntityType;
use dxf::Drawing;
use panelnest_core::{PanelDemand, Rect, GRAIN_SUFFIX};
use tracing::info;

pub const SNAPSHOT_BEGIN: &str = "PANELNEST_SNAPSHOT_BEGIN";
pub const SNAPSHOT_END: &str = "PANELNEST_SNAPSHOT_END";

/// Longest base64 run written per comment line.
pub const CHUNK_LEN: usize = 250;

const COMMENT_CODE: &str = "999";

/// Prepend a snapshot comment group to DXF text.
pub fn encode_with_snapshot(json: &str, drawing: &[u8]) -> Vec<u8> {
    let encoded = STANDARD.encode(json.as_bytes());
    let mut out = String::with_capacity(encoded.len() + encoded.len() / CHUNK_LEN * 5 + 64);

    let mut comment = |value: &str| {
        out.push_str(COMMENT_CODE);
        out.push('\n');
        out.push_str(value);
        out.push('\n');
    };
    comment(SNAPSHOT_BEGIN);
    // base64 output is ASCII, so byte chunks are valid str slices.
    for chunk in encoded.as_bytes().chunks(CHUNK_LEN) {
        comment(&String::from_utf8_lossy(chunk));
    }
    comment(SNAPSHOT_END);

    let mut bytes = out.into_bytes();
    bytes.extend_from_slice(drawing);
    bytes
}

/// Values of every `999` comment pair, in file order.
fn comments(text: &str) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    lines
        .chunks(2)
        .filter(|pair| pair.len() == 2 && pair[0].trim() == COMMENT_CODE)
        .map(|pair| pair[1].trim())
        .collect()
}

/// DXF text with every `999` comment pair removed.
fn without_comments(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out = String::with_capacity(text.len());
    for pair in lines.chunks(2).filter(|pair| pair[0].trim() != COMMENT_CODE) {
        for line in pair {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// The snapshot JSON, if the file carries one.
///
/// A begin marker without an end marker, or a body that does not decode, is
/// an error rather than a silent fallback to geometry.
pub fn extract_snapshot(bytes: &[u8]) -> FileFormatResult<Option<String>> {
    let text = String::from_utf8_lossy(bytes);
    let comments = comments(&text);

    let Some(begin) = comments.iter().position(|c| *c == SNAPSHOT_BEGIN) else {
        return Ok(None);
    };
    let body = &comments[begin + 1..];
    let end = body
        .iter()
        .position(|c| *c == SNAPSHOT_END)
        .ok_or_else(|| FileFormatError::MissingMarker(SNAPSHOT_END.to_string()))?;

    let encoded: String = body[..end].concat();
    let decoded = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| FileFormatError::MissingMarker(format!("snapshot body is not base64: {e}")))?;
    let json = String::from_utf8(decoded)
        .map_err(|e| FileFormatError::MissingMarker(format!("snapshot body is not UTF-8: {e}")))?;
    Ok(Some(json))
}

/// What a DXF file turned out to contain.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedDrawing {
    /// Lossless snapshot JSON
    Snapshot(String),
    /// Panels rebuilt from outlines
    Geometry {
        /// Width and height of the sheet outline, when one was drawn
        sheet: Option<(f64, f64)>,
        panels: Vec<PanelDemand>,
    },
}

/// Bounding box of a polyline entity, when it has at least one vertex.
fn outline_bounds(specific: &EntityType) -> Option<Rect> {
    let points: Vec<(f64, f64)> = match specific {
        EntityType::LwPolyline(polyline) => polyline.vertices.iter().map(|v| (v.x, v.y)).collect(),
        EntityType::Polyline(polyline) => polyline
            .vertices()
            .map(|v| (v.location.x, v.location.y))
            .collect(),
        _ => return None,
    };
    let (first, rest) = points.split_first()?;
    let (mut x1, mut y1, mut x2, mut y2) = (first.0, first.1, first.0, first.1);
    for &(x, y) in rest {
        x1 = x1.min(x);
        y1 = y1.min(y);
        x2 = x2.max(x);
        y2 = y2.max(y);
    }
    let rect = Rect::new(x1, y1, x2 - x1, y2 - y1);
    (rect.w > 0.0 && rect.h > 0.0).then_some(rect)
}

/// Label closest to the outline's center, among the labels inside it.
fn nearest_label<'a>(rect: &Rect, labels: &'a [(f64, f64, String)]) -> Option<&'a str> {
    let (cx, cy) = (rect.x + rect.w / 2.0, rect.y + rect.h / 2.0);
    labels
        .iter()
        .filter(|(x, y, _)| *x >= rect.x && *x <= rect.right() && *y >= rect.y && *y <= rect.top())
        .min_by(|a, b| {
            let da = (a.0 - cx).powi(2) + (a.1 - cy).powi(2);
            let db = (b.0 - cx).powi(2) + (b.1 - cy).powi(2);
            da.total_cmp(&db)
        })
        .map(|(_, _, value)| value.as_str())
}

/// Rebuild panels from the outlines of a drawing without a snapshot.
///
/// Comment pairs are dropped before the drawing is parsed, so a save file
/// with damaged snapshot markers still loads as geometry.
pub fn reconstruct_geometry(bytes: &[u8]) -> FileFormatResult<DecodedDrawing> {
    let text = String::from_utf8_lossy(bytes);
    let drawing = if comments(&text).is_empty() {
        Drawing::load(&mut &bytes[..])?
    } else {
        Drawing::load(&mut without_comments(&text).as_bytes())?
    };

    let mut sheet = None;
    let mut cuts = Vec::new();
    let mut labels = Vec::new();
    for entity in drawing.entities() {
        let layer = entity.common.layer.as_str();
        if layer.eq_ignore_ascii_case(LABELS_LAYER) {
            if let EntityType::Text(text) = &entity.specific {
                labels.push((text.location.x, text.location.y, text.value.clone()));
            }
        } else if layer.eq_ignore_ascii_case(SHEET_BOUNDARY_LAYER) {
            if let Some(rect) = outline_bounds(&entity.specific) {
                sheet.get_or_insert((rect.w, rect.h));
            }
        } else if layer.eq_ignore_ascii_case(CUT_LINES_LAYER) {
            cuts.extend(outline_bounds(&entity.specific));
        }
    }

    if cuts.is_empty() {
        return Err(FileFormatError::NoGeometry(format!(
            "no closed outline on layer {CUT_LINES_LAYER}"
        )));
    }

    let panels = cuts
        .iter()
        .enumerate()
        .map(|(i, rect)| {
            let label = nearest_label(rect, &labels)
                .map(|l| l.strip_suffix(GRAIN_SUFFIX).unwrap_or(l).to_string())
                .unwrap_or_else(|| format!("Part {}", i + 1));
            PanelDemand::new(label, rect.w, rect.h, 1)
        })
        .collect();
    Ok(DecodedDrawing::Geometry { sheet, panels })
}

/// Snapshot when present, otherwise geometry.
pub fn decode_drawing(bytes: &[u8]) -> FileFormatResult<DecodedDrawing> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(FileFormatError::EmptyFile("DXF file has no content".to_string()));
    }
    match extract_snapshot(bytes)? {
        Some(json) => {
            info!("Loading nest from embedded snapshot ({} bytes of JSON)", json.len());
            Ok(DecodedDrawing::Snapshot(json))
        }
        None => {
            info!("No snapshot markers found, rebuilding panels from drawing geometry");
            reconstruct_geometry(bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::{drawing_to_bytes, sheet_drawing};
    use panelnest_core::PlacedPart;

    fn placed(label: &str, x: f64, y: f64, w: f64, h: f64) -> PlacedPart {
        PlacedPart {
            id: "S1-P1".to_string(),
            source_label: label.to_string(),
            x,
            y,
            w,
            h,
            rotated: false,
        }
    }

    #[test]
    fn test_snapshot_round_trip_is_exact() {
        let json = format!("{{\"nest_name\":\"{}\",\"note\":\"ünïcode\"}}", "x".repeat(700));
        let bytes = encode_with_snapshot(&json, b"  0\nEOF\n");
        assert_eq!(extract_snapshot(&bytes).unwrap(), Some(json));
    }

    #[test]
    fn test_snapshot_lines_are_chunked() {
        let json = "y".repeat(1000);
        let bytes = encode_with_snapshot(&json, b"");
        let text = String::from_utf8(bytes).unwrap();
        let chunks = comments(&text);
        assert_eq!(chunks.first(), Some(&SNAPSHOT_BEGIN));
        assert_eq!(chunks.last(), Some(&SNAPSHOT_END));
        assert!(chunks.iter().all(|c| c.len() <= CHUNK_LEN));
        assert!(chunks.len() > 3);
    }

    #[test]
    fn test_missing_end_marker_is_an_error() {
        let text = format!("999\n{SNAPSHOT_BEGIN}\n999\nabcd\n  0\nEOF\n");
        assert!(matches!(
            extract_snapshot(text.as_bytes()),
            Err(FileFormatError::MissingMarker(_))
        ));
    }

    #[test]
    fn test_geometry_fallback_rebuilds_panels() {
        let parts = vec![placed("Door(G)", 10.0, 10.0, 400.0, 700.0), placed("Shelf", 420.0, 10.0, 500.0, 300.0)];
        let bytes = drawing_to_bytes(&sheet_drawing(2440.0, 1220.0, &parts)).unwrap();

        let DecodedDrawing::Geometry { sheet, panels } = decode_drawing(&bytes).unwrap() else {
            panic!("expected geometry");
        };
        assert_eq!(sheet, Some((2440.0, 1220.0)));
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].label, "Door");
        assert_eq!((panels[0].width, panels[0].length), (400.0, 700.0));
        assert_eq!(panels[0].quantity, 1);
        assert!(!panels[0].grain_locked);
        assert_eq!(panels[1].label, "Shelf");
    }

    #[test]
    fn test_comment_pairs_are_stripped() {
        let text = "999\nhello\n  0\nSECTION\n999\nagain\n  0\nEOF\n";
        assert_eq!(without_comments(text), "  0\nSECTION\n  0\nEOF\n");
    }

    #[test]
    fn test_snapshot_file_without_markers_falls_back_to_geometry() {
        let parts = vec![placed("Side", 10.0, 10.0, 560.0, 720.0)];
        let drawing = drawing_to_bytes(&sheet_drawing(2440.0, 1220.0, &parts)).unwrap();
        let saved = String::from_utf8(encode_with_snapshot("{\"nest_name\":\"x\"}", &drawing)).unwrap();
        let damaged = saved
            .replace(&format!("999\n{SNAPSHOT_BEGIN}\n"), "")
            .replace(&format!("999\n{SNAPSHOT_END}\n"), "");
        assert!(!damaged.contains(SNAPSHOT_BEGIN));

        let DecodedDrawing::Geometry { sheet, panels } = decode_drawing(damaged.as_bytes()).unwrap() else {
            panic!("expected geometry");
        };
        assert_eq!(sheet, Some((2440.0, 1220.0)));
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].label, "Side");
        assert_eq!((panels[0].width, panels[0].length), (560.0, 720.0));
    }

    #[test]
    fn test_drawing_without_cut_lines_is_an_error() {
        let bytes = drawing_to_bytes(&sheet_drawing(2440.0, 1220.0, &[])).unwrap();
        assert!(matches!(decode_drawing(&bytes), Err(FileFormatError::NoGeometry(_))));
        assert!(matches!(decode_drawing(b"  \n"), Err(FileFormatError::EmptyFile(_))));
    }
}
