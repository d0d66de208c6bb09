//! CIX sheet program generation
//!
//! One program per sheet: the `MAINDATA` header with the sheet size, then
//! for every placed part its rectangular contour as a `GEO` polyline, the
//! contour routing, and the machining of the part's tooling template
//! remapped onto the sheet.

use super::{format_number, MacroKind};
use crate::tooling::{PartFrame, ToolingLookup};
use panelnest_core::{MachiningOperation, PlacedPart, Segment, ToolingTemplate};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Router used for contours when no template declares one.
pub const DEFAULT_ROUTING_TOOL: &str = "E001";

/// Endpoint tolerance when chaining template segments into polylines.
const CHAIN_TOLERANCE: f64 = 1e-6;

fn id_regex() -> &'static Regex {
    static ID_REGEX: OnceLock<Regex> = OnceLock::new();
    ID_REGEX.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").expect("invalid regex pattern"))
}

/// Geometry id safe for the macro language: `[A-Z0-9_]`, never empty.
pub fn sanitize_id(label: &str) -> String {
    let cleaned = id_regex().replace_all(label.trim(), "_");
    let cleaned = cleaned.trim_matches('_').to_ascii_uppercase();
    if cleaned.is_empty() {
        "PART".to_string()
    } else {
        cleaned
    }
}

/// Split template segments into polylines, each segment starting where the
/// previous one ended.
pub fn chain_segments(segments: &[Segment]) -> Vec<Vec<Segment>> {
    let mut chains: Vec<Vec<Segment>> = Vec::new();
    for segment in segments {
        let continues = chains.last().and_then(|c| c.last()).is_some_and(|prev| {
            let ((ex, ey), (sx, sy)) = (prev.end(), segment.start());
            (ex - sx).abs() <= CHAIN_TOLERANCE && (ey - sy).abs() <= CHAIN_TOLERANCE
        });
        match chains.last_mut() {
            Some(chain) if continues => chain.push(*segment),
            _ => chains.push(vec![*segment]),
        }
    }
    chains
}

/// Writer for one macro block.
struct MacroWriter<'a> {
    out: &'a mut String,
}

impl<'a> MacroWriter<'a> {
    fn open(out: &'a mut String, kind: MacroKind) -> Self {
        out.push_str("BEGIN MACRO\n");
        out.push_str(&format!("\tNAME={}\n", kind.name()));
        Self { out }
    }

    fn number(self, key: &str, value: f64) -> Self {
        self.out
            .push_str(&format!("\tPARAM,NAME={},VALUE={}\n", key, format_number(value)));
        self
    }

    fn text(self, key: &str, value: &str) -> Self {
        self.out
            .push_str(&format!("\tPARAM,NAME={},VALUE=\"{}\"\n", key, value.replace('"', "'")));
        self
    }

    fn close(self) {
        self.out.push_str("END MACRO\n\n");
    }
}

/// Sheet program generator.
#[derive(Debug, Clone, PartialEq)]
pub struct CixEmitter {
    pub sheet_width: f64,
    pub sheet_height: f64,
    pub thickness: f64,
    /// Contour router when the template declares none
    pub default_tool: String,
}

impl CixEmitter {
    pub fn new(sheet_width: f64, sheet_height: f64, thickness: f64) -> Self {
        Self {
            sheet_width,
            sheet_height,
            thickness,
            default_tool: DEFAULT_ROUTING_TOOL.to_string(),
        }
    }

    pub fn with_default_tool(mut self, tool: impl Into<String>) -> Self {
        self.default_tool = tool.into();
        self
    }

    /// Generate the program for one sheet.
    pub fn emit(&self, parts: &[PlacedPart], tooling: &ToolingLookup) -> String {
        let mut out = String::new();
        self.write_header(&mut out);

        let mut used_ids = HashSet::new();
        for (index, part) in parts.iter().enumerate() {
            let mut geo_id = format!("P{}_{}", index + 1, sanitize_id(&part.source_label));
            while !used_ids.insert(geo_id.clone()) {
                geo_id.push('_');
            }
            self.write_part(&mut out, part, &geo_id, tooling.resolve(&part.source_label));
        }
        out
    }

    fn write_header(&self, out: &mut String) {
        out.push_str("BEGIN ID CID3\n\tREL=5.0\nEND ID\n\n");
        out.push_str("BEGIN MAINDATA\n");
        out.push_str(&format!("\tLPX={}\n", format_number(self.sheet_width)));
        out.push_str(&format!("\tLPY={}\n", format_number(self.sheet_height)));
        out.push_str(&format!("\tLPZ={}\n", format_number(self.thickness)));
        out.push_str("\tORLST=\"1\"\n\tSIMMETRY=1\n\tTLCHK=0\n\tTOOLING=\"\"\n");
        out.push_str("END MAINDATA\n\n");
    }

    fn routing_tool(&self, template: Option<&ToolingTemplate>) -> String {
        template
            .and_then(|t| t.routing.tool.clone())
            .filter(|tool| !tool.trim().is_empty())
            .unwrap_or_else(|| self.default_tool.clone())
    }

    fn write_part(&self, out: &mut String, part: &PlacedPart, geo_id: &str, template: Option<&ToolingTemplate>) {
        let tool = self.routing_tool(template);

        // Contour: top-left, clockwise, closed by ENDPATH.
        let (x1, y1, x2, y2) = (part.x, part.y, part.x + part.w, part.y + part.h);
        let contour = [(x1, y2), (x2, y2), (x2, y1), (x1, y1), (x1, y2)];
        write_polyline(out, geo_id, &contour);
        write_route(out, geo_id, &tool, self.thickness);

        if let Some(template) = template.filter(|t| !t.is_empty()) {
            self.write_template(out, part, geo_id, template, &tool);
        }

        out.push_str(&format!(
            "; PART {} {}x{}\n\n",
            part.source_label,
            format_number(part.w),
            format_number(part.h)
        ));
    }

    fn write_template(
        &self,
        out: &mut String,
        part: &PlacedPart,
        geo_id: &str,
        template: &ToolingTemplate,
        tool: &str,
    ) {
        let frame = PartFrame::new(part, template);

        for boring in &template.borings {
            let (x, y) = frame.map_point(boring.x, boring.y);
            MacroWriter::open(out, MacroKind::Bg)
                .number("X", x)
                .number("Y", y)
                .number("DP", boring.depth)
                .text("TNM", &boring.tool)
                .number("SIDE", f64::from(boring.side))
                .close();
        }

        for (k, chain) in chain_segments(&template.toolpath_segments).iter().enumerate() {
            let mut points = Vec::with_capacity(chain.len() + 1);
            let (sx, sy) = chain[0].start();
            points.push(frame.map_point(sx, sy));
            points.extend(chain.iter().map(|s| {
                let (ex, ey) = s.end();
                frame.map_point(ex, ey)
            }));
            let id = format!("{}_T{}", geo_id, k + 1);
            write_polyline(out, &id, &points);
            write_route(out, &id, tool, self.thickness);
        }

        let circles = template.operations.iter().filter_map(|op| match op {
            MachiningOperation::CircularRoute {
                xc,
                yc,
                radius,
                depth,
                tool,
                ..
            } => Some((*xc, *yc, *radius, *depth, tool.as_str())),
            _ => None,
        });
        for (k, (xc, yc, radius, depth, circle_tool)) in circles.enumerate() {
            let id = format!("{}_C{}", geo_id, k + 1);
            let (cx, cy) = frame.map_point(xc, yc);
            MacroWriter::open(out, MacroKind::Geo).text("ID", &id).number("SIDE", 0.0).close();
            MacroWriter::open(out, MacroKind::CircleCr)
                .number("XC", cx)
                .number("YC", cy)
                .number("R", frame.map_radius(radius))
                .close();
            MacroWriter::open(out, MacroKind::EndPath).close();
            let circle_tool = if circle_tool.is_empty() { tool } else { circle_tool };
            MacroWriter::open(out, MacroKind::Routg)
                .text("GID", &id)
                .number("DP", depth)
                .text("TNM", circle_tool)
                .close();
        }
    }
}

fn write_polyline(out: &mut String, geo_id: &str, points: &[(f64, f64)]) {
    MacroWriter::open(out, MacroKind::Geo)
        .text("ID", geo_id)
        .number("SIDE", 0.0)
        .close();
    if let Some((&(x, y), rest)) = points.split_first() {
        MacroWriter::open(out, MacroKind::StartPoint).number("X", x).number("Y", y).close();
        for &(x, y) in rest {
            MacroWriter::open(out, MacroKind::LineEp).number("XE", x).number("YE", y).close();
        }
    }
    MacroWriter::open(out, MacroKind::EndPath).close();
}

fn write_route(out: &mut String, geo_id: &str, tool: &str, depth: f64) {
    MacroWriter::open(out, MacroKind::Rout)
        .text("GID", geo_id)
        .number("DP", depth)
        .text("TNM", tool)
        .close();
}

/// Generate a sheet program with the default contour router.
pub fn emit_program(
    sheet_width: f64,
    sheet_height: f64,
    thickness: f64,
    parts: &[PlacedPart],
    tooling: &ToolingLookup,
) -> String {
    CixEmitter::new(sheet_width, sheet_height, thickness).emit(parts, tooling)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cix::parse_program;
    use panelnest_core::{Boring, CoordMode};

    fn part(label: &str, x: f64, y: f64, w: f64, h: f64) -> PlacedPart {
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
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("Door(G)"), "DOOR_G");
        assert_eq!(sanitize_id("Bed Sides"), "BED_SIDES");
        assert_eq!(sanitize_id("  ()  "), "PART");
    }

    #[test]
    fn test_chain_segments() {
        let segments = [
            Segment::new(0.0, 0.0, 10.0, 0.0),
            Segment::new(10.0, 0.0, 10.0, 10.0),
            Segment::new(50.0, 50.0, 60.0, 50.0),
        ];
        let chains = chain_segments(&segments);
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[0].len(), 2);
    }

    #[test]
    fn test_contour_runs_clockwise_from_top_left() {
        let program = emit_program(2440.0, 1220.0, 18.0, &[part("Side", 10.0, 10.0, 560.0, 720.0)], &ToolingLookup::new());
        let preview = parse_program(&program).unwrap();
        assert_eq!(
            preview.toolpath_segments,
            vec![
                Segment::new(10.0, 730.0, 570.0, 730.0),
                Segment::new(570.0, 730.0, 570.0, 10.0),
                Segment::new(570.0, 10.0, 10.0, 10.0),
                Segment::new(10.0, 10.0, 10.0, 730.0),
            ]
        );
        assert!(program.contains("; PART Side 560x720"));
        assert!(program.contains("VALUE=\"E001\""));
    }

    #[test]
    fn test_program_layout() {
        let program = emit_program(2440.0, 1220.0, 18.5, &[part("Side", 10.0, 10.0, 560.0, 720.0)], &ToolingLookup::new());
        assert!(program.starts_with("BEGIN ID CID3\n\tREL=5.0\nEND ID\n\nBEGIN MAINDATA\n\tLPX=2440\n\tLPY=1220\n\tLPZ=18.5\n"));
        assert!(program.contains("BEGIN MACRO\n\tNAME=GEO\n\tPARAM,NAME=ID,VALUE=\"P1_SIDE\"\n\tPARAM,NAME=SIDE,VALUE=0\nEND MACRO\n\n"));
        assert!(program.ends_with("; PART Side 560x720\n\n"));
    }

    #[test]
    fn test_empty_template_adds_nothing() {
        let parts = [part("Side", 10.0, 10.0, 560.0, 720.0)];
        let empty = ToolingLookup::new().with_template("Side", ToolingTemplate::default());
        assert_eq!(
            emit_program(2440.0, 1220.0, 18.0, &parts, &empty),
            emit_program(2440.0, 1220.0, 18.0, &parts, &ToolingLookup::new())
        );
    }

    #[test]
    fn test_duplicate_labels_get_unique_ids() {
        let parts = [part("A", 10.0, 10.0, 50.0, 50.0), part("A", 100.0, 10.0, 50.0, 50.0)];
        let program = emit_program(1000.0, 500.0, 18.0, &parts, &ToolingLookup::new());
        assert!(program.contains("VALUE=\"P1_A\""));
        assert!(program.contains("VALUE=\"P2_A\""));
    }

    #[test]
    fn test_template_operations_are_remapped() {
        let template = ToolingTemplate {
            coord_mode: CoordMode::Absolute,
            panel_width: 400.0,
            panel_length: 700.0,
            borings: vec![Boring {
                x: 32.0,
                y: 37.0,
                depth: 12.0,
                tool: "D5".to_string(),
                side: 0,
            }],
            toolpath_segments: vec![Segment::new(100.0, 100.0, 300.0, 100.0)],
            operations: vec![MachiningOperation::CircularRoute {
                gid: "C1".to_string(),
                xc: 200.0,
                yc: 350.0,
                radius: 35.0,
                depth: 13.0,
                tool: String::new(),
            }],
            ..ToolingTemplate::default()
        };
        let lookup = ToolingLookup::new().with_template("Door", template);
        let parts = [part("Door(G)", 100.0, 50.0, 700.0, 400.0)];
        let preview = parse_program(&emit_program(2440.0, 1220.0, 18.0, &parts, &lookup)).unwrap();

        assert_eq!(preview.borings.len(), 1);
        assert_eq!((preview.borings[0].x, preview.borings[0].y), (763.0, 82.0));
        assert_eq!(preview.toolpath_segments.len(), 5);
        assert_eq!(preview.toolpath_segments[4], Segment::new(700.0, 150.0, 700.0, 350.0));

        let circle = preview
            .operations
            .iter()
            .find_map(|op| match op {
                MachiningOperation::CircularRoute { xc, yc, radius, tool, .. } => {
                    Some((*xc, *yc, *radius, tool.clone()))
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(circle, (100.0 + 350.0, 50.0 + 200.0, 35.0, "E001".to_string()));

        let routes = preview
            .operations
            .iter()
            .filter(|op| matches!(op, MachiningOperation::RouteGeometry { .. }))
            .count();
        assert_eq!(routes, 2);
    }
}
