//! Machining data contracts
//!
//! Types shared between panel demand rows (per-part tooling templates), the
//! CIX parser (decoded previews) and the CIX emitter (sheet programs).

use serde::{Deserialize, Serialize};

/// Straight toolpath segment
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Segment {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn start(&self) -> (f64, f64) {
        (self.x1, self.y1)
    }

    pub fn end(&self) -> (f64, f64) {
        (self.x2, self.y2)
    }
}

/// A drilling operation at a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boring {
    pub x: f64,
    pub y: f64,
    /// Drilling depth
    #[serde(default)]
    pub depth: f64,
    /// Tool name as understood by the machine (`TNM`)
    #[serde(default)]
    pub tool: String,
    /// Panel face the hole is drilled from
    #[serde(default)]
    pub side: i32,
}

/// Routing configuration of a tooling template
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoutingSpec {
    /// Router tool used for outer contours and template paths
    #[serde(default)]
    pub tool: Option<String>,
}

/// A machining operation decoded from a program.
///
/// Keeps enough detail to re-render the program or re-target it onto a
/// placed part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MachiningOperation {
    /// `BG`: drill at an absolute point
    DrillAtPoint {
        x: f64,
        y: f64,
        depth: f64,
        tool: String,
        side: i32,
    },
    /// `B_GEO`: drill at the anchor point of a named geometry
    DrillAtGeometry {
        gid: String,
        x: f64,
        y: f64,
        depth: f64,
        tool: String,
        side: i32,
    },
    /// `ROUTG`: route along a named circle
    CircularRoute {
        gid: String,
        xc: f64,
        yc: f64,
        radius: f64,
        depth: f64,
        tool: String,
    },
    /// `ROUT`: route along the contour of a named geometry
    RouteGeometry {
        gid: String,
        depth: f64,
        tool: String,
    },
}

/// Decoded form of one parsed machining program.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CixPreview {
    pub panel_width: f64,
    pub panel_length: f64,
    pub panel_thickness: f64,
    #[serde(default)]
    pub toolpath_segments: Vec<Segment>,
    #[serde(default)]
    pub borings: Vec<Boring>,
    #[serde(default)]
    pub operations: Vec<MachiningOperation>,
}

impl CixPreview {
    /// Reuse a parsed program as an absolute-coordinate tooling template.
    ///
    /// The first routing tool found in the program becomes the template's
    /// routing tool.
    pub fn to_template(&self) -> ToolingTemplate {
        let routing_tool = self.operations.iter().find_map(|op| match op {
            MachiningOperation::RouteGeometry { tool, .. }
            | MachiningOperation::CircularRoute { tool, .. }
                if !tool.is_empty() =>
            {
                Some(tool.clone())
            }
            _ => None,
        });

        let operations = self
            .operations
            .iter()
            .filter(|op| matches!(op, MachiningOperation::CircularRoute { .. }))
            .cloned()
            .collect();

        ToolingTemplate {
            coord_mode: CoordMode::Absolute,
            panel_width: self.panel_width,
            panel_length: self.panel_length,
            panel_thickness: self.panel_thickness,
            borings: self.borings.clone(),
            toolpath_segments: self.toolpath_segments.clone(),
            routing: RoutingSpec { tool: routing_tool },
            operations,
        }
    }
}

/// How template coordinates relate to the part they are applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordMode {
    /// Coordinates in template units, against the declared panel size
    #[default]
    Absolute,
    /// Coordinates as 0..1 fractions of the template's width/length
    Normalized,
}

/// Per-label or shared machining description applied to placed parts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolingTemplate {
    #[serde(default)]
    pub coord_mode: CoordMode,
    #[serde(default)]
    pub panel_width: f64,
    #[serde(default)]
    pub panel_length: f64,
    #[serde(default)]
    pub panel_thickness: f64,
    #[serde(default)]
    pub borings: Vec<Boring>,
    #[serde(default)]
    pub toolpath_segments: Vec<Segment>,
    #[serde(default)]
    pub routing: RoutingSpec,
    /// Circular routes carried over from a parsed program
    #[serde(default)]
    pub operations: Vec<MachiningOperation>,
}

impl ToolingTemplate {
    /// True when the template carries no operation to emit.
    pub fn is_empty(&self) -> bool {
        self.borings.is_empty() && self.toolpath_segments.is_empty() && self.operations.is_empty()
    }
}
