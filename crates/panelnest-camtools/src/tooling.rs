//! Tooling template lookup and coordinate mapping
//!
//! Templates describe machining in the panel's own frame. Before emitting a
//! sheet program every template point is resolved against the placed part:
//! scaled to its actual size, turned 90 degrees clockwise when the part lies
//! rotated on the sheet, then offset by the part's origin.

use panelnest_core::{CoordMode, PanelDemand, PlacedPart, ToolingTemplate};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Size tolerance when comparing template and part dimensions.
const SIZE_TOLERANCE: f64 = 1e-3;

fn suffix_regex() -> &'static Regex {
    static SUFFIX_REGEX: OnceLock<Regex> = OnceLock::new();
    SUFFIX_REGEX.get_or_init(|| Regex::new(r"\s*\([^()]*\)\s*$").expect("invalid regex pattern"))
}

/// Label with one trailing parenthetical removed: `"Door(G)"` becomes `"Door"`.
pub fn strip_label_suffix(label: &str) -> &str {
    match suffix_regex().find(label) {
        Some(m) => &label[..m.start()],
        None => label,
    }
}

/// Templates available to a program, by label plus an optional shared one.
#[derive(Debug, Clone, Default)]
pub struct ToolingLookup {
    by_label: HashMap<String, ToolingTemplate>,
    shared: Option<ToolingTemplate>,
}

impl ToolingLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-label templates from the cut list; panels without tooling are skipped.
    pub fn from_panels(panels: &[PanelDemand]) -> Self {
        let mut lookup = Self::new();
        for panel in panels {
            if let Some(tooling) = &panel.tooling {
                lookup.by_label.insert(panel.label.clone(), tooling.clone());
            }
        }
        lookup
    }

    pub fn with_template(mut self, label: impl Into<String>, template: ToolingTemplate) -> Self {
        self.by_label.insert(label.into(), template);
        self
    }

    pub fn with_shared(mut self, template: Option<ToolingTemplate>) -> Self {
        self.shared = template;
        self
    }

    /// Exact label, then the label without its trailing `(...)`, then the
    /// shared template.
    pub fn resolve(&self, label: &str) -> Option<&ToolingTemplate> {
        self.by_label
            .get(label)
            .or_else(|| self.by_label.get(strip_label_suffix(label)))
            .or(self.shared.as_ref())
    }
}

/// Maps template coordinates onto one placed part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartFrame {
    origin_x: f64,
    origin_y: f64,
    /// Placed width, the pivot of the rotation remap
    placed_w: f64,
    scale_x: f64,
    scale_y: f64,
    rotated: bool,
}

fn same_size(a: f64, b: f64) -> bool {
    (a - b).abs() <= SIZE_TOLERANCE
}

impl PartFrame {
    pub fn new(part: &PlacedPart, template: &ToolingTemplate) -> Self {
        let (tw, tl) = (template.panel_width, template.panel_length);
        let declared = same_size(part.w, tw) && same_size(part.h, tl);
        let transposed = !declared && same_size(part.w, tl) && same_size(part.h, tw);
        let rotated = part.rotated || transposed;

        let (base_w, base_h) = if rotated { (part.h, part.w) } else { (part.w, part.h) };
        let (scale_x, scale_y) = match template.coord_mode {
            CoordMode::Normalized => (base_w, base_h),
            CoordMode::Absolute if tw > 0.0 && tl > 0.0 => (base_w / tw, base_h / tl),
            CoordMode::Absolute => (1.0, 1.0),
        };

        Self {
            origin_x: part.x,
            origin_y: part.y,
            placed_w: part.w,
            scale_x,
            scale_y,
            rotated,
        }
    }

    /// Template point to sheet coordinates.
    pub fn map_point(&self, tx: f64, ty: f64) -> (f64, f64) {
        let (lx, ly) = (tx * self.scale_x, ty * self.scale_y);
        let (px, py) = if self.rotated {
            (self.placed_w - ly, lx)
        } else {
            (lx, ly)
        };
        (self.origin_x + px, self.origin_y + py)
    }

    /// Radii follow the smaller of the two axis scales so circles stay inside
    /// the part.
    pub fn map_radius(&self, radius: f64) -> f64 {
        radius * self.scale_x.min(self.scale_y)
    }
}
