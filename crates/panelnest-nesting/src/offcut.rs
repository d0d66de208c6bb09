//! Offcut and sheet-usage analysis
//!
//! Read-only geometry over a finished sheet: the free space left after
//! cutting is decomposed into maximal rectangles, and a coarse occupancy grid
//! shows where material is used.

use panelnest_core::{prune_contained, round_to, Layout, Rect, Sheet};
use serde::{Deserialize, Serialize};

/// Containment tolerance when pruning free rectangles.
const PRUNE_TOLERANCE: f64 = 1e-6;

/// Smallest heatmap cell edge.
pub const MIN_CELL_SIZE: f64 = 10.0;

/// Minimum size of a free rectangle worth keeping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffcutThresholds {
    pub min_width: f64,
    pub min_height: f64,
    pub min_area: f64,
}

impl Default for OffcutThresholds {
    fn default() -> Self {
        Self {
            min_width: 120.0,
            min_height: 120.0,
            min_area: 25_000.0,
        }
    }
}

impl OffcutThresholds {
    pub fn accepts(&self, rect: &Rect) -> bool {
        rect.w >= self.min_width && rect.h >= self.min_height && rect.area() >= self.min_area
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offcut {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub area: f64,
}

/// Area accounting of one sheet. Areas are rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffcutReport {
    pub interior_area: f64,
    pub used_area: f64,
    pub waste_area: f64,
    pub utilization_pct: f64,
    /// Largest first
    pub reusable_offcuts: Vec<Offcut>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub x: f64,
    pub y: f64,
    pub x2: f64,
    pub y2: f64,
    pub cell_col: usize,
    pub cell_row: usize,
    pub used_area: f64,
    pub cell_area: f64,
    pub usage_ratio: f64,
    pub usage_pct: f64,
}

/// Usable area of the sheet and its parts clipped to it, ordered by `(y, x)`.
fn usable_area_and_parts(layout: &Layout, sheet: &Sheet) -> (Rect, Vec<Rect>) {
    let usable = layout.params().usable_rect();
    let mut parts: Vec<Rect> = sheet
        .parts
        .iter()
        .filter_map(|part| {
            let x = part.x.max(usable.x);
            let y = part.y.max(usable.y);
            let x2 = usable.right().min(part.x + part.w);
            let y2 = usable.top().min(part.y + part.h);
            (x2 > x && y2 > y).then(|| Rect::new(x, y, x2 - x, y2 - y))
        })
        .collect();
    parts.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
    (usable, parts)
}

/// Free rectangles left on the usable area after cutting `parts`.
pub fn free_rectangles(usable: Rect, parts: &[Rect]) -> Vec<Rect> {
    let mut free = vec![usable];
    for part in parts {
        let next = free.iter().flat_map(|r| r.subtract(part)).collect();
        free = prune_contained(next, PRUNE_TOLERANCE);
    }
    free
}

/// Area accounting and reusable offcuts of one sheet.
pub fn calculate_sheet_offcuts(layout: &Layout, sheet: &Sheet, thresholds: OffcutThresholds) -> OffcutReport {
    let (usable, parts) = usable_area_and_parts(layout, sheet);
    let interior_area = usable.area();
    let free = free_rectangles(usable, &parts);

    let used_area: f64 = parts.iter().map(Rect::area).sum();
    let waste_area: f64 = free.iter().map(Rect::area).sum();

    let mut reusable_offcuts: Vec<Offcut> = free
        .iter()
        .filter(|r| thresholds.accepts(r))
        .map(|r| Offcut {
            x: round_to(r.x, 2),
            y: round_to(r.y, 2),
            width: round_to(r.w, 2),
            height: round_to(r.h, 2),
            area: round_to(r.area(), 2),
        })
        .collect();
    reusable_offcuts.sort_by(|a, b| b.area.total_cmp(&a.area));

    let utilization_pct = if interior_area > 0.0 {
        round_to(used_area / interior_area * 100.0, 2)
    } else {
        0.0
    };

    OffcutReport {
        interior_area: round_to(interior_area, 2),
        used_area: round_to(used_area, 2),
        waste_area: round_to(waste_area, 2),
        utilization_pct,
        reusable_offcuts,
    }
}

/// Occupancy grid over the usable area; edge cells are clipped.
pub fn build_sheet_usage_heatmap(layout: &Layout, sheet: &Sheet, cell_size: f64) -> Vec<HeatmapCell> {
    let (usable, parts) = usable_area_and_parts(layout, sheet);
    if usable.w <= 0.0 || usable.h <= 0.0 {
        return Vec::new();
    }

    let size = if cell_size.is_finite() {
        cell_size.max(MIN_CELL_SIZE)
    } else {
        MIN_CELL_SIZE
    };

    let mut cells = Vec::new();
    let mut y = usable.y;
    let mut row = 0;
    while y < usable.top() - 1e-6 {
        let cell_h = size.min(usable.top() - y);
        let mut x = usable.x;
        let mut col = 0;
        while x < usable.right() - 1e-6 {
            let cell = Rect::new(x, y, size.min(usable.right() - x), cell_h);
            let cell_area = cell.area();
            let used_area: f64 = parts.iter().map(|p| cell.overlap_area(p)).sum();
            let usage_ratio = if cell_area > 0.0 { used_area / cell_area } else { 0.0 };
            cells.push(HeatmapCell {
                x: round_to(cell.x, 2),
                y: round_to(cell.y, 2),
                x2: round_to(cell.right(), 2),
                y2: round_to(cell.top(), 2),
                cell_col: col,
                cell_row: row,
                used_area: round_to(used_area, 2),
                cell_area: round_to(cell_area, 2),
                usage_ratio: round_to(usage_ratio, 4),
                usage_pct: round_to(usage_ratio * 100.0, 2),
            });
            x += size;
            col += 1;
        }
        y += size;
        row += 1;
    }
    cells
}
