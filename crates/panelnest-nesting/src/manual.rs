//! Manual constraint engine
//!
//! Operator edits on a planned layout. Every edit validates a candidate
//! rectangle against the sheet margin and the kerf gap to the other parts on
//! the same sheet, then returns an edited copy. The input layout is borrowed
//! immutably, so a rejected edit cannot have touched it.

use panelnest_core::{round_to, Layout, PlacedPart, PlacementResult, Rect};
use serde::{Deserialize, Serialize};

/// Cell budget of a legality grid; larger grids get a coarser step.
pub const MAX_GRID_CELLS: f64 = 12_000.0;

/// Shift a part by `(dx, dy)`.
pub fn move_part(layout: &Layout, sheet_index: usize, part_id: &str, dx: f64, dy: f64) -> PlacementResult<Layout> {
    let part = layout.find_part(sheet_index, part_id)?;
    let candidate = part.rect().translated(dx, dy);
    layout.with_part_replaced(sheet_index, part_id, &candidate, |p| {
        p.x = candidate.x;
        p.y = candidate.y;
    })
}

/// Turn a part 90 degrees about its origin and toggle its `rotated` flag.
pub fn rotate_part_90(layout: &Layout, sheet_index: usize, part_id: &str) -> PlacementResult<Layout> {
    let part = layout.find_part(sheet_index, part_id)?;
    let candidate = part.rect().transposed();
    layout.with_part_replaced(sheet_index, part_id, &candidate, |p| {
        std::mem::swap(&mut p.w, &mut p.h);
        p.rotated = !p.rotated;
    })
}

/// Range of origins that keep a part inside the sheet margin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegalBounds {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

pub fn legal_bounds(layout: &Layout, part: &PlacedPart) -> LegalBounds {
    LegalBounds {
        x_min: layout.margin,
        y_min: layout.margin,
        x_max: layout.sheet_width - layout.margin - part.w,
        y_max: layout.sheet_height - layout.margin - part.h,
    }
}

/// Check whether a part could sit with its origin at `(x, y)`.
pub fn can_place_part_at(layout: &Layout, sheet_index: usize, part_id: &str, x: f64, y: f64) -> PlacementResult<()> {
    let part = layout.find_part(sheet_index, part_id)?;
    layout.can_place(sheet_index, part_id, &Rect::new(x, y, part.w, part.h))
}

/// Move a part so that its origin lands on `(x, y)`.
pub fn move_part_to(layout: &Layout, sheet_index: usize, part_id: &str, x: f64, y: f64) -> PlacementResult<Layout> {
    let part = layout.find_part(sheet_index, part_id)?;
    let candidate = Rect::new(x, y, part.w, part.h);
    layout.with_part_replaced(sheet_index, part_id, &candidate, |p| {
        p.x = x;
        p.y = y;
    })
}

/// One sampled origin of a legality grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub x: f64,
    pub y: f64,
    pub x2: f64,
    pub y2: f64,
    pub is_legal: bool,
    /// `"Legal"` or the reason the origin is refused
    pub reason: String,
}

/// Sample every origin of a part's legal bounding box on a uniform grid.
///
/// The step is at least one unit and grows when the grid would exceed
/// [`MAX_GRID_CELLS`]. An unknown part yields an empty grid.
pub fn compute_position_grid(layout: &Layout, sheet_index: usize, part_id: &str, step: f64) -> Vec<GridCell> {
    let Ok(part) = layout.find_part(sheet_index, part_id) else {
        return Vec::new();
    };

    let bounds = legal_bounds(layout, part);
    let mut step = step.max(1.0);
    let width = (bounds.x_max - bounds.x_min).max(0.0);
    let height = (bounds.y_max - bounds.y_min).max(0.0);
    let estimated = (width / step + 1.0) * (height / step + 1.0);
    if estimated > MAX_GRID_CELLS {
        step *= (estimated / MAX_GRID_CELLS).sqrt();
    }

    let mut cells = Vec::new();
    let mut y = bounds.y_min;
    while y <= bounds.y_max + 1e-9 {
        let mut x = bounds.x_min;
        while x <= bounds.x_max + 1e-9 {
            let verdict = can_place_part_at(layout, sheet_index, part_id, x, y);
            cells.push(GridCell {
                x: round_to(x, 3),
                y: round_to(y, 3),
                x2: round_to(x + step, 3),
                y2: round_to(y + step, 3),
                is_legal: verdict.is_ok(),
                reason: match verdict {
                    Ok(()) => "Legal".to_string(),
                    Err(e) => e.to_string(),
                },
            });
            x += step;
        }
        y += step;
    }
    cells
}
