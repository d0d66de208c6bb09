//! Sheet layout model
//!
//! A [`Layout`] is produced by the nesting planner and then edited by the
//! manual constraint engine. Edits never mutate a layout in place: they
//! validate a candidate rectangle against the current state and return a
//! modified deep copy, so a rejected edit leaves the caller's value untouched.

use crate::error::{PlacementError, PlacementResult};
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Machine the layout is planned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MachineType {
    /// CNC router on a flat bed; parts may be nested freely
    #[default]
    #[serde(alias = "Flat Bed")]
    FlatBed,
    /// Panel saw; every layout must be cuttable edge to edge
    #[serde(alias = "Beam Saw", alias = "Selco")]
    BeamSaw,
}

impl std::fmt::Display for MachineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FlatBed => write!(f, "Flat Bed"),
            Self::BeamSaw => write!(f, "Beam Saw"),
        }
    }
}

/// Stock sheet and cutting parameters, global for one planning run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SheetParams {
    pub sheet_width: f64,
    pub sheet_height: f64,
    /// Unused safety border around the sheet edge
    pub margin: f64,
    /// Blade/cutter width
    pub kerf: f64,
}

impl SheetParams {
    pub fn new(sheet_width: f64, sheet_height: f64, margin: f64, kerf: f64) -> Self {
        Self {
            sheet_width,
            sheet_height,
            margin,
            kerf,
        }
    }

    /// Margin-inset area available for parts.
    pub fn usable_rect(&self) -> Rect {
        Rect::new(
            self.margin,
            self.margin,
            (self.sheet_width - 2.0 * self.margin).max(0.0),
            (self.sheet_height - 2.0 * self.margin).max(0.0),
        )
    }
}

/// A panel placed on a sheet.
///
/// `(x, y)` is the cutting origin on the sheet (margin already applied) and
/// `(w, h)` the finished, kerf-free size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedPart {
    pub id: String,
    /// Label of the demand row this part was cut for
    pub source_label: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    /// Turned 90 degrees relative to the declared panel orientation
    #[serde(default)]
    pub rotated: bool,
}

impl PlacedPart {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub sheet_index: usize,
    pub parts: Vec<PlacedPart>,
}

impl Sheet {
    pub fn part(&self, part_id: &str) -> Option<&PlacedPart> {
        self.parts.iter().find(|p| p.id == part_id)
    }

    fn part_mut(&mut self, part_id: &str) -> Option<&mut PlacedPart> {
        self.parts.iter_mut().find(|p| p.id == part_id)
    }
}

/// Sheets with placed parts plus the parameters they were planned with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub sheet_width: f64,
    pub sheet_height: f64,
    pub margin: f64,
    pub kerf: f64,
    pub sheets: Vec<Sheet>,
}

impl Layout {
    /// Empty layout for the given stock parameters.
    pub fn new(params: SheetParams) -> Self {
        Self {
            sheet_width: params.sheet_width,
            sheet_height: params.sheet_height,
            margin: params.margin,
            kerf: params.kerf,
            sheets: Vec::new(),
        }
    }

    pub fn params(&self) -> SheetParams {
        SheetParams::new(self.sheet_width, self.sheet_height, self.margin, self.kerf)
    }

    /// Number of parts across all sheets.
    pub fn part_count(&self) -> usize {
        self.sheets.iter().map(|s| s.parts.len()).sum()
    }

    pub fn sheet(&self, sheet_index: usize) -> PlacementResult<&Sheet> {
        self.sheets
            .get(sheet_index)
            .ok_or(PlacementError::SheetNotFound(sheet_index))
    }

    pub fn find_part(&self, sheet_index: usize, part_id: &str) -> PlacementResult<&PlacedPart> {
        self.sheet(sheet_index)?
            .part(part_id)
            .ok_or_else(|| PlacementError::PartNotFound {
                part_id: part_id.to_string(),
            })
    }

    /// Check whether `rect` may stand in for part `part_id` on the sheet.
    ///
    /// The rectangle must stay inside the margin and keep a kerf gap from
    /// every other part on the same sheet.
    pub fn can_place(&self, sheet_index: usize, part_id: &str, rect: &Rect) -> PlacementResult<()> {
        let sheet = self.sheet(sheet_index)?;
        if !rect.within_margin(self.sheet_width, self.sheet_height, self.margin) {
            return Err(PlacementError::OutOfBounds);
        }
        for other in sheet.parts.iter().filter(|p| p.id != part_id) {
            if rect.is_too_close(&other.rect(), self.kerf) {
                return Err(PlacementError::KerfClearance {
                    label: other.source_label.clone(),
                });
            }
        }
        Ok(())
    }

    /// Validate `candidate` for one part and return a copy with only that part
    /// replaced by the result of `apply`.
    pub fn with_part_replaced<F>(
        &self,
        sheet_index: usize,
        part_id: &str,
        candidate: &Rect,
        apply: F,
    ) -> PlacementResult<Layout>
    where
        F: FnOnce(&mut PlacedPart),
    {
        self.find_part(sheet_index, part_id)?;
        self.can_place(sheet_index, part_id, candidate)?;

        let mut next = self.clone();
        if let Some(part) = next.sheets[sheet_index].part_mut(part_id) {
            apply(part);
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        let mut layout = Layout::new(SheetParams::new(1000.0, 500.0, 10.0, 7.0));
        layout.sheets.push(Sheet {
            sheet_index: 0,
            parts: vec![
                PlacedPart {
                    id: "A".to_string(),
                    source_label: "A".to_string(),
                    x: 20.0,
                    y: 20.0,
                    w: 100.0,
                    h: 50.0,
                    rotated: false,
                },
                PlacedPart {
                    id: "B".to_string(),
                    source_label: "B".to_string(),
                    x: 200.0,
                    y: 20.0,
                    w: 100.0,
                    h: 50.0,
                    rotated: false,
                },
            ],
        });
        layout
    }

    #[test]
    fn test_can_place_accepts_valid_gap() {
        let layout = layout();
        let rect = Rect::new(130.0, 20.0, 50.0, 50.0);
        assert!(layout.can_place(0, "A", &rect).is_ok());
    }

    #[test]
    fn test_can_place_ignores_the_moving_part_itself() {
        let layout = layout();
        let rect = Rect::new(25.0, 20.0, 100.0, 50.0);
        assert!(layout.can_place(0, "A", &rect).is_ok());
    }

    #[test]
    fn test_can_place_reports_offending_label() {
        let layout = layout();
        let rect = Rect::new(150.0, 20.0, 50.0, 50.0);
        assert_eq!(
            layout.can_place(0, "A", &rect),
            Err(PlacementError::KerfClearance {
                label: "B".to_string()
            })
        );
    }

    #[test]
    fn test_usable_rect() {
        let params = SheetParams::new(1000.0, 500.0, 10.0, 0.0);
        assert_eq!(params.usable_rect(), Rect::new(10.0, 10.0, 980.0, 480.0));
    }

    #[test]
    fn test_missing_sheet_and_part() {
        let layout = layout();
        assert_eq!(layout.find_part(3, "A"), Err(PlacementError::SheetNotFound(3)));
        assert!(matches!(
            layout.find_part(0, "Z"),
            Err(PlacementError::PartNotFound { .. })
        ));
        assert_eq!(layout.part_count(), 2);
    }
}
