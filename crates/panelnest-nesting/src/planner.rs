//! Nesting planner
//!
//! Expands a cut list into kerf-inflated rectangles and runs a best-of search
//! over orientation strategies and packing heuristics. The winning packing
//! places the most pieces and, among those, uses the fewest sheets.
//!
//! A packing that cannot place every piece is still returned: callers detect
//! infeasibility by comparing [`PlanSummary::packed`] with
//! [`PlanSummary::demanded`].

use crate::packer::{pack, Heuristic, PackItem, Packing};
use panelnest_core::{total_quantity, Layout, MachineType, PanelDemand, PlacedPart, Sheet, SheetParams};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Minimum number of stock sheets offered to every packing attempt.
pub const MIN_SHEET_POOL: usize = 300;

/// Extra sheets offered on top of the piece count.
const SHEET_POOL_HEADROOM: usize = 50;

/// How non-grain-locked pieces are oriented before packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrientationStrategy {
    /// Declared orientation, no rotation by the packer
    KeepDeclared,
    /// Width and length swapped, no rotation by the packer
    FlipFlexible,
    /// Packer may rotate any piece; only legal without grain locks
    FreeRotation,
}

impl OrientationStrategy {
    /// Strategies legal for a cut list.
    pub fn applicable(panels: &[PanelDemand]) -> Vec<OrientationStrategy> {
        let mut strategies = vec![Self::KeepDeclared, Self::FlipFlexible];
        if panels.iter().all(|p| !p.grain_locked) {
            strategies.push(Self::FreeRotation);
        }
        strategies
    }
}

impl std::fmt::Display for OrientationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeepDeclared => write!(f, "keep-declared"),
            Self::FlipFlexible => write!(f, "flip-flexible"),
            Self::FreeRotation => write!(f, "free-rotation"),
        }
    }
}

/// Demanded versus packed piece counts of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub demanded: usize,
    pub packed: usize,
    pub sheets: usize,
}

impl PlanSummary {
    pub fn of(panels: &[PanelDemand], layout: &Layout) -> Self {
        Self {
            demanded: total_quantity(panels),
            packed: layout.part_count(),
            sheets: layout.sheets.len(),
        }
    }

    /// Pieces that could not be placed on any sheet.
    pub fn deficit(&self) -> usize {
        self.demanded.saturating_sub(self.packed)
    }

    pub fn is_complete(&self) -> bool {
        self.deficit() == 0
    }
}

/// One physical piece to cut.
#[derive(Debug, Clone)]
struct Piece {
    label: String,
    /// Declared width and length, before kerf
    size: (f64, f64),
    /// Kerf-inflated footprint as handed to the packer
    item: PackItem,
    /// Footprint was swapped before packing
    flipped: bool,
}

fn expand_pieces(panels: &[PanelDemand], kerf: f64, strategy: OrientationStrategy) -> Vec<Piece> {
    let mut pieces = Vec::with_capacity(total_quantity(panels));
    for panel in panels {
        let label = panel.packing_label();
        let (w, h) = (panel.width + kerf, panel.length + kerf);
        let flipped = strategy == OrientationStrategy::FlipFlexible && !panel.grain_locked;
        let item = if flipped {
            PackItem { width: h, height: w }
        } else {
            PackItem { width: w, height: h }
        };
        for _ in 0..panel.quantity {
            pieces.push(Piece {
                label: label.clone(),
                size: (panel.width, panel.length),
                item,
                flipped,
            });
        }
    }
    pieces
}

/// Candidate sheets offered to one packing attempt.
pub fn sheet_pool_size(piece_count: usize) -> usize {
    MIN_SHEET_POOL.max(piece_count + SHEET_POOL_HEADROOM)
}

/// Plan sheets for a router (free-form rectangle nesting).
pub fn plan(panels: &[PanelDemand], sheet_w: f64, sheet_h: f64, margin: f64, kerf: f64) -> Option<Layout> {
    plan_with(panels, SheetParams::new(sheet_w, sheet_h, margin, kerf), &Heuristic::MAX_RECTS)
}

/// Plan sheets for a beam saw: every layout is reachable by guillotine cuts.
pub fn plan_beam_saw(
    panels: &[PanelDemand],
    sheet_w: f64,
    sheet_h: f64,
    margin: f64,
    kerf: f64,
) -> Option<Layout> {
    plan_with(panels, SheetParams::new(sheet_w, sheet_h, margin, kerf), &Heuristic::GUILLOTINE)
}

/// Plan sheets with the heuristics suited to `machine`.
pub fn plan_for(machine: MachineType, panels: &[PanelDemand], params: SheetParams) -> Option<Layout> {
    match machine {
        MachineType::FlatBed => plan_with(panels, params, &Heuristic::MAX_RECTS),
        MachineType::BeamSaw => plan_with(panels, params, &Heuristic::GUILLOTINE),
    }
}

/// Best-of search over every applicable strategy and the given heuristics.
///
/// Returns `None` when there is nothing to plan: an empty cut list or a
/// sheet whose margin leaves no usable area.
pub fn plan_with(panels: &[PanelDemand], params: SheetParams, heuristics: &[Heuristic]) -> Option<Layout> {
    let usable = params.usable_rect();
    if panels.is_empty() || usable.w <= 0.0 || usable.h <= 0.0 || heuristics.is_empty() {
        return None;
    }

    let demanded = total_quantity(panels);
    let pool = sheet_pool_size(demanded);

    let mut best: Option<(OrientationStrategy, Heuristic, Vec<Piece>, Packing)> = None;
    for strategy in OrientationStrategy::applicable(panels) {
        let pieces = expand_pieces(panels, params.kerf, strategy);
        let items: Vec<PackItem> = pieces.iter().map(|p| p.item).collect();
        let allow_rotation = strategy == OrientationStrategy::FreeRotation;

        for &heuristic in heuristics {
            let packing = pack(&items, usable.w, usable.h, heuristic, allow_rotation, pool);
            debug!(
                "Strategy {} / {}: packed {}/{} on {} sheet(s)",
                strategy,
                heuristic,
                packing.packed_count(),
                demanded,
                packing.bin_count()
            );
            if best.as_ref().is_none_or(|(_, _, _, b)| packing.beats(b)) {
                best = Some((strategy, heuristic, pieces.clone(), packing));
            }
        }
    }

    let (strategy, heuristic, pieces, packing) = best?;
    info!(
        "Nesting picked {} / {}: packed {}/{} on {} sheet(s)",
        strategy,
        heuristic,
        packing.packed_count(),
        demanded,
        packing.bin_count()
    );
    Some(build_layout(&packing, &pieces, params))
}

/// Turn a packing into a layout: strip kerf, offset by margin, number parts.
fn build_layout(packing: &Packing, pieces: &[Piece], params: SheetParams) -> Layout {
    let mut layout = Layout::new(params);
    for (sheet_index, bin) in packing.bins.iter().enumerate() {
        let parts = bin
            .iter()
            .enumerate()
            .map(|(i, placed)| {
                let piece = &pieces[placed.item];
                let rotated = piece.flipped != placed.rotated;
                // Declared sizes, not footprint minus kerf, so no rounding creeps in.
                let (w, h) = if rotated {
                    (piece.size.1, piece.size.0)
                } else {
                    piece.size
                };
                PlacedPart {
                    id: format!("S{}-P{}", sheet_index + 1, i + 1),
                    source_label: piece.label.clone(),
                    x: placed.rect.x + params.margin,
                    y: placed.rect.y + params.margin,
                    w,
                    h,
                    rotated,
                }
            })
            .collect();
        layout.sheets.push(Sheet { sheet_index, parts });
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategies_drop_free_rotation_with_grain() {
        let free = vec![PanelDemand::new("A", 100.0, 200.0, 1)];
        assert_eq!(OrientationStrategy::applicable(&free).len(), 3);

        let locked = vec![
            PanelDemand::new("A", 100.0, 200.0, 1),
            PanelDemand::new("B", 100.0, 200.0, 1).with_grain_locked(true),
        ];
        assert_eq!(
            OrientationStrategy::applicable(&locked),
            vec![OrientationStrategy::KeepDeclared, OrientationStrategy::FlipFlexible]
        );
    }

    #[test]
    fn test_expand_pieces_inflates_and_flips_only_flexible() {
        let panels = vec![
            PanelDemand::new("Shelf", 300.0, 500.0, 2),
            PanelDemand::new("Door", 400.0, 700.0, 1).with_grain_locked(true),
        ];
        let pieces = expand_pieces(&panels, 6.0, OrientationStrategy::FlipFlexible);
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0].item, PackItem { width: 506.0, height: 306.0 });
        assert!(pieces[0].flipped);
        assert_eq!(pieces[2].label, "Door(G)");
        assert_eq!(pieces[2].item, PackItem { width: 406.0, height: 706.0 });
        assert!(!pieces[2].flipped);
    }

    #[test]
    fn test_sheet_pool_size() {
        assert_eq!(sheet_pool_size(10), 300);
        assert_eq!(sheet_pool_size(400), 450);
    }

    #[test]
    fn test_layout_applies_margin_and_strips_kerf() {
        let panels = vec![PanelDemand::new("A", 200.0, 100.0, 1)];
        let layout = plan(&panels, 1000.0, 500.0, 10.0, 5.0).unwrap();
        let part = &layout.sheets[0].parts[0];
        assert_eq!(part.id, "S1-P1");
        assert_eq!((part.x, part.y), (10.0, 10.0));
        assert_eq!((part.w, part.h), (200.0, 100.0));
    }

    #[test]
    fn test_nothing_to_plan() {
        assert!(plan(&[], 1000.0, 500.0, 10.0, 5.0).is_none());
        let panels = vec![PanelDemand::new("A", 10.0, 10.0, 1)];
        assert!(plan(&panels, 100.0, 100.0, 50.0, 0.0).is_none());
    }

    #[test]
    fn test_deficit_reported_for_oversized_panel() {
        let panels = vec![
            PanelDemand::new("Huge", 5000.0, 5000.0, 1),
            PanelDemand::new("Small", 100.0, 100.0, 2),
        ];
        let layout = plan(&panels, 2440.0, 1220.0, 10.0, 6.0).unwrap();
        let summary = PlanSummary::of(&panels, &layout);
        assert_eq!(summary.demanded, 3);
        assert_eq!(summary.packed, 2);
        assert_eq!(summary.deficit(), 1);
        assert!(!summary.is_complete());
    }
}
