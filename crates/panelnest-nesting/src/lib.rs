//! # PanelNest Nesting
//!
//! Layout planning and analysis for rectangular panels:
//!
//! - **Packer**: MaxRects and Guillotine bins with offline, area-sorted
//!   placement
//! - **Planner**: best-of search over orientation strategies and heuristics,
//!   for flat-bed routers and beam saws
//! - **Manual**: move/rotate/place edits validated against margin and kerf
//!   clearance, plus the position legality grid
//! - **Offcut**: free-rectangle decomposition, reusable offcuts and usage
//!   heatmaps

pub mod manual;
pub mod offcut;
pub mod packer;
pub mod planner;

pub use manual::{
    can_place_part_at, compute_position_grid, legal_bounds, move_part, move_part_to, rotate_part_90,
    GridCell, LegalBounds,
};
pub use offcut::{
    build_sheet_usage_heatmap, calculate_sheet_offcuts, free_rectangles, HeatmapCell, Offcut,
    OffcutReport, OffcutThresholds,
};
pub use packer::{pack, Heuristic, PackItem, Packing, PackingBin};
pub use planner::{plan, plan_beam_saw, plan_for, plan_with, OrientationStrategy, PlanSummary};
