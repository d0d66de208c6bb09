//! # PanelNest Core
//!
//! Core types and utilities shared by the PanelNest crates:
//!
//! - **Geometry**: axis-aligned rectangle tests (overlap, containment,
//!   kerf clearance, margin bounds, rectangle difference)
//! - **Panels**: typed cut-list rows and boundary normalization of loosely
//!   typed input
//! - **Layout**: sheets of placed parts with copy-on-write edit validation
//! - **Machining**: tooling templates, boring/routing operations and decoded
//!   CIX program previews

pub mod error;
pub mod geometry;
pub mod layout;
pub mod machining;
pub mod panel;

pub use error::{PlacementError, PlacementResult};
pub use geometry::{prune_contained, round_to, Rect};
pub use layout::{Layout, MachineType, PlacedPart, Sheet, SheetParams};
pub use machining::{
    Boring, CixPreview, CoordMode, MachiningOperation, RoutingSpec, Segment, ToolingTemplate,
};
pub use panel::{coerce_bool, normalize_panels, total_quantity, PanelDemand, GRAIN_SUFFIX};
