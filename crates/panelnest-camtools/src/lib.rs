//! # PanelNest CAM Tools
//!
//! File formats around a nesting layout:
//!
//! - **CIX**: parse SCM-style macro programs into a machining preview, and
//!   emit one program per sheet with each part's contour and template tooling
//! - **Tooling**: resolve a part's template by label and map template
//!   coordinates onto the placed, possibly rotated part
//! - **Drawing**: DXF sheet drawings on named layers
//! - **Storage**: DXF save files with an embedded lossless snapshot, and
//!   extension-dispatched loading
//! - **Export**: zip bundles of per-sheet DXF drawings or CIX programs

pub mod cix;
pub mod drawing;
pub mod error;
pub mod export;
pub mod storage;
pub mod tooling;

pub use cix::{emit_program, parse_program, CixEmitter, MacroKind, DEFAULT_ROUTING_TOOL};
pub use drawing::{decode_drawing, encode_with_snapshot, sheet_drawing, DecodedDrawing};
pub use error::{CamToolError, CamToolResult, FileFormatError, FileFormatResult};
pub use export::{create_cix_zip, create_dxf_zip};
pub use storage::{
    load_nest_file, load_nest_from_path, payload_to_dxf, save_nest_to_path, LoadedNest, NestPayload,
    PayloadSettings,
};
pub use tooling::{strip_label_suffix, PartFrame, ToolingLookup};
