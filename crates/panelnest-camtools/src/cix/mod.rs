//! CIX macro programs
//!
//! A CIX program is line oriented: a `MAINDATA` header carries the panel
//! size, and every drawing or machining instruction is a
//! `BEGIN MACRO ... END MACRO` block with a `NAME=` line and
//! `PARAM,NAME=<key>,VALUE=<value>` lines.
//!
//! - [`parser`]: decodes a program into a [`CixPreview`](panelnest_core::CixPreview)
//! - [`emitter`]: writes a full sheet program from placed parts and their
//!   tooling templates
//! - [`expr`]: the arithmetic-only evaluator for parameter values

pub mod emitter;
pub mod expr;
pub mod parser;

pub use emitter::{emit_program, CixEmitter, DEFAULT_ROUTING_TOOL};
pub use parser::parse_program;

/// Macro names understood by the parser and written by the emitter.
///
/// Unknown names are not an error: they are skipped so that programs from
/// other post-processors still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroKind {
    /// Opens a named geometry group
    Geo,
    /// First point of a polyline
    StartPoint,
    /// Straight segment to an end point
    LineEp,
    /// Circle by center and radius
    CircleCr,
    /// Closes the current geometry group
    EndPath,
    /// Boring at an absolute point
    Bg,
    /// Boring at a geometry's anchor point
    BGeo,
    /// Routing along a geometry's contour
    Rout,
    /// Routing along a geometry's circle
    Routg,
}

impl MacroKind {
    const TABLE: [(&'static str, MacroKind); 9] = [
        ("GEO", MacroKind::Geo),
        ("START_POINT", MacroKind::StartPoint),
        ("LINE_EP", MacroKind::LineEp),
        ("CIRCLE_CR", MacroKind::CircleCr),
        ("ENDPATH", MacroKind::EndPath),
        ("BG", MacroKind::Bg),
        ("B_GEO", MacroKind::BGeo),
        ("ROUT", MacroKind::Rout),
        ("ROUTG", MacroKind::Routg),
    ];

    pub fn from_name(name: &str) -> Option<MacroKind> {
        let name = name.trim();
        Self::TABLE
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, kind)| kind)
    }

    pub fn name(self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("", |(n, _)| n)
    }
}

impl std::fmt::Display for MacroKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Format a coordinate the shortest way that reads back to the same value.
///
/// Values are rounded to four decimals first so that float noise from
/// coordinate transforms does not leak into programs.
pub(crate) fn format_number(value: f64) -> String {
    let rounded = panelnest_core::round_to(value, 4);
    if rounded == 0.0 {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}
