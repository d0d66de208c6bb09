//! CIX program parser
//!
//! Decoding runs in two passes. The scan pass splits the text into header
//! values and macro blocks and is the only place a program can be rejected
//! (empty text, unterminated blocks, missing panel size). The interpret pass
//! walks the macro blocks in order, tracking the current geometry group and
//! pen position, and is deliberately forgiving: unparseable numbers read as
//! `0.0` and references to unknown geometry drop the operation.

use super::expr;
use super::MacroKind;
use crate::error::{FileFormatError, FileFormatResult};
use panelnest_core::{Boring, CixPreview, MachiningOperation, Segment};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use tracing::debug;

/// A parameter value as written in the program.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Quoted values are text; bare arithmetic is evaluated; anything else is text.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(inner) = raw
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
        {
            return ParamValue::Text(inner.to_string());
        }
        match expr::evaluate(raw) {
            Some(n) => ParamValue::Number(n),
            None => ParamValue::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => Some(*n),
            ParamValue::Text(s) => expr::evaluate(s),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            ParamValue::Number(n) => super::format_number(*n),
            ParamValue::Text(s) => s.clone(),
        }
    }
}

/// One `BEGIN MACRO ... END MACRO` block.
#[derive(Debug, Clone, PartialEq)]
struct MacroBlock {
    name: String,
    line: usize,
    params: HashMap<String, ParamValue>,
}

impl MacroBlock {
    fn number(&self, key: &str) -> f64 {
        match self.params.get(key) {
            Some(value) => value.as_f64().unwrap_or_else(|| {
                debug!(
                    "{} at line {}: non-numeric {}={:?}, using 0.0",
                    self.name, self.line, key, value
                );
                0.0
            }),
            None => 0.0,
        }
    }

    fn text(&self, key: &str) -> String {
        self.params.get(key).map(ParamValue::as_text).unwrap_or_default()
    }

    fn point(&self, x: &str, y: &str) -> (f64, f64) {
        (self.number(x), self.number(y))
    }
}

/// Result of the scan pass.
#[derive(Debug, Default)]
struct ScannedProgram {
    /// Top-level `KEY=value` pairs, upper-cased keys, first occurrence wins
    header: HashMap<String, ParamValue>,
    macros: Vec<MacroBlock>,
}

fn param_regex() -> &'static Regex {
    static PARAM_REGEX: OnceLock<Regex> = OnceLock::new();
    PARAM_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^PARAM\s*,\s*NAME\s*=\s*([A-Za-z0-9_]+)\s*,\s*VALUE\s*=\s*(.*)$")
            .expect("invalid regex pattern")
    })
}

fn assignment_regex() -> &'static Regex {
    static ASSIGNMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    ASSIGNMENT_REGEX.get_or_init(|| {
        Regex::new(r#"([A-Za-z_][A-Za-z0-9_]*)\s*=\s*("[^"]*"|[^\s,;]+)"#)
            .expect("invalid regex pattern")
    })
}

/// Split a line into whitespace-separated words, upper-cased.
fn keywords(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_ascii_uppercase).collect()
}

fn scan(text: &str) -> FileFormatResult<ScannedProgram> {
    if text.trim().is_empty() {
        return Err(FileFormatError::EmptyFile("CIX program has no content".to_string()));
    }

    let mut program = ScannedProgram::default();
    let mut open: Option<MacroBlock> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        let words = keywords(line);
        let is_macro_marker = words.len() == 2 && words[1] == "MACRO";
        if is_macro_marker && words[0] == "BEGIN" {
            if let Some(block) = &open {
                return Err(FileFormatError::CixParseError(format!(
                    "BEGIN MACRO at line {} inside the block opened at line {}",
                    line_no, block.line
                )));
            }
            open = Some(MacroBlock {
                name: String::new(),
                line: line_no,
                params: HashMap::new(),
            });
            continue;
        }
        if is_macro_marker && words[0] == "END" {
            match open.take() {
                Some(block) => program.macros.push(block),
                None => debug!("Stray END MACRO at line {}", line_no),
            }
            continue;
        }

        if let Some(block) = open.as_mut() {
            if let Some(caps) = param_regex().captures(line) {
                block
                    .params
                    .insert(caps[1].to_ascii_uppercase(), ParamValue::parse(&caps[2]));
            } else if let Some((key, value)) = line.split_once('=') {
                if key.trim().eq_ignore_ascii_case("NAME") {
                    block.name = value.trim().trim_matches('"').to_ascii_uppercase();
                }
            }
            continue;
        }

        if matches!(words.first().map(String::as_str), Some("BEGIN" | "END")) {
            continue;
        }
        for caps in assignment_regex().captures_iter(line) {
            program
                .header
                .entry(caps[1].to_ascii_uppercase())
                .or_insert_with(|| ParamValue::parse(&caps[2]));
        }
    }

    if let Some(block) = open {
        return Err(FileFormatError::CixParseError(format!(
            "MACRO block opened at line {} is never closed",
            block.line
        )));
    }
    Ok(program)
}

impl ScannedProgram {
    /// First header value among `keys`, read leniently.
    fn dimension(&self, keys: &[&str]) -> Option<f64> {
        keys.iter()
            .find_map(|k| self.header.get(*k))
            .map(|v| v.as_f64().unwrap_or(0.0))
    }
}

/// Pen and geometry bookkeeping of the interpret pass.
#[derive(Default)]
struct Interpreter {
    current_geo: Option<String>,
    pen: Option<(f64, f64)>,
    known_geos: HashSet<String>,
    anchors: HashMap<String, (f64, f64)>,
    circles: HashMap<String, (f64, f64, f64)>,
}

impl Interpreter {
    fn apply(&mut self, kind: MacroKind, block: &MacroBlock, preview: &mut CixPreview) {
        match kind {
            MacroKind::Geo => {
                let id = block.text("ID");
                self.known_geos.insert(id.clone());
                self.current_geo = Some(id);
                self.pen = None;
            }
            MacroKind::StartPoint => {
                let point = block.point("X", "Y");
                if let Some(geo) = &self.current_geo {
                    self.anchors.entry(geo.clone()).or_insert(point);
                }
                self.pen = Some(point);
            }
            MacroKind::LineEp => {
                let end = block.point("XE", "YE");
                match self.pen {
                    Some((x, y)) => preview.toolpath_segments.push(Segment::new(x, y, end.0, end.1)),
                    None => debug!("LINE_EP at line {} has no start point", block.line),
                }
                self.pen = Some(end);
            }
            MacroKind::CircleCr => match &self.current_geo {
                Some(geo) => {
                    let (xc, yc) = block.point("XC", "YC");
                    self.circles.insert(geo.clone(), (xc, yc, block.number("R")));
                }
                None => debug!("CIRCLE_CR at line {} outside a GEO", block.line),
            },
            MacroKind::EndPath => {
                self.current_geo = None;
                self.pen = None;
            }
            MacroKind::Bg => {
                let (x, y) = block.point("X", "Y");
                push_boring(preview, x, y, block, None);
            }
            MacroKind::BGeo => {
                let gid = block.text("GID");
                match self.anchors.get(&gid) {
                    Some(&(x, y)) => push_boring(preview, x, y, block, Some(gid)),
                    None => debug!("B_GEO at line {}: unknown geometry '{}'", block.line, gid),
                }
            }
            MacroKind::Routg => {
                let gid = block.text("GID");
                match self.circles.get(&gid) {
                    Some(&(xc, yc, radius)) => preview.operations.push(MachiningOperation::CircularRoute {
                        gid,
                        xc,
                        yc,
                        radius,
                        depth: block.number("DP"),
                        tool: block.text("TNM"),
                    }),
                    None => debug!("ROUTG at line {}: unknown circle '{}'", block.line, gid),
                }
            }
            MacroKind::Rout => {
                let gid = block.text("GID");
                if self.known_geos.contains(&gid) {
                    preview.operations.push(MachiningOperation::RouteGeometry {
                        gid,
                        depth: block.number("DP"),
                        tool: block.text("TNM"),
                    });
                } else {
                    debug!("ROUT at line {}: unknown geometry '{}'", block.line, gid);
                }
            }
        }
    }
}

fn push_boring(preview: &mut CixPreview, x: f64, y: f64, block: &MacroBlock, gid: Option<String>) {
    let depth = block.number("DP");
    let tool = block.text("TNM");
    let side = block.number("SIDE").round() as i32;
    preview.borings.push(Boring {
        x,
        y,
        depth,
        tool: tool.clone(),
        side,
    });
    preview.operations.push(match gid {
        Some(gid) => MachiningOperation::DrillAtGeometry {
            gid,
            x,
            y,
            depth,
            tool,
            side,
        },
        None => MachiningOperation::DrillAtPoint {
            x,
            y,
            depth,
            tool,
            side,
        },
    });
}

/// Decode a CIX program.
///
/// Fails only when the text is empty, a macro block is left open, or the
/// panel width or length is missing (`LPX`/`LPY`, or `DX`/`DY`).
pub fn parse_program(text: &str) -> FileFormatResult<CixPreview> {
    let program = scan(text)?;

    let panel_width = program
        .dimension(&["LPX", "DX"])
        .ok_or_else(|| FileFormatError::MissingDimension("panel width (LPX/DX)".to_string()))?;
    let panel_length = program
        .dimension(&["LPY", "DY"])
        .ok_or_else(|| FileFormatError::MissingDimension("panel length (LPY/DY)".to_string()))?;
    let panel_thickness = program.dimension(&["LPZ", "DZ"]).unwrap_or(0.0);

    let mut preview = CixPreview {
        panel_width,
        panel_length,
        panel_thickness,
        ..CixPreview::default()
    };

    let mut interpreter = Interpreter::default();
    for block in &program.macros {
        match MacroKind::from_name(&block.name) {
            Some(kind) => interpreter.apply(kind, block, &mut preview),
            None => debug!("Skipping macro '{}' at line {}", block.name, block.line),
        }
    }

    debug!(
        "Parsed CIX program {}x{}x{}: {} segment(s), {} boring(s), {} operation(s)",
        panel_width,
        panel_length,
        panel_thickness,
        preview.toolpath_segments.len(),
        preview.borings.len(),
        preview.operations.len()
    );
    Ok(preview)
}
