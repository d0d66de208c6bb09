//! Panel demand rows and boundary normalization
//!
//! Panels arrive from spreadsheets, pasted text and saved files as loosely
//! typed maps. They are coerced into [`PanelDemand`] once, here, and never
//! re-validated inside the algorithms.

use crate::machining::ToolingTemplate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Suffix appended to the packing label of grain-locked panels.
pub const GRAIN_SUFFIX: &str = "(G)";

const TRUTHY_VALUES: &[&str] = &["1", "true", "t", "yes", "y", "on"];

/// One row of the cut list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelDemand {
    pub label: String,
    /// Finished width (X when placed in declared orientation)
    pub width: f64,
    /// Finished length (Y when placed in declared orientation)
    pub length: f64,
    pub quantity: u32,
    /// Grain must keep running along the declared length
    pub grain_locked: bool,
    pub material: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooling: Option<ToolingTemplate>,
}

impl PanelDemand {
    pub fn new(label: impl Into<String>, width: f64, length: f64, quantity: u32) -> Self {
        Self {
            label: label.into(),
            width,
            length,
            quantity: quantity.max(1),
            grain_locked: false,
            material: "Manual".to_string(),
            tooling: None,
        }
    }

    pub fn with_grain_locked(mut self, grain_locked: bool) -> Self {
        self.grain_locked = grain_locked;
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = material.into();
        self
    }

    pub fn with_tooling(mut self, tooling: ToolingTemplate) -> Self {
        self.tooling = Some(tooling);
        self
    }

    /// Label carried by every placed copy of this panel.
    ///
    /// Grain-locked panels are tagged with `(G)` so operators can tell them
    /// apart on the sheet.
    pub fn packing_label(&self) -> String {
        if self.grain_locked {
            format!("{}{}", self.label, GRAIN_SUFFIX)
        } else {
            self.label.clone()
        }
    }
}

/// Total number of pieces demanded by a cut list.
pub fn total_quantity(panels: &[PanelDemand]) -> usize {
    panels.iter().map(|p| p.quantity as usize).sum()
}

/// Coerce a mixed UI/import value to a boolean.
///
/// Strings are matched case-insensitively against the usual yes/no spellings
/// so that `"False"` never turns into `true`.
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        // Falsy and unrecognized spellings both end up false.
        Value::String(s) => TRUTHY_VALUES.contains(&s.trim().to_lowercase().as_str()),
        _ => false,
    }
}

fn coerce_f64(value: Option<&Value>, default: f64) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(f64::from(u8::from(*b))),
        _ => None,
    };
    // "inf" and "nan" parse as floats but are never a panel size.
    parsed.filter(|v| v.is_finite()).unwrap_or(default)
}

fn coerce_quantity(value: Option<&Value>) -> u32 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(f64::from(u8::from(*b))),
        _ => None,
    };
    match raw {
        Some(v) if v.is_finite() => (v.trunc().max(1.0)).min(u32::MAX as f64) as u32,
        _ => 1,
    }
}

fn coerce_string(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => default.to_string(),
        Some(other) => other.to_string(),
    }
}

/// First present key among the accepted spellings.
fn field<'a>(row: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| row.get(*k))
}

/// Normalize loosely typed panel rows into typed demand rows.
///
/// Both the spreadsheet column names (`Label`, `Width`, `Length`, `Qty`,
/// `Grain?`, `Material`, `Tooling`) and snake_case keys are accepted.
/// Non-object rows are skipped.
pub fn normalize_panels(rows: &[Value]) -> Vec<PanelDemand> {
    rows.iter()
        .filter(|row| row.is_object())
        .map(|row| {
            let label = coerce_string(field(row, &["Label", "label"]), "Part");
            let tooling = match field(row, &["Tooling", "tooling"]) {
                None | Some(Value::Null) => None,
                Some(raw) => match serde_json::from_value::<ToolingTemplate>(raw.clone()) {
                    Ok(template) => Some(template),
                    Err(e) => {
                        tracing::warn!("Discarding tooling for panel '{}': {}", label, e);
                        None
                    }
                },
            };

            PanelDemand {
                width: coerce_f64(field(row, &["Width", "width"]), 0.0),
                length: coerce_f64(field(row, &["Length", "length"]), 0.0),
                quantity: coerce_quantity(field(row, &["Qty", "quantity", "qty"])),
                grain_locked: field(row, &["Grain?", "grain_locked", "grain"])
                    .is_some_and(coerce_bool),
                material: coerce_string(field(row, &["Material", "material"]), "Manual"),
                tooling,
                label,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_bool_handles_string_false_correctly() {
        assert!(!coerce_bool(&json!("False")));
        assert!(!coerce_bool(&json!("0")));
        assert!(!coerce_bool(&json!("no")));
        assert!(!coerce_bool(&json!("maybe")));
    }

    #[test]
    fn test_coerce_bool_handles_string_true_correctly() {
        assert!(coerce_bool(&json!("True")));
        assert!(coerce_bool(&json!(" 1 ")));
        assert!(coerce_bool(&json!("yes")));
        assert!(coerce_bool(&json!(2)));
    }

    #[test]
    fn test_normalize_panels_converts_grain_flags_safely() {
        let rows = vec![
            json!({"Label": "A", "Grain?": "False"}),
            json!({"Label": "B", "Grain?": "True"}),
            json!({"Label": "C", "Grain?": 0}),
            json!({"Label": "D", "Grain?": 1}),
            json!({"Label": "E", "Grain?": null}),
        ];
        let flags: Vec<bool> = normalize_panels(&rows).iter().map(|p| p.grain_locked).collect();
        assert_eq!(flags, vec![false, true, false, true, false]);
    }

    #[test]
    fn test_normalize_panels_applies_defaults() {
        let rows = vec![json!({"Width": "600", "Length": 400.5, "Qty": "abc"}), json!("junk")];
        let panels = normalize_panels(&rows);
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].label, "Part");
        assert_eq!(panels[0].width, 600.0);
        assert_eq!(panels[0].length, 400.5);
        assert_eq!(panels[0].quantity, 1);
        assert_eq!(panels[0].material, "Manual");
        assert!(panels[0].tooling.is_none());
    }

    #[test]
    fn test_normalize_panels_clamps_and_truncates_quantity() {
        let rows = vec![json!({"Qty": 0}), json!({"quantity": 3.9})];
        let panels = normalize_panels(&rows);
        assert_eq!(panels[0].quantity, 1);
        assert_eq!(panels[1].quantity, 3);
    }

    #[test]
    fn test_packing_label_marks_grain() {
        let door = PanelDemand::new("Door", 400.0, 700.0, 2).with_grain_locked(true);
        assert_eq!(door.packing_label(), "Door(G)");
        assert_eq!(PanelDemand::new("Shelf", 1.0, 1.0, 1).packing_label(), "Shelf");
    }
}
