//! Error handling for PanelNest core
//!
//! Manual layout edits are rejected with a [`PlacementError`]; its display
//! text is the operator-facing reason shown next to the sheet.

use thiserror::Error;

/// Reasons a manual move/rotate edit is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// The sheet index does not exist in the layout
    #[error("Sheet {0} not found")]
    SheetNotFound(usize),

    /// No part with the given id on the sheet
    #[error("Part not found")]
    PartNotFound {
        /// The id that was looked up.
        part_id: String,
    },

    /// Candidate leaves the sheet area minus the safety margin
    #[error("Out of sheet bounds (margin respected).")]
    OutOfBounds,

    /// Candidate comes closer than one kerf to another part
    #[error("Too close to {label} (kerf clearance violation).")]
    KerfClearance {
        /// Label of the part that would be violated.
        label: String,
    },
}

/// Result type alias for placement checks and edits.
pub type PlacementResult<T> = std::result::Result<T, PlacementError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_error_display() {
        assert_eq!(
            PlacementError::OutOfBounds.to_string(),
            "Out of sheet bounds (margin respected)."
        );
        assert_eq!(
            PlacementError::KerfClearance {
                label: "B".to_string()
            }
            .to_string(),
            "Too close to B (kerf clearance violation)."
        );
        assert_eq!(
            PlacementError::PartNotFound {
                part_id: "S1-P9".to_string()
            }
            .to_string(),
            "Part not found"
        );
    }
}
