//! Offline rectangle bin packing
//!
//! Items are sorted by area (largest first) and placed one at a time into the
//! open bin that offers the best fitness; a new bin is opened from the pool
//! only when no open bin can take the item and the item fits an empty bin.
//! Items that fit nowhere are reported as unpacked rather than failing the run.
//!
//! Two bin families are provided:
//! - [`MaxRectsBin`]: maximal free rectangles, for flat-bed routers
//! - [`GuillotineBin`]: edge-to-edge free sections, for beam saws

mod guillotine;
mod maxrects;

pub use guillotine::GuillotineBin;
pub use maxrects::MaxRectsBin;

use panelnest_core::Rect;
use serde::{Deserialize, Serialize};

/// Slack allowed when testing whether an item fits a free rectangle.
pub(crate) const FIT_EPSILON: f64 = 1e-9;

/// Placement heuristic used inside a bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heuristic {
    /// MaxRects, lowest top edge then leftmost
    MaxRectsBottomLeft,
    /// MaxRects, smallest leftover on the short side
    MaxRectsBestShortSideFit,
    /// MaxRects, smallest leftover area
    MaxRectsBestAreaFit,
    /// Guillotine, smallest leftover on the short side
    GuillotineBestShortSideFit,
    /// Guillotine, smallest leftover on the long side
    GuillotineBestLongSideFit,
    /// Guillotine, smallest leftover area
    GuillotineBestAreaFit,
}

impl Heuristic {
    /// Heuristics evaluated for free-form (router) nesting.
    pub const MAX_RECTS: [Heuristic; 3] = [
        Heuristic::MaxRectsBottomLeft,
        Heuristic::MaxRectsBestShortSideFit,
        Heuristic::MaxRectsBestAreaFit,
    ];

    /// Heuristics evaluated for guillotine-only (beam saw) nesting.
    pub const GUILLOTINE: [Heuristic; 3] = [
        Heuristic::GuillotineBestShortSideFit,
        Heuristic::GuillotineBestLongSideFit,
        Heuristic::GuillotineBestAreaFit,
    ];

    /// Create an empty bin driven by this heuristic.
    pub fn new_bin(self, width: f64, height: f64, allow_rotation: bool) -> Box<dyn PackingBin> {
        match self {
            Heuristic::MaxRectsBottomLeft
            | Heuristic::MaxRectsBestShortSideFit
            | Heuristic::MaxRectsBestAreaFit => {
                Box::new(MaxRectsBin::new(width, height, allow_rotation, self))
            }
            Heuristic::GuillotineBestShortSideFit
            | Heuristic::GuillotineBestLongSideFit
            | Heuristic::GuillotineBestAreaFit => {
                Box::new(GuillotineBin::new(width, height, allow_rotation, self))
            }
        }
    }
}

impl std::fmt::Display for Heuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MaxRectsBottomLeft => write!(f, "maxrects-bl"),
            Self::MaxRectsBestShortSideFit => write!(f, "maxrects-bssf"),
            Self::MaxRectsBestAreaFit => write!(f, "maxrects-baf"),
            Self::GuillotineBestShortSideFit => write!(f, "guillotine-bssf"),
            Self::GuillotineBestLongSideFit => write!(f, "guillotine-blsf"),
            Self::GuillotineBestAreaFit => write!(f, "guillotine-baf"),
        }
    }
}

/// A position a bin can offer for an item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Where the item would go, already oriented
    pub rect: Rect,
    /// Whether the bin turned the item to make it fit
    pub rotated: bool,
    /// Score used to choose between open bins; lower is better
    pub fitness: f64,
    /// Bin-internal slot the candidate was derived from
    pub slot: usize,
}

/// An item as placed in a bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedItem {
    pub rect: Rect,
    /// Index of the item in the input slice
    pub item: usize,
    pub rotated: bool,
}

/// Free-space bookkeeping of one stock sheet.
pub trait PackingBin {
    /// Best position for a `width x height` item, if any.
    fn find_position(&self, width: f64, height: f64) -> Option<Candidate>;

    /// Commit a candidate previously returned by [`PackingBin::find_position`].
    fn place(&mut self, candidate: Candidate, item: usize);

    fn placed(&self) -> &[PlacedItem];
}

/// Item to pack, sized as it occupies the sheet (kerf included).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackItem {
    pub width: f64,
    pub height: f64,
}

/// Outcome of one packing attempt.
#[derive(Debug, Clone, Default)]
pub struct Packing {
    /// Placed items per opened bin, in opening order
    pub bins: Vec<Vec<PlacedItem>>,
    /// Indices of items that could not be placed
    pub unpacked: Vec<usize>,
}

impl Packing {
    pub fn packed_count(&self) -> usize {
        self.bins.iter().map(Vec::len).sum()
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    /// Ranking key: more packed items first, then fewer bins.
    pub fn beats(&self, other: &Packing) -> bool {
        let (a, b) = (self.packed_count(), other.packed_count());
        a > b || (a == b && self.bin_count() < other.bin_count())
    }
}

/// Pack `items` into at most `max_bins` bins of `bin_width x bin_height`.
pub fn pack(
    items: &[PackItem],
    bin_width: f64,
    bin_height: f64,
    heuristic: Heuristic,
    allow_rotation: bool,
    max_bins: usize,
) -> Packing {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        let area_a = items[a].width * items[a].height;
        let area_b = items[b].width * items[b].height;
        area_b.total_cmp(&area_a)
    });

    let mut bins: Vec<Box<dyn PackingBin>> = Vec::new();
    let mut unpacked = Vec::new();

    for index in order {
        let PackItem { width, height } = items[index];
        if !(width > 0.0 && height > 0.0) {
            unpacked.push(index);
            continue;
        }

        let mut best: Option<(usize, Candidate)> = None;
        for (bin_index, bin) in bins.iter().enumerate() {
            if let Some(candidate) = bin.find_position(width, height) {
                if best.is_none_or(|(_, b)| candidate.fitness < b.fitness) {
                    best = Some((bin_index, candidate));
                }
            }
        }

        if let Some((bin_index, candidate)) = best {
            bins[bin_index].place(candidate, index);
            continue;
        }

        if bins.len() >= max_bins {
            unpacked.push(index);
            continue;
        }

        let mut bin = heuristic.new_bin(bin_width, bin_height, allow_rotation);
        match bin.find_position(width, height) {
            Some(candidate) => {
                bin.place(candidate, index);
                bins.push(bin);
            }
            None => unpacked.push(index),
        }
    }

    Packing {
        bins: bins.iter().map(|b| b.placed().to_vec()).collect(),
        unpacked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(sizes: &[(f64, f64)]) -> Vec<PackItem> {
        sizes
            .iter()
            .map(|&(width, height)| PackItem { width, height })
            .collect()
    }

    #[test]
    fn test_pack_opens_second_bin_when_full() {
        let items = items(&[(60.0, 100.0), (60.0, 100.0)]);
        for heuristic in Heuristic::MAX_RECTS.into_iter().chain(Heuristic::GUILLOTINE) {
            let packing = pack(&items, 100.0, 100.0, heuristic, false, 10);
            assert_eq!(packing.packed_count(), 2, "{heuristic}");
            assert_eq!(packing.bin_count(), 2, "{heuristic}");
        }
    }

    #[test]
    fn test_pack_reports_oversized_items_without_opening_bins() {
        let items = items(&[(150.0, 10.0), (10.0, 10.0)]);
        let packing = pack(&items, 100.0, 100.0, Heuristic::MaxRectsBottomLeft, false, 10);
        assert_eq!(packing.unpacked, vec![0]);
        assert_eq!(packing.bin_count(), 1);
    }

    #[test]
    fn test_pack_rotation_rescues_item() {
        let items = items(&[(150.0, 10.0)]);
        let packing = pack(&items, 100.0, 200.0, Heuristic::MaxRectsBestAreaFit, true, 10);
        assert_eq!(packing.packed_count(), 1);
        assert!(packing.bins[0][0].rotated);
        assert_eq!(packing.bins[0][0].rect, Rect::new(0.0, 0.0, 10.0, 150.0));
    }

    #[test]
    fn test_pack_respects_bin_cap() {
        let items = items(&[(100.0, 100.0); 5]);
        let packing = pack(&items, 100.0, 100.0, Heuristic::GuillotineBestAreaFit, false, 3);
        assert_eq!(packing.packed_count(), 3);
        assert_eq!(packing.unpacked.len(), 2);
    }

    #[test]
    fn test_packing_ranking() {
        let full = Packing {
            bins: vec![vec![], vec![]],
            unpacked: vec![],
        };
        let mut one_bin = full.clone();
        one_bin.bins.pop();
        assert!(one_bin.beats(&full));
        assert!(!full.beats(&one_bin));
        assert!(!full.beats(&full));
    }
}
