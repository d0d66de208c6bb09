//! Axis-aligned rectangle primitives
//!
//! Every other component reasons about panels, sheets and free space as
//! axis-aligned rectangles anchored at their minimum corner. The tests here
//! (overlap, containment, kerf clearance, margin bounds) are shared by the
//! packer, the manual constraint engine and the offcut analyzer.

use serde::{Deserialize, Serialize};

/// Tolerance used when deciding whether a residual rectangle is degenerate.
pub const DEGENERATE_EPSILON: f64 = 1e-6;

/// Slack forgiven by the kerf and margin checks. Planned positions are sums
/// of `w + kerf` and may land an ulp short of the exact gap.
pub const CLEARANCE_EPSILON: f64 = 1e-6;

/// An axis-aligned rectangle `(x, y, w, h)` with its origin at the minimum corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum X coordinate
    pub x: f64,
    /// Minimum Y coordinate
    pub y: f64,
    /// Extent along X
    pub w: f64,
    /// Extent along Y
    pub h: f64,
}

impl Rect {
    /// Create a rectangle from its origin and size
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Maximum X coordinate
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Maximum Y coordinate
    pub fn top(&self) -> f64 {
        self.y + self.h
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Same origin, width and height swapped.
    pub fn transposed(&self) -> Self {
        Self::new(self.x, self.y, self.h, self.w)
    }

    /// Same size, origin shifted by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Strict interior overlap; rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() <= other.x
            || other.right() <= self.x
            || self.top() <= other.y
            || other.top() <= self.y)
    }

    /// True when `other` lies entirely inside `self` (edges may coincide).
    pub fn contains(&self, other: &Rect) -> bool {
        self.contains_within(other, 0.0)
    }

    /// Containment test that forgives `tol` on every edge.
    pub fn contains_within(&self, other: &Rect, tol: f64) -> bool {
        other.x >= self.x - tol
            && other.y >= self.y - tol
            && other.right() <= self.right() + tol
            && other.top() <= self.top() + tol
    }

    /// Overlapping region, if the rectangles share any interior area.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.top().min(other.top());
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
    }

    pub fn overlap_area(&self, other: &Rect) -> f64 {
        self.intersection(other).map_or(0.0, |r| r.area())
    }

    /// Kerf clearance test.
    ///
    /// Two rectangles are too close unless they are separated by at least
    /// `clearance` along the X axis or along the Y axis. Diagonal neighbours
    /// that clear on one axis only are accepted.
    pub fn is_too_close(&self, other: &Rect, clearance: f64) -> bool {
        let clearance = clearance - CLEARANCE_EPSILON;
        !(self.right() + clearance <= other.x
            || other.right() + clearance <= self.x
            || self.top() + clearance <= other.y
            || other.top() + clearance <= self.y)
    }

    /// True when the rectangle stays inside the sheet minus its safety margin.
    pub fn within_margin(&self, sheet_w: f64, sheet_h: f64, margin: f64) -> bool {
        self.x >= margin - CLEARANCE_EPSILON
            && self.y >= margin - CLEARANCE_EPSILON
            && self.right() <= sheet_w - margin + CLEARANCE_EPSILON
            && self.top() <= sheet_h - margin + CLEARANCE_EPSILON
    }

    /// Rectangle difference `self - cut`.
    ///
    /// Yields up to four residual strips in a fixed order: the strip above the
    /// overlap, the strip below it, then the left and right strips bounded by
    /// the overlap's height. Degenerate strips are dropped. When the
    /// rectangles do not overlap, `self` is returned unchanged.
    pub fn subtract(&self, cut: &Rect) -> Vec<Rect> {
        let Some(overlap) = self.intersection(cut) else {
            return vec![*self];
        };

        let (ix1, iy1, ix2, iy2) = (overlap.x, overlap.y, overlap.right(), overlap.top());
        let mut pieces = Vec::with_capacity(4);

        if iy2 < self.top() {
            pieces.push(Rect::new(self.x, iy2, self.w, self.top() - iy2));
        }
        if iy1 > self.y {
            pieces.push(Rect::new(self.x, self.y, self.w, iy1 - self.y));
        }
        if ix1 > self.x {
            pieces.push(Rect::new(self.x, iy1, ix1 - self.x, iy2 - iy1));
        }
        if ix2 < self.right() {
            pieces.push(Rect::new(ix2, iy1, self.right() - ix2, iy2 - iy1));
        }

        pieces.retain(|p| p.w > DEGENERATE_EPSILON && p.h > DEGENERATE_EPSILON);
        pieces
    }
}

/// Drop every rectangle that is contained in another one of the set.
///
/// Of two identical rectangles the first is kept. Quadratic in the number of
/// rectangles, which stays small for free-space bookkeeping.
pub fn prune_contained(rects: Vec<Rect>, tol: f64) -> Vec<Rect> {
    let mut kept = Vec::with_capacity(rects.len());
    for (i, rect) in rects.iter().enumerate() {
        let dominated = rects.iter().enumerate().any(|(j, other)| {
            i != j && other.contains_within(rect, tol) && (j < i || !rect.contains_within(other, tol))
        });
        if !dominated {
            kept.push(*rect);
        }
    }
    kept
}

/// Round to a fixed number of decimals for reporting.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
