//! Guillotine bin: free space is a set of disjoint sections, each produced by
//! an edge-to-edge cut, so the resulting layout can be cut on a beam saw.

use super::{Candidate, Heuristic, PackingBin, PlacedItem, FIT_EPSILON};
use panelnest_core::Rect;

pub struct GuillotineBin {
    allow_rotation: bool,
    heuristic: Heuristic,
    sections: Vec<Rect>,
    placed: Vec<PlacedItem>,
}

impl GuillotineBin {
    pub fn new(width: f64, height: f64, allow_rotation: bool, heuristic: Heuristic) -> Self {
        Self {
            allow_rotation,
            heuristic,
            sections: vec![Rect::new(0.0, 0.0, width, height)],
            placed: Vec::new(),
        }
    }

    pub fn sections(&self) -> &[Rect] {
        &self.sections
    }

    fn score(&self, section: &Rect, width: f64, height: f64) -> f64 {
        let leftover_w = section.w - width;
        let leftover_h = section.h - height;
        match self.heuristic {
            Heuristic::GuillotineBestLongSideFit => leftover_w.max(leftover_h),
            Heuristic::GuillotineBestAreaFit => section.area() - width * height,
            _ => leftover_w.min(leftover_h),
        }
    }

    /// Shorter-axis split: the cut runs along the section's shorter side.
    fn split(section: &Rect, width: f64, height: f64) -> Vec<Rect> {
        let mut out = Vec::with_capacity(2);
        if section.w < section.h {
            // Horizontal cut: full-width strip above, item-high strip right.
            if height < section.h {
                out.push(Rect::new(section.x, section.y + height, section.w, section.h - height));
            }
            if width < section.w {
                out.push(Rect::new(section.x + width, section.y, section.w - width, height));
            }
        } else {
            // Vertical cut: item-wide strip above, full-height strip right.
            if height < section.h {
                out.push(Rect::new(section.x, section.y + height, width, section.h - height));
            }
            if width < section.w {
                out.push(Rect::new(section.x + width, section.y, section.w - width, section.h));
            }
        }
        out
    }
}

impl PackingBin for GuillotineBin {
    fn find_position(&self, width: f64, height: f64) -> Option<Candidate> {
        let mut orientations = vec![(width, height, false)];
        if self.allow_rotation {
            orientations.push((height, width, true));
        }

        let mut best: Option<Candidate> = None;
        for (w, h, rotated) in orientations {
            for (slot, section) in self.sections.iter().enumerate() {
                if w > section.w + FIT_EPSILON || h > section.h + FIT_EPSILON {
                    continue;
                }
                let fitness = self.score(section, w, h);
                if best.is_none_or(|b| fitness < b.fitness) {
                    best = Some(Candidate {
                        rect: Rect::new(section.x, section.y, w, h),
                        rotated,
                        fitness,
                        slot,
                    });
                }
            }
        }
        best
    }

    fn place(&mut self, candidate: Candidate, item: usize) {
        let section = self.sections.remove(candidate.slot);
        self.sections
            .extend(Self::split(&section, candidate.rect.w, candidate.rect.h));
        self.placed.push(PlacedItem {
            rect: candidate.rect,
            item,
            rotated: candidate.rotated,
        });
    }

    fn placed(&self) -> &[PlacedItem] {
        &self.placed
    }
}
