//! MaxRects bin: keeps every maximal free rectangle of the sheet.

use super::{Candidate, Heuristic, PackingBin, PlacedItem, FIT_EPSILON};
use panelnest_core::{prune_contained, Rect};

pub struct MaxRectsBin {
    allow_rotation: bool,
    heuristic: Heuristic,
    free: Vec<Rect>,
    placed: Vec<PlacedItem>,
}

impl MaxRectsBin {
    pub fn new(width: f64, height: f64, allow_rotation: bool, heuristic: Heuristic) -> Self {
        Self {
            allow_rotation,
            heuristic,
            free: vec![Rect::new(0.0, 0.0, width, height)],
            placed: Vec::new(),
        }
    }

    /// Position score, compared lexicographically; lower is better.
    fn score(&self, free: &Rect, width: f64, height: f64) -> (f64, f64) {
        match self.heuristic {
            Heuristic::MaxRectsBestShortSideFit => ((free.w - width).min(free.h - height), 0.0),
            Heuristic::MaxRectsBestAreaFit => (free.area() - width * height, 0.0),
            _ => (free.y + height, free.x),
        }
    }

    /// Bottom-left does not rank bins: the first bin with room wins.
    fn fitness(&self, score: (f64, f64)) -> f64 {
        match self.heuristic {
            Heuristic::MaxRectsBestShortSideFit | Heuristic::MaxRectsBestAreaFit => score.0,
            _ => 0.0,
        }
    }

    /// Split every free rectangle the placed item overlaps into the maximal
    /// rectangles left around it.
    fn split_free(&mut self, used: &Rect) {
        let mut next = Vec::with_capacity(self.free.len() + 4);
        for free in &self.free {
            if !free.intersects(used) {
                next.push(*free);
                continue;
            }
            if used.x > free.x {
                next.push(Rect::new(free.x, free.y, used.x - free.x, free.h));
            }
            if used.right() < free.right() {
                next.push(Rect::new(used.right(), free.y, free.right() - used.right(), free.h));
            }
            if used.top() < free.top() {
                next.push(Rect::new(free.x, used.top(), free.w, free.top() - used.top()));
            }
            if used.y > free.y {
                next.push(Rect::new(free.x, free.y, free.w, used.y - free.y));
            }
        }
        self.free = prune_contained(next, 0.0);
    }
}

impl PackingBin for MaxRectsBin {
    fn find_position(&self, width: f64, height: f64) -> Option<Candidate> {
        let mut orientations = vec![(width, height, false)];
        if self.allow_rotation {
            orientations.push((height, width, true));
        }

        let mut best: Option<((f64, f64), Candidate)> = None;
        for (w, h, rotated) in orientations {
            for (slot, free) in self.free.iter().enumerate() {
                if w > free.w + FIT_EPSILON || h > free.h + FIT_EPSILON {
                    continue;
                }
                let score = self.score(free, w, h);
                if best.is_none_or(|(s, _)| score < s) {
                    best = Some((
                        score,
                        Candidate {
                            rect: Rect::new(free.x, free.y, w, h),
                            rotated,
                            fitness: self.fitness(score),
                            slot,
                        },
                    ));
                }
            }
        }
        best.map(|(_, candidate)| candidate)
    }

    fn place(&mut self, candidate: Candidate, item: usize) {
        self.split_free(&candidate.rect);
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
