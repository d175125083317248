//! # Visibility Scoring
//!
//! Picks the candidate showing the most of itself inside the viewport.
//!
//! Each candidate's score is the vertical length of its frame that lies
//! within `[min_y, max_y]`. Candidates scoring at or below the configured
//! minimum (zero by default) are discarded. The strictly greatest score wins;
//! on ties the earlier candidate is kept, so results follow scan order.

use crate::geometry::{Rect, Viewport};

/// A candidate and its frame, already in viewport coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleCandidate<Id> {
    pub identity: Id,
    pub frame_in_viewport: Rect,
}

impl<Id> VisibleCandidate<Id> {
    pub fn new(identity: Id, frame_in_viewport: Rect) -> Self {
        Self {
            identity,
            frame_in_viewport,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VisibilityScorer {
    min_visible_extent: f64,
}

impl VisibilityScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require more than `extent` visible points before a candidate counts.
    pub fn with_min_visible_extent(extent: f64) -> Self {
        Self {
            min_visible_extent: extent.max(0.0),
        }
    }

    /// Visible extent of `frame`.
    pub fn score(&self, viewport: &Viewport, frame: &Rect) -> f64 {
        viewport.vertical_overlap(frame)
    }

    /// Best candidate, or `None` if none is visible enough.
    pub fn best<'a, Id>(
        &self,
        viewport: &Viewport,
        candidates: &'a [VisibleCandidate<Id>],
    ) -> Option<&'a VisibleCandidate<Id>> {
        let mut best: Option<(&VisibleCandidate<Id>, f64)> = None;
        for candidate in candidates {
            let score = self.score(viewport, &candidate.frame_in_viewport);
            if score.is_nan() || score <= self.min_visible_extent {
                continue;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((candidate, score)),
            }
        }
        best.map(|(candidate, _)| candidate)
    }
}
