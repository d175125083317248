//! Viewport geometry.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in viewport coordinates (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Full-width row spanning `min_y..max_y`.
    pub fn from_vertical_span(min_y: f64, max_y: f64) -> Self {
        Self::new(0.0, min_y, 0.0, max_y - min_y)
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }
}

/// Vertical bounds of the visible area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub min_y: f64,
    pub max_y: f64,
}

impl Viewport {
    pub fn new(min_y: f64, max_y: f64) -> Self {
        Self { min_y, max_y }
    }

    /// Visible bounds of a scroll view whose content is offset by `bounds.y`.
    pub fn from_bounds(bounds: Rect) -> Self {
        Self::new(bounds.min_y(), bounds.max_y())
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Length of `frame`'s vertical extent that falls inside the viewport.
    pub fn vertical_overlap(&self, frame: &Rect) -> f64 {
        let top = frame.min_y().clamp(self.min_y, self.max_y);
        let bottom = frame.max_y().clamp(self.min_y, self.max_y);
        bottom - top
    }
}
