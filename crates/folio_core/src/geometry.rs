//! Document-space geometry
//!
//! All positions are in document pixels: `y = 0` is the top of the page,
//! independent of the current scroll offset.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in document coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive of the top and left edges, exclusive of the others
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left() && x < self.right() && y >= self.top() && y < self.bottom()
    }

    /// Same rectangle moved by `dy`
    pub fn offset_y(&self, dy: f32) -> Self {
        Self {
            y: self.y + dy,
            ..*self
        }
    }

    /// True when either dimension is zero, negative or not finite
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// The visible window onto the document
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Largest reachable scroll offset for a document of the given height
    pub fn max_scroll(&self, document_height: f32) -> f32 {
        (document_height - self.height).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(10.0, 2000.0, 300.0, 400.0);
        assert_eq!(r.top(), 2000.0);
        assert_eq!(r.bottom(), 2400.0);
        assert_eq!(r.right(), 310.0);
        assert!(!r.is_empty());
        assert!(Rect::ZERO.is_empty());
    }

    #[test]
    fn test_rect_contains_and_center() {
        let r = Rect::new(100.0, 50.0, 200.0, 40.0);
        assert_eq!(r.center(), (200.0, 70.0));
        assert!(r.contains(100.0, 50.0));
        assert!(r.contains(299.0, 89.0));
        assert!(!r.contains(300.0, 70.0));
        assert!(!r.contains(200.0, 90.0));
        assert!(!Rect::ZERO.contains(0.0, 0.0));
        assert_eq!(r.offset_y(-50.0).top(), 0.0);
    }

    #[test]
    fn test_max_scroll_never_negative() {
        let vp = Viewport::new(1000.0, 1000.0);
        assert_eq!(vp.max_scroll(5000.0), 4000.0);
        assert_eq!(vp.max_scroll(600.0), 0.0);
    }
}
