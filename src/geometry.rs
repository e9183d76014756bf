//! Coordinates: viewport points, scroll offsets, and persisted positions.
//!
//! Pointer events arrive in viewport (client) coordinates. Everything the
//! canvas stores is document-relative, i.e. viewport coordinates plus the
//! window's current scroll offset.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

/// A point or offset in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert a viewport point to document coordinates given the scroll offset.
    #[must_use]
    pub fn to_document(self, scroll: Point) -> Self {
        Self { x: self.x + scroll.x, y: self.y + scroll.y }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn minus(self, other: Point) -> Self {
        Self { x: self.x - other.x, y: self.y - other.y }
    }
}

/// Top-left corner of an image in document coordinates.
///
/// This is the Position Record persisted as `{"left": .., "top": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub left: f64,
    pub top: f64,
}

impl Position {
    /// The origin, used when an image has no usable Position Record.
    pub const ORIGIN: Self = Self { left: 0.0, top: 0.0 };

    #[must_use]
    pub fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }

    /// Both coordinates are finite numbers.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.left.is_finite() && self.top.is_finite()
    }

    /// The position as a point.
    #[must_use]
    pub fn as_point(self) -> Point {
        Point::new(self.left, self.top)
    }
}

impl From<Point> for Position {
    fn from(pt: Point) -> Self {
        Self { left: pt.x, top: pt.y }
    }
}
