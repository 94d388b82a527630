//! Axis-aligned rectangles in screen space.
//!
//! The y axis grows downward: `top` is the smaller y and `bottom` the larger one.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle covering `[x, x + width] × [y, y + height]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Horizontal extent
    pub width: f32,
    /// Vertical extent
    pub height: f32,
}

impl Rect {
    /// Creates a new rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from a top-left position and a size vector.
    #[must_use]
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    /// Creates a rectangle of the given size centered on a point.
    #[must_use]
    pub fn centered_on(center: Vec2, size: Vec2) -> Self {
        Self::from_pos_size(center - size * 0.5, size)
    }

    /// Left edge.
    #[must_use]
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.y
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Top-left corner.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Width and height as a vector.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Strict overlap test. Touching edges do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Returns true if `x` lies within the horizontal span, edges included.
    #[must_use]
    pub fn spans_x(&self, x: f32) -> bool {
        x >= self.left() && x <= self.right()
    }

    /// Returns a copy moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    /// Penetration depths of `self` into `other` along each side.
    #[must_use]
    pub fn penetration(&self, other: &Self) -> Penetration {
        Penetration {
            left: self.right() - other.left(),
            right: other.right() - self.left(),
            top: self.bottom() - other.top(),
            bottom: other.bottom() - self.top(),
        }
    }

    /// Returns true if every coordinate is finite and both extents are positive.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Overlap depths between two rectangles.
///
/// Each field is the distance the first rectangle must move in that direction
/// to stop overlapping the second: `left` pushes it left, `top` pushes it up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    /// Depth resolved by moving left
    pub left: f32,
    /// Depth resolved by moving right
    pub right: f32,
    /// Depth resolved by moving up
    pub top: f32,
    /// Depth resolved by moving down
    pub bottom: f32,
}

impl Penetration {
    /// Smaller of the two horizontal depths.
    #[must_use]
    pub fn min_horizontal(&self) -> f32 {
        self.left.min(self.right)
    }

    /// Smaller of the two vertical depths.
    #[must_use]
    pub fn min_vertical(&self) -> f32 {
        self.top.min(self.bottom)
    }
}
