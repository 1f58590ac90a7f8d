//! Axis-aligned rectangle geometry
//!
//! Two predicates drive the game: *overlap* (any intersection, used for the
//! tracking affordances) and *containment* (target fully inside the
//! viewfinder, used for capture). Both use inclusive bounds, so touching
//! edges overlap and a target flush with the frame edge is contained.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle at `pos` (top-left) with the given size
    #[inline]
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Grow by `amount` on every side
    pub fn expand(&self, amount: f32) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.w + amount * 2.0,
            self.h + amount * 2.0,
        )
    }

    /// Shrink by `amount` on every side (size never goes negative)
    pub fn inset(&self, amount: f32) -> Self {
        Self::new(
            self.x + amount,
            self.y + amount,
            (self.w - amount * 2.0).max(0.0),
            (self.h - amount * 2.0).max(0.0),
        )
    }

    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        rects_overlap(self, other)
    }

    #[inline]
    pub fn contains(&self, inner: &Rect) -> bool {
        rect_contains(self, inner)
    }
}

/// True if `a` and `b` intersect on both axes. Touching edges count.
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    !(a.x > b.right() || a.right() < b.x || a.y > b.bottom() || a.bottom() < b.y)
}

/// True if `inner` lies entirely within `outer` (inclusive bounds)
pub fn rect_contains(outer: &Rect, inner: &Rect) -> bool {
    inner.x >= outer.x
        && inner.right() <= outer.right()
        && inner.y >= outer.y
        && inner.bottom() <= outer.bottom()
}

/// Euclidean distance between the centres of two rectangles
#[inline]
pub fn center_distance(a: &Rect, b: &Rect) -> f32 {
    a.center().distance(b.center())
}
