//! Player-controlled viewfinder
//!
//! Position is the frame's top-left corner, always clamped so the whole
//! frame stays on the canvas.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use crate::consts::MOVE_THRESHOLD;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewfinder {
    pub pos: Vec2,
    pub size: Vec2,
    /// Canvas size the frame is clamped to
    bounds: Vec2,
    /// Set on real movement, cleared by the secondary-display refresh
    moved: bool,
}

impl Viewfinder {
    /// Frame centred on the canvas
    pub fn new(size: Vec2, bounds: Vec2) -> Self {
        Self {
            pos: (bounds - size) / 2.0,
            size,
            bounds,
            moved: false,
        }
    }

    /// Centre the frame on the pointer, clamped to the canvas
    pub fn on_pointer_move(&mut self, pointer_x: f32, pointer_y: f32) {
        let wanted = Vec2::new(pointer_x, pointer_y) - self.size / 2.0;
        self.move_to(wanted);
    }

    /// Keyboard movement: `dir` components in -1..=1, scaled by `speed`
    pub fn nudge(&mut self, dir: Vec2, speed: f32) {
        if dir != Vec2::ZERO {
            self.move_to(self.pos + dir * speed);
        }
    }

    fn move_to(&mut self, wanted: Vec2) {
        let max = (self.bounds - self.size).max(Vec2::ZERO);
        let clamped = wanted.clamp(Vec2::ZERO, max);

        let delta = (clamped - self.pos).abs();
        if delta.x > MOVE_THRESHOLD || delta.y > MOVE_THRESHOLD {
            self.moved = true;
        }
        self.pos = clamped;
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    #[inline]
    pub fn moved(&self) -> bool {
        self.moved
    }

    #[inline]
    pub fn clear_moved(&mut self) {
        self.moved = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn viewfinder() -> Viewfinder {
        Viewfinder::new(Vec2::new(250.0, 188.0), Vec2::new(1250.0, 875.0))
    }

    #[test]
    fn test_starts_centered() {
        let vf = viewfinder();
        assert_eq!(vf.pos, Vec2::new(500.0, 343.5));
        assert!(!vf.moved());
    }

    #[test]
    fn test_pointer_centers_frame() {
        let mut vf = viewfinder();
        vf.on_pointer_move(625.0, 437.0);
        assert_eq!(vf.pos, Vec2::new(500.0, 343.0));
        assert_eq!(vf.center(), Vec2::new(625.0, 437.0));
    }

    #[test]
    fn test_sub_pixel_jitter_is_not_movement() {
        let mut vf = viewfinder();
        vf.on_pointer_move(625.5, 437.0);
        assert!(!vf.moved());

        vf.on_pointer_move(700.0, 437.0);
        assert!(vf.moved());

        vf.clear_moved();
        assert!(!vf.moved());
    }

    #[test]
    fn test_clamped_move_against_wall_is_not_movement() {
        let mut vf = viewfinder();
        vf.on_pointer_move(-500.0, -500.0);
        assert_eq!(vf.pos, Vec2::ZERO);
        vf.clear_moved();

        // Still pinned to the corner, so nothing changed
        vf.on_pointer_move(-900.0, -20.0);
        assert_eq!(vf.pos, Vec2::ZERO);
        assert!(!vf.moved());
    }

    #[test]
    fn test_nudge() {
        let mut vf = viewfinder();
        let start = vf.pos;
        vf.nudge(Vec2::new(1.0, 0.0), 6.0);
        assert_eq!(vf.pos, start + Vec2::new(6.0, 0.0));
        assert!(vf.moved());

        vf.nudge(Vec2::new(0.0, 1.0), 10_000.0);
        assert_eq!(vf.pos.y, 875.0 - 188.0);
    }

    proptest! {
        #[test]
        fn stays_in_bounds(x in -10_000.0f32..10_000.0, y in -10_000.0f32..10_000.0) {
            let mut vf = viewfinder();
            vf.on_pointer_move(x, y);
            prop_assert!(vf.pos.x >= 0.0 && vf.pos.x <= 1250.0 - 250.0);
            prop_assert!(vf.pos.y >= 0.0 && vf.pos.y <= 875.0 - 188.0);
        }
    }
}
