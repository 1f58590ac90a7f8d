//! Keyboard and pointer mapping
//!
//! Pure translation from browser key names and client coordinates into
//! game input, so it can be tested without a DOM.

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Capture,
    ToggleMusic,
    /// Held movement key
    Move,
}

/// Map a `KeyboardEvent.key` value
pub fn key_action(key: &str) -> Option<KeyAction> {
    match key {
        " " => Some(KeyAction::Capture),
        "m" | "M" => Some(KeyAction::ToggleMusic),
        "ArrowUp" | "ArrowDown" | "ArrowLeft" | "ArrowRight" => Some(KeyAction::Move),
        _ => None,
    }
}

/// Arrow keys currently held down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

impl HeldKeys {
    /// Returns true if the key is an arrow key
    pub fn press(&mut self, key: &str) -> bool {
        self.set(key, true)
    }

    pub fn release(&mut self, key: &str) -> bool {
        self.set(key, false)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn set(&mut self, key: &str, down: bool) -> bool {
        let slot = match key {
            "ArrowUp" => &mut self.up,
            "ArrowDown" => &mut self.down,
            "ArrowLeft" => &mut self.left,
            "ArrowRight" => &mut self.right,
            _ => return false,
        };
        *slot = down;
        true
    }

    /// Per-axis direction in {-1, 0, 1}, screen coordinates (y down).
    /// Opposite keys cancel.
    pub fn direction(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| pos as i8 as f32 - neg as i8 as f32;
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
    }
}

/// Convert a client-space pointer position to canvas units.
///
/// `origin`/`css_size` are the canvas bounding rect; the result is scaled by
/// the backing-store size so CSS-scaled canvases still line up.
pub fn client_to_canvas(client: Vec2, origin: Vec2, css_size: Vec2, canvas_size: Vec2) -> Vec2 {
    let local = client - origin;
    if css_size.x <= 0.0 || css_size.y <= 0.0 {
        return local;
    }
    local * (canvas_size / css_size)
}
