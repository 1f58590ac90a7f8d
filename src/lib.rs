//! Kiss Cam - find the couple in the stadium viewfinder
//!
//! Core modules:
//! - `sim`: Game state, geometry, placement and the capture state machine
//! - `renderer`: Display-list composition and the Canvas2D backend
//! - `persistence`: Score store port (in-memory and hosted REST)
//! - `session`: Score bridge, leaderboard, wallet eligibility, host API
//! - `platform`: Browser glue (animation loop, input, timers)

pub mod config;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;

pub use config::PlayfieldConfig;
pub use error::{ConfigError, EligibilityError, GameError, StoreError};
pub use settings::Settings;
pub use sim::{GameSession, Rect};

/// Game tuning constants
pub mod consts {
    /// Points awarded per successful capture
    pub const CAPTURE_REWARD: u64 = 10;
    /// Delay between a capture and the target reappearing elsewhere
    pub const RELOCATION_DELAY_MS: f64 = 500.0;
    /// How long the capture announcement stays on the secondary display
    pub const ANNOUNCEMENT_DURATION_MS: f64 = 3000.0;

    /// Placement attempts inside preferred regions before the fallback
    pub const PLACEMENT_ATTEMPTS: u32 = 30;

    /// Distance at which the target fades to its floor opacity
    pub const OPACITY_FALLOFF_DISTANCE: f32 = 300.0;
    /// Target never gets fainter than this
    pub const MIN_TARGET_OPACITY: f32 = 0.2;

    /// Per-tick chance of rotating the secondary display image after a move
    pub const DISPLAY_REFRESH_CHANCE: f32 = 0.05;
    /// Pointer moves smaller than this (per axis) don't count as movement
    pub const MOVE_THRESHOLD: f32 = 1.0;

    /// Record dot blink period
    pub const REC_BLINK_MS: f64 = 500.0;
    /// Announcement text blink period
    pub const ANNOUNCE_BLINK_MS: f64 = 300.0;

    /// Zoom inset geometry (inside the viewfinder, bottom-right)
    pub const ZOOM_INSET_SIZE: f32 = 60.0;
    pub const ZOOM_INSET_MARGIN: f32 = 10.0;
    pub const ZOOM_INSET_SCALE: f32 = 3.5;

    /// Fallback tick length when no frame time is available (60 Hz)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
}

/// Current wall-clock time in milliseconds
#[cfg(target_arch = "wasm32")]
#[inline]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Current wall-clock time in milliseconds
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
