//! Game state and the per-view game session
//!
//! A `GameSession` is created when the game view opens and torn down
//! explicitly with [`GameSession::stop`]. It owns every piece of mutable
//! state; input handlers and the render loop borrow it in turn.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::capture::{CaptureHook, CaptureOutcome, CapturePhase, CaptureStateMachine};
use super::geometry::{Rect, rects_overlap};
use super::placement::{PlacementRules, place_target};
use super::viewfinder::Viewfinder;
use crate::config::PlayfieldConfig;
use crate::consts::*;
use crate::error::ConfigError;

/// Mutable gameplay state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub score: u64,
    pub viewfinder: Viewfinder,
    /// Target top-left, re-rolled after each capture
    pub target_pos: Vec2,
    pub target_size: Vec2,
    /// Target overlaps the viewfinder this tick (drives the tracking overlay)
    pub target_in_frame: bool,
}

impl GameState {
    #[inline]
    pub fn target_rect(&self) -> Rect {
        Rect::from_pos_size(self.target_pos, self.target_size)
    }

    #[inline]
    pub fn viewfinder_rect(&self) -> Rect {
        self.viewfinder.rect()
    }
}

/// The jumbotron: rotating crowd images and the capture announcement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecondaryDisplayState {
    pub current_image: usize,
    pub image_count: usize,
    /// Announcement is showing until this time
    announcement_until_ms: Option<f64>,
}

impl SecondaryDisplayState {
    pub fn new(image_count: usize) -> Self {
        Self {
            current_image: 0,
            image_count,
            announcement_until_ms: None,
        }
    }

    #[inline]
    pub fn show_capture_message(&self) -> bool {
        self.announcement_until_ms.is_some()
    }

    /// Show the announcement, restarting its timer if already showing
    pub fn announce(&mut self, now_ms: f64) {
        self.announcement_until_ms = Some(now_ms + ANNOUNCEMENT_DURATION_MS);
    }

    pub fn announcement_deadline(&self) -> Option<f64> {
        self.announcement_until_ms
    }

    /// Clear the announcement once it has expired
    pub fn expire(&mut self, now_ms: f64) {
        if self.announcement_until_ms.is_some_and(|until| now_ms >= until) {
            self.announcement_until_ms = None;
        }
    }

    pub fn clear(&mut self) {
        self.announcement_until_ms = None;
    }
}

/// One active game view
#[derive(Debug)]
pub struct GameSession {
    config: PlayfieldConfig,
    pub state: GameState,
    pub display: SecondaryDisplayState,
    capture: CaptureStateMachine,
    rng: Pcg32,
    running: bool,
}

impl GameSession {
    /// Validate the config, place the first target and start running
    pub fn new(config: PlayfieldConfig, seed: u64, hook: Box<dyn CaptureHook>) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = Pcg32::seed_from_u64(seed);
        let target_pos = place_target(&mut rng, &PlacementRules::from_config(&config));
        let viewfinder = Viewfinder::new(
            config.viewfinder_size(),
            Vec2::new(config.canvas_width, config.canvas_height),
        );

        let state = GameState {
            score: 0,
            viewfinder,
            target_pos,
            target_size: config.target_size(),
            target_in_frame: false,
        };
        let display = SecondaryDisplayState::new(config.crowd_image_count);

        log::info!("Game session started (seed {seed})");

        Ok(Self {
            config,
            state,
            display,
            capture: CaptureStateMachine::new(hook),
            rng,
            running: true,
        })
    }

    #[inline]
    pub fn config(&self) -> &PlayfieldConfig {
        &self.config
    }

    #[inline]
    pub fn score(&self) -> u64 {
        self.state.score
    }

    #[inline]
    pub fn is_capturing(&self) -> bool {
        self.capture.is_locked()
    }

    #[inline]
    pub fn capture_phase(&self) -> CapturePhase {
        self.capture.phase()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.state.viewfinder.on_pointer_move(x, y);
    }

    pub fn nudge(&mut self, dir: Vec2) {
        self.state.viewfinder.nudge(dir, self.config.viewfinder_speed);
    }

    /// Explicit capture action (key or click)
    pub fn trigger_capture(&mut self, now_ms: f64) -> CaptureOutcome {
        if !self.running || self.capture.is_locked() {
            return CaptureOutcome::Ignored;
        }

        let viewfinder = self.state.viewfinder_rect();
        let target = self.state.target_rect();
        let outcome = self
            .capture
            .trigger(&viewfinder, &target, &mut self.state.score, now_ms);

        if let CaptureOutcome::Captured { .. } = outcome {
            self.display.announce(now_ms);
        }
        outcome
    }

    /// Fire whichever timers are due: relocation and announcement expiry
    pub fn advance_timers(&mut self, now_ms: f64) {
        if self.capture.relocation_due(now_ms) {
            self.relocate_target();
            self.capture.finish_relocation();
        }
        self.display.expire(now_ms);
    }

    /// Earliest pending timer deadline, for hosts that schedule wake-ups
    pub fn next_deadline(&self) -> Option<f64> {
        match (self.capture.relocation_deadline(), self.display.announcement_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn relocate_target(&mut self) {
        let rules = PlacementRules::from_config(&self.config);
        self.state.target_pos = place_target(&mut self.rng, &rules);
    }

    /// Per-frame state update: stochastic display refresh, then overlap
    pub fn update_frame(&mut self) {
        if self.state.viewfinder.moved()
            && self.rng.random::<f32>() < DISPLAY_REFRESH_CHANCE
            && !self.display.show_capture_message()
        {
            if self.display.image_count > 0 {
                self.display.current_image = self.rng.random_range(0..self.display.image_count);
            }
            self.state.viewfinder.clear_moved();
        }

        self.state.target_in_frame = rects_overlap(&self.state.target_rect(), &self.state.viewfinder_rect());
    }

    /// Stop the loop and drop pending timers
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.capture.cancel();
        self.display.clear();
        log::info!("Game session stopped (score {})", self.state.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::capture::NoopHook;

    fn session() -> GameSession {
        GameSession::new(PlayfieldConfig::default(), 42, Box::new(NoopHook)).unwrap()
    }

    #[test]
    fn test_new_session() {
        let s = session();
        assert_eq!(s.score(), 0);
        assert!(!s.is_capturing());
        assert!(s.is_running());
        assert!(!s.display.show_capture_message());
        assert!(!s.state.target_rect().overlaps(&s.config().exclusion_zone()));
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = PlayfieldConfig {
            target_width: 400.0,
            ..Default::default()
        };
        assert!(GameSession::new(config, 1, Box::new(NoopHook)).is_err());
    }

    #[test]
    fn test_announcement_restarts_on_new_capture() {
        let mut s = session();
        s.state.viewfinder.on_pointer_move(625.0, 437.0);
        s.state.target_pos = Vec2::new(600.0, 430.0);
        s.trigger_capture(0.0);
        assert_eq!(s.display.announcement_deadline(), Some(3000.0));

        // Relocate, then capture again while the first announcement is up
        s.advance_timers(500.0);
        assert!(s.display.show_capture_message());
        s.state.target_pos = Vec2::new(600.0, 430.0);
        s.trigger_capture(1000.0);
        assert_eq!(s.display.announcement_deadline(), Some(4000.0));

        s.advance_timers(3500.0);
        assert!(s.display.show_capture_message());
        s.advance_timers(4000.0);
        assert!(!s.display.show_capture_message());
    }

    #[test]
    fn test_next_deadline() {
        let mut s = session();
        assert_eq!(s.next_deadline(), None);
        s.state.viewfinder.on_pointer_move(625.0, 437.0);
        s.state.target_pos = Vec2::new(600.0, 430.0);
        s.trigger_capture(100.0);
        assert_eq!(s.next_deadline(), Some(600.0));
        s.advance_timers(600.0);
        assert_eq!(s.next_deadline(), Some(3100.0));
    }

    #[test]
    fn test_display_refresh_only_after_movement() {
        let mut s = session();
        for _ in 0..500 {
            s.update_frame();
        }
        assert_eq!(s.display.current_image, 0);

        // Keep moving until the 5% roll hits and clears the flag
        let mut x = 100.0;
        let mut refreshed = false;
        for _ in 0..2000 {
            x = if x > 1000.0 { 100.0 } else { x + 20.0 };
            s.on_pointer_move(x, 400.0);
            s.update_frame();
            if !s.state.viewfinder.moved() {
                refreshed = true;
                break;
            }
        }
        assert!(refreshed);
        assert!(s.display.current_image < 19);
    }

    #[test]
    fn test_no_refresh_while_announcing() {
        let mut s = session();
        s.display.announce(0.0);
        s.on_pointer_move(100.0, 100.0);
        for _ in 0..2000 {
            s.update_frame();
        }
        assert!(s.state.viewfinder.moved());
        assert_eq!(s.display.current_image, 0);
    }

    #[test]
    fn test_stop_clears_timers_and_blocks_capture() {
        let mut s = session();
        s.state.viewfinder.on_pointer_move(625.0, 437.0);
        s.state.target_pos = Vec2::new(600.0, 430.0);
        s.trigger_capture(0.0);
        s.stop();

        assert!(!s.is_running());
        assert!(!s.is_capturing());
        assert_eq!(s.next_deadline(), None);

        s.advance_timers(600.0);
        assert_eq!(s.state.target_pos, Vec2::new(600.0, 430.0));
        assert_eq!(s.trigger_capture(700.0), CaptureOutcome::Ignored);
        assert_eq!(s.score(), 10);
    }
}
