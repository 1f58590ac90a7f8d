//! Per-frame simulation step
//!
//! Input events are folded into a `TickInput` and applied in a fixed order:
//! pointer, keyboard nudge, capture trigger, due timers, then the frame
//! update (display refresh and overlap).

use glam::Vec2;

use super::capture::CaptureOutcome;
use super::state::GameSession;

/// Input collected since the previous tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Latest pointer position in canvas coordinates
    pub pointer: Option<Vec2>,
    /// Capture requested (space / click)
    pub capture: bool,
    /// Held arrow keys, each axis in -1..=1
    pub nudge: Vec2,
}

/// Advance the session to `now_ms`. Returns the capture outcome if a
/// capture was requested this tick.
pub fn tick(session: &mut GameSession, input: &TickInput, now_ms: f64) -> Option<CaptureOutcome> {
    if !session.is_running() {
        return None;
    }

    if let Some(p) = input.pointer {
        session.on_pointer_move(p.x, p.y);
    }
    session.nudge(input.nudge);

    let outcome = input.capture.then(|| session.trigger_capture(now_ms));

    session.advance_timers(now_ms);
    session.update_frame();

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayfieldConfig;
    use crate::consts::FRAME_MS;
    use crate::sim::capture::NoopHook;

    fn session(seed: u64) -> GameSession {
        GameSession::new(PlayfieldConfig::default(), seed, Box::new(NoopHook)).unwrap()
    }

    fn aim(session: &mut GameSession) {
        tick(
            session,
            &TickInput {
                pointer: Some(Vec2::new(625.0, 437.0)),
                ..Default::default()
            },
            0.0,
        );
        session.state.target_pos = Vec2::new(600.0, 430.0);
    }

    #[test]
    fn test_capture_then_relocate() {
        let mut s = session(12345);
        aim(&mut s);
        assert_eq!(s.state.viewfinder.pos, Vec2::new(500.0, 343.0));

        let capture = TickInput {
            capture: true,
            ..Default::default()
        };
        let outcome = tick(&mut s, &capture, 0.0);
        assert_eq!(outcome, Some(CaptureOutcome::Captured { score: 10 }));
        assert_eq!(s.score(), 10);
        assert!(s.is_capturing());
        assert!(s.display.show_capture_message());

        // Step frames through the relocation delay
        let mut now = 0.0;
        while now < 500.0 {
            now += FRAME_MS;
            tick(&mut s, &TickInput::default(), now);
        }

        assert!(!s.is_capturing());
        assert_ne!(s.state.target_pos, Vec2::new(600.0, 430.0));
        // Announcement outlives the relocation
        assert!(s.display.show_capture_message());
    }

    #[test]
    fn test_capture_is_idempotent_while_locked() {
        let mut s = session(7);
        aim(&mut s);
        let capture = TickInput {
            capture: true,
            ..Default::default()
        };
        tick(&mut s, &capture, 0.0);

        for i in 1..20 {
            let outcome = tick(&mut s, &capture, i as f64 * 20.0);
            assert_eq!(outcome, Some(CaptureOutcome::Ignored));
            assert_eq!(s.score(), 10);
            assert_eq!(s.state.target_pos, Vec2::new(600.0, 430.0));
        }
    }

    #[test]
    fn test_partial_overlap_tracks_but_misses() {
        let mut s = session(3);
        aim(&mut s);
        // Straddle the viewfinder's right edge
        s.state.target_pos = Vec2::new(740.0, 400.0);

        let outcome = tick(
            &mut s,
            &TickInput {
                capture: true,
                ..Default::default()
            },
            0.0,
        );
        assert_eq!(outcome, Some(CaptureOutcome::Missed));
        assert_eq!(s.score(), 0);
        assert!(!s.is_capturing());
        assert!(!s.display.show_capture_message());
        assert!(s.state.target_in_frame);
    }

    #[test]
    fn test_nudge_moves_viewfinder() {
        let mut s = session(1);
        let start = s.state.viewfinder.pos;
        tick(
            &mut s,
            &TickInput {
                nudge: Vec2::new(-1.0, 0.0),
                ..Default::default()
            },
            0.0,
        );
        assert_eq!(s.state.viewfinder.pos, start - Vec2::new(6.0, 0.0));
    }

    #[test]
    fn test_stopped_session_ignores_input() {
        let mut s = session(1);
        s.stop();
        let start = s.state.viewfinder.pos;
        let outcome = tick(
            &mut s,
            &TickInput {
                pointer: Some(Vec2::new(10.0, 10.0)),
                capture: true,
                ..Default::default()
            },
            0.0,
        );
        assert_eq!(outcome, None);
        assert_eq!(s.state.viewfinder.pos, start);
    }

    #[test]
    fn test_determinism() {
        let mut a = session(99999);
        let mut b = session(99999);
        let inputs = [
            TickInput {
                pointer: Some(Vec2::new(300.0, 300.0)),
                ..Default::default()
            },
            TickInput {
                pointer: Some(Vec2::new(900.0, 200.0)),
                capture: true,
                ..Default::default()
            },
            TickInput::default(),
        ];

        let mut now = 0.0;
        for _ in 0..200 {
            for input in &inputs {
                now += FRAME_MS;
                tick(&mut a, input, now);
                tick(&mut b, input, now);
            }
        }

        assert_eq!(a.state.target_pos, b.state.target_pos);
        assert_eq!(a.display.current_image, b.display.current_image);
        assert_eq!(a.score(), b.score());
    }
}
