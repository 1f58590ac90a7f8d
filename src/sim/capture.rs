//! Capture state machine
//!
//! `Trackable` -> `Locked` on a capture trigger with the target fully inside
//! the viewfinder. `Locked` -> `Trackable` once the relocation delay elapses
//! and the target has been moved. Triggers while locked are ignored.

use serde::{Deserialize, Serialize};

use super::geometry::{Rect, rect_contains};
use crate::consts::{CAPTURE_REWARD, RELOCATION_DELAY_MS};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CapturePhase {
    /// Target visible and capturable
    Trackable,
    /// Just captured; target relocates at the given time
    Locked { relocate_at_ms: f64 },
}

/// Result of a capture trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Target was fully framed; carries the new score
    Captured { score: u64 },
    /// Triggered but the target wasn't fully inside the frame
    Missed,
    /// Triggered while locked
    Ignored,
}

/// Side effect run on every successful capture (persistence, sound, ...)
pub trait CaptureHook {
    fn on_capture(&mut self, score: u64);
}

/// Hook that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl CaptureHook for NoopHook {
    fn on_capture(&mut self, _score: u64) {}
}

impl<F: FnMut(u64)> CaptureHook for F {
    fn on_capture(&mut self, score: u64) {
        self(score)
    }
}

pub struct CaptureStateMachine {
    phase: CapturePhase,
    hook: Box<dyn CaptureHook>,
}

impl std::fmt::Debug for CaptureStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureStateMachine")
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl CaptureStateMachine {
    pub fn new(hook: Box<dyn CaptureHook>) -> Self {
        Self {
            phase: CapturePhase::Trackable,
            hook,
        }
    }

    #[inline]
    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        matches!(self.phase, CapturePhase::Locked { .. })
    }

    /// Try to capture `target` with `viewfinder`, updating `score` on success
    pub fn trigger(&mut self, viewfinder: &Rect, target: &Rect, score: &mut u64, now_ms: f64) -> CaptureOutcome {
        if self.is_locked() {
            return CaptureOutcome::Ignored;
        }
        if !rect_contains(viewfinder, target) {
            return CaptureOutcome::Missed;
        }

        *score += CAPTURE_REWARD;
        self.phase = CapturePhase::Locked {
            relocate_at_ms: now_ms + RELOCATION_DELAY_MS,
        };
        self.hook.on_capture(*score);
        log::debug!("Target captured, score {}", *score);

        CaptureOutcome::Captured { score: *score }
    }

    /// True once the relocation delay has elapsed
    pub fn relocation_due(&self, now_ms: f64) -> bool {
        match self.phase {
            CapturePhase::Locked { relocate_at_ms } => now_ms >= relocate_at_ms,
            CapturePhase::Trackable => false,
        }
    }

    /// Pending relocation deadline, if locked
    pub fn relocation_deadline(&self) -> Option<f64> {
        match self.phase {
            CapturePhase::Locked { relocate_at_ms } => Some(relocate_at_ms),
            CapturePhase::Trackable => None,
        }
    }

    /// Called after the target has been moved
    pub fn finish_relocation(&mut self) {
        self.phase = CapturePhase::Trackable;
    }

    /// Drop any pending relocation (teardown)
    pub fn cancel(&mut self) {
        self.phase = CapturePhase::Trackable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn frame() -> Rect {
        Rect::new(500.0, 343.0, 250.0, 188.0)
    }

    #[test]
    fn test_capture_locks_and_scores() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let mut machine = CaptureStateMachine::new(Box::new(move |score| sink.borrow_mut().push(score)));
        let mut score = 0;

        let outcome = machine.trigger(&frame(), &Rect::new(600.0, 430.0, 25.0, 35.0), &mut score, 1000.0);
        assert_eq!(outcome, CaptureOutcome::Captured { score: 10 });
        assert_eq!(score, 10);
        assert_eq!(
            machine.phase(),
            CapturePhase::Locked {
                relocate_at_ms: 1500.0
            }
        );
        assert_eq!(*calls.borrow(), vec![10]);
    }

    #[test]
    fn test_partial_overlap_misses_silently() {
        let mut machine = CaptureStateMachine::new(Box::new(NoopHook));
        let mut score = 0;
        let straddling = Rect::new(740.0, 400.0, 25.0, 35.0);

        let outcome = machine.trigger(&frame(), &straddling, &mut score, 0.0);
        assert_eq!(outcome, CaptureOutcome::Missed);
        assert_eq!(score, 0);
        assert_eq!(machine.phase(), CapturePhase::Trackable);
    }

    #[test]
    fn test_locked_ignores_triggers() {
        let mut machine = CaptureStateMachine::new(Box::new(NoopHook));
        let mut score = 0;
        let target = Rect::new(600.0, 430.0, 25.0, 35.0);

        machine.trigger(&frame(), &target, &mut score, 0.0);
        for t in 1..10 {
            let outcome = machine.trigger(&frame(), &target, &mut score, t as f64 * 10.0);
            assert_eq!(outcome, CaptureOutcome::Ignored);
        }
        assert_eq!(score, 10);
        // The relocation deadline is not pushed back by ignored triggers
        assert_eq!(machine.relocation_deadline(), Some(500.0));
    }

    #[test]
    fn test_relocation_timing() {
        let mut machine = CaptureStateMachine::new(Box::new(NoopHook));
        let mut score = 0;
        machine.trigger(&frame(), &Rect::new(600.0, 430.0, 25.0, 35.0), &mut score, 0.0);

        assert!(!machine.relocation_due(499.0));
        assert!(machine.relocation_due(500.0));

        machine.finish_relocation();
        assert!(!machine.is_locked());
        assert!(!machine.relocation_due(10_000.0));
    }
}
