//! Game simulation
//!
//! All gameplay logic lives here. No rendering or platform dependencies:
//! time comes in as milliseconds and randomness from a seeded RNG, so every
//! rule can be driven from tests.

pub mod capture;
pub mod geometry;
pub mod placement;
pub mod state;
pub mod tick;
pub mod viewfinder;

pub use capture::{CaptureHook, CaptureOutcome, CapturePhase, CaptureStateMachine, NoopHook};
pub use geometry::{Rect, center_distance, rect_contains, rects_overlap};
pub use placement::{PlacementRules, place_target};
pub use state::{GameSession, GameState, SecondaryDisplayState};
pub use tick::{TickInput, tick};
pub use viewfinder::Viewfinder;
