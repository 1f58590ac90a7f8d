//! Rendering module
//!
//! `scene` builds a backend-neutral display list from the game session;
//! `canvas` (browser only) draws it with Canvas2D.

pub mod assets;
#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod scene;

pub use assets::{AssetAvailability, AssetBook, AssetId, AssetStatus};
#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderer;
pub use scene::{DrawCmd, blink_on, compose, target_opacity};
