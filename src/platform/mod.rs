//! Platform layer
//!
//! - `input`: key and pointer mapping (all targets)
//! - `storage`: JSON values in LocalStorage (no-op natively)
//! - `wallet`: wallet extension and balance RPC adapters (browser)
//! - `web`: the `GameApi` the page drives, animation loop, timers (browser)

pub mod input;
pub mod storage;
#[cfg(target_arch = "wasm32")]
pub mod wallet;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use input::{HeldKeys, KeyAction, client_to_canvas, key_action};
#[cfg(target_arch = "wasm32")]
pub use web::GameApi;
