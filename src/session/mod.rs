//! Everything around a game that talks to the outside world
//!
//! - `bridge`: detached score/session persistence calls
//! - `leaderboard`: top players, refreshed on inserts
//! - `eligibility`: wallet connection and balance gate
//! - `host`: the start/end API the page drives

pub mod bridge;
pub mod eligibility;
pub mod host;
pub mod leaderboard;

#[cfg(target_arch = "wasm32")]
pub use bridge::BrowserSpawner;
pub use bridge::{ScoreBridge, TaskSpawner};
pub use eligibility::{BalanceOracle, EligibilityGate, EligibilityPolicy, UserEvent, WalletProvider};
pub use host::{GameHost, PlayGate};
pub use leaderboard::{Leaderboard, LeaderboardRow};
