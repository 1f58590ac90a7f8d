//! Score store port
//!
//! The game only ever talks to persistence through [`ScoreStore`]. Every
//! operation returns a `'static` local future so callers can detach it from
//! the render path; implementations clone whatever they need up front.
//!
//! Schema mirrored by both implementations:
//! - `players(id, wallet_address, created_at)`
//! - `game_scores(player_id, score, game_duration, created_at)`
//! - `player_stats(wallet_address, best_score, total_games, average_score, total_score, best_score_at)`

use futures::channel::mpsc::UnboundedReceiver;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub mod memory;
pub mod query;
#[cfg(target_arch = "wasm32")]
pub mod supabase;

pub use memory::MemoryStore;
#[cfg(target_arch = "wasm32")]
pub use supabase::SupabaseStore;

pub type StoreFuture<T> = LocalBoxFuture<'static, Result<T, StoreError>>;

/// Opaque game-session identifier handed to us by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `players` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub wallet_address: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `player_stats` row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub wallet_address: String,
    pub best_score: u64,
    pub total_games: u64,
    pub average_score: f64,
    pub total_score: u64,
    /// When the best score was first reached; orders equal best scores
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_score_at: Option<String>,
}

/// One finished game, as listed in a player's history
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRecord {
    pub score: u64,
    /// Whole seconds
    pub game_duration: Option<u64>,
    pub created_at: Option<String>,
}

/// Totals across every recorded game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameStats {
    pub total_games: u64,
    /// Registered players, with or without a score
    pub total_players: u64,
    /// Mean score, rounded
    pub average_score: u64,
    pub highest_score: u64,
}

impl GameStats {
    /// Aggregate raw scores
    pub fn from_scores(scores: &[u64], total_players: u64) -> Self {
        let total_games = scores.len() as u64;
        let average_score = if scores.is_empty() {
            0
        } else {
            (scores.iter().sum::<u64>() as f64 / total_games as f64).round() as u64
        };
        Self {
            total_games,
            total_players,
            average_score,
            highest_score: scores.iter().copied().max().unwrap_or(0),
        }
    }
}

/// Notification published for every `game_scores` insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreInserted {
    pub wallet_address: String,
    pub score: u64,
}

/// A player's position among everyone with a recorded score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRank {
    /// 1-based
    pub rank: usize,
    pub total_players: usize,
    /// Share of players at or below this rank, rounded
    pub percentile: u32,
}

/// Rank of `wallet` within `standings`, which must already be ordered best first
pub fn rank_of(standings: &[PlayerStats], wallet: &str) -> Option<PlayerRank> {
    let index = standings.iter().position(|s| s.wallet_address == wallet)?;
    let total = standings.len();
    Some(PlayerRank {
        rank: index + 1,
        total_players: total,
        percentile: (((total - index) as f64 / total as f64) * 100.0).round() as u32,
    })
}

pub trait ScoreStore {
    /// Get-or-create the player for a wallet
    fn ensure_player(&self, wallet: &str) -> StoreFuture<Player>;

    /// Count one capture against an active session
    fn record_capture(&self, session: &SessionId) -> StoreFuture<()>;

    /// Close a session; later captures against it fail
    fn end_session(&self, session: &SessionId) -> StoreFuture<()>;

    /// Insert a finished game's score and notify subscribers
    fn record_score(&self, wallet: &str, score: u64, duration_secs: Option<u64>) -> StoreFuture<()>;

    /// Best `limit` players by best score, ties by arrival order
    fn top_players(&self, limit: usize) -> StoreFuture<Vec<PlayerStats>>;

    fn player_rank(&self, wallet: &str) -> StoreFuture<Option<PlayerRank>>;

    /// The `player_stats` row for one wallet; `None` until they have a score
    fn player_stats(&self, wallet: &str) -> StoreFuture<Option<PlayerStats>>;

    /// A player's most recent games, newest first. Unknown wallets have none.
    fn game_history(&self, wallet: &str, limit: usize) -> StoreFuture<Vec<GameRecord>>;

    /// Totals over all games and players
    fn game_stats(&self) -> StoreFuture<GameStats>;

    /// Stream of score-insert notifications
    fn subscribe(&self) -> UnboundedReceiver<ScoreInserted>;
}
