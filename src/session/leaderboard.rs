//! Top-players leaderboard
//!
//! Refreshed from the score store on every insert notification, plus a slow
//! backup poll. The last good snapshot is kept in LocalStorage and shown
//! whenever the store can't be reached.

use std::cell::RefCell;

use futures::StreamExt;
use futures::channel::mpsc::UnboundedReceiver;
use serde::{Deserialize, Serialize};

use crate::persistence::{PlayerStats, ScoreInserted, ScoreStore};
use crate::platform::storage;

/// Number of players shown
pub const MAX_PLAYERS: usize = 10;

/// Backup refresh interval in case insert notifications are missed
pub const BACKUP_REFRESH_MS: u32 = 5 * 60 * 1000;

/// One display line
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    /// 1-based
    pub position: usize,
    pub medal: String,
    pub label: String,
    pub best_score: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<PlayerStats>,
    /// Last refresh failed; `entries` is the cached snapshot
    #[serde(skip)]
    pub stale: bool,
}

impl Leaderboard {
    /// LocalStorage key for the snapshot
    const STORAGE_KEY: &'static str = "kiss_cam_leaderboard";

    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the standings with a fresh store result (already ordered)
    pub fn apply(&mut self, mut standings: Vec<PlayerStats>) {
        standings.truncate(MAX_PLAYERS);
        self.entries = standings;
        self.stale = false;
        self.save();
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.best_score)
    }

    pub fn rows(&self) -> Vec<LeaderboardRow> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| LeaderboardRow {
                position: i + 1,
                medal: medal(i + 1),
                label: short_wallet(&e.wallet_address),
                best_score: e.best_score,
            })
            .collect()
    }

    /// The cached snapshot, marked stale until the first refresh
    pub fn load() -> Self {
        match storage::load_json::<Leaderboard>(Self::STORAGE_KEY) {
            Some(board) => {
                log::info!("Loaded cached leaderboard ({} players)", board.entries.len());
                Self { stale: true, ..board }
            }
            None => Self::new(),
        }
    }

    pub fn save(&self) {
        storage::save_json(Self::STORAGE_KEY, self);
    }
}

/// `abcdef...wxyz` for addresses of 10+ chars, unchanged otherwise
pub fn short_wallet(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() < 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

pub fn medal(position: usize) -> String {
    match position {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        n => format!("#{n}"),
    }
}

/// Pull fresh standings. On failure the previous entries stay and the board
/// is marked stale. Returns whether the refresh succeeded.
pub async fn refresh(board: &RefCell<Leaderboard>, store: &dyn ScoreStore) -> bool {
    match store.top_players(MAX_PLAYERS).await {
        Ok(standings) => {
            log::debug!("Leaderboard refreshed ({} players)", standings.len());
            board.borrow_mut().apply(standings);
            true
        }
        Err(e) => {
            log::warn!("Leaderboard refresh failed: {e}");
            board.borrow_mut().mark_stale();
            false
        }
    }
}

/// Refresh once, then again on every insert until the feed closes.
/// `on_update` runs after each refresh attempt.
pub async fn follow_inserts(
    board: &RefCell<Leaderboard>,
    store: &dyn ScoreStore,
    mut inserts: UnboundedReceiver<ScoreInserted>,
    mut on_update: impl FnMut(&Leaderboard),
) {
    refresh(board, store).await;
    on_update(&board.borrow());

    while let Some(event) = inserts.next().await {
        log::debug!("New score {} from {}", event.score, short_wallet(&event.wallet_address));
        refresh(board, store).await;
        on_update(&board.borrow());
    }
}
