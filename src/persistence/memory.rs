//! In-process score store
//!
//! Used by the native demo and by tests. `set_offline(true)` makes every
//! call fail with `StoreError::Unavailable`, which is how tests exercise
//! the log-and-continue paths.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{
    GameRecord, GameStats, Player, PlayerRank, PlayerStats, ScoreInserted, ScoreStore, SessionId, StoreFuture,
    rank_of,
};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct ScoreRow {
    player_id: String,
    score: u64,
    duration_secs: Option<u64>,
    /// Insertion order, breaks best-score ties
    seq: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionRecord {
    pub captures: u32,
    pub ended: bool,
}

#[derive(Debug, Default)]
struct Inner {
    offline: bool,
    players: Vec<Player>,
    scores: Vec<ScoreRow>,
    sessions: HashMap<SessionId, SessionRecord>,
    subscribers: Vec<UnboundedSender<ScoreInserted>>,
    next_seq: u64,
}

impl Inner {
    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline { Err(StoreError::Unavailable) } else { Ok(()) }
    }

    fn ensure_player(&mut self, wallet: &str) -> Player {
        if let Some(p) = self.players.iter().find(|p| p.wallet_address == wallet) {
            return p.clone();
        }
        let player = Player {
            id: format!("player-{}", self.players.len() + 1),
            wallet_address: wallet.to_string(),
            created_at: None,
        };
        log::info!("Created player {wallet}");
        self.players.push(player.clone());
        player
    }

    /// `player_stats` view, best first, ties by the earlier best
    fn standings(&self) -> Vec<PlayerStats> {
        let mut rows: Vec<(PlayerStats, u64)> = self
            .players
            .iter()
            .filter_map(|player| {
                let games: Vec<&ScoreRow> = self.scores.iter().filter(|s| s.player_id == player.id).collect();
                let best = games.iter().map(|s| s.score).max()?;
                let best_seq = games
                    .iter()
                    .filter(|s| s.score == best)
                    .map(|s| s.seq)
                    .min()
                    .unwrap_or(0);
                let total_score: u64 = games.iter().map(|s| s.score).sum();
                let stats = PlayerStats {
                    wallet_address: player.wallet_address.clone(),
                    best_score: best,
                    total_games: games.len() as u64,
                    average_score: total_score as f64 / games.len() as f64,
                    total_score,
                    best_score_at: None,
                };
                Some((stats, best_seq))
            })
            .collect();

        rows.sort_by(|(a, a_seq), (b, b_seq)| b.best_score.cmp(&a.best_score).then(a_seq.cmp(b_seq)));
        rows.into_iter().map(|(stats, _)| stats).collect()
    }

    /// Newest first
    fn history(&self, wallet: &str, limit: usize) -> Vec<GameRecord> {
        let Some(player) = self.players.iter().find(|p| p.wallet_address == wallet) else {
            return Vec::new();
        };
        let mut rows: Vec<&ScoreRow> = self.scores.iter().filter(|s| s.player_id == player.id).collect();
        rows.sort_by(|a, b| b.seq.cmp(&a.seq));
        rows.into_iter()
            .take(limit)
            .map(|row| GameRecord {
                score: row.score,
                game_duration: row.duration_secs,
                created_at: None,
            })
            .collect()
    }

    fn publish(&mut self, event: ScoreInserted) {
        self.subscribers.retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again)
    pub fn set_offline(&self, offline: bool) {
        self.inner.borrow_mut().offline = offline;
    }

    /// Session bookkeeping, for inspection
    pub fn session(&self, id: &SessionId) -> Option<SessionRecord> {
        self.inner.borrow().sessions.get(id).copied()
    }

    pub fn score_count(&self) -> usize {
        self.inner.borrow().scores.len()
    }

    /// Defer `f` until the returned future is polled, like a network call
    fn call<T: 'static>(
        &self,
        f: impl FnOnce(&mut Inner) -> Result<T, StoreError> + 'static,
    ) -> StoreFuture<T> {
        let inner = self.inner.clone();
        async move {
            let mut inner = inner.borrow_mut();
            inner.check_online()?;
            f(&mut *inner)
        }
        .boxed_local()
    }
}

impl ScoreStore for MemoryStore {
    fn ensure_player(&self, wallet: &str) -> StoreFuture<Player> {
        let wallet = wallet.to_string();
        self.call(move |inner| Ok(inner.ensure_player(&wallet)))
    }

    fn record_capture(&self, session: &SessionId) -> StoreFuture<()> {
        let session = session.clone();
        self.call(move |inner| {
            let record = inner.sessions.entry(session.clone()).or_default();
            if record.ended {
                return Err(StoreError::SessionEnded(session.to_string()));
            }
            record.captures += 1;
            Ok(())
        })
    }

    fn end_session(&self, session: &SessionId) -> StoreFuture<()> {
        let session = session.clone();
        self.call(move |inner| {
            inner.sessions.entry(session).or_default().ended = true;
            Ok(())
        })
    }

    fn record_score(&self, wallet: &str, score: u64, duration_secs: Option<u64>) -> StoreFuture<()> {
        let wallet = wallet.to_string();
        self.call(move |inner| {
            let player = inner.ensure_player(&wallet);
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.scores.push(ScoreRow {
                player_id: player.id,
                score,
                duration_secs,
                seq,
            });
            inner.publish(ScoreInserted {
                wallet_address: wallet,
                score,
            });
            Ok(())
        })
    }

    fn top_players(&self, limit: usize) -> StoreFuture<Vec<PlayerStats>> {
        self.call(move |inner| {
            let mut standings = inner.standings();
            standings.truncate(limit);
            Ok(standings)
        })
    }

    fn player_rank(&self, wallet: &str) -> StoreFuture<Option<PlayerRank>> {
        let wallet = wallet.to_string();
        self.call(move |inner| Ok(rank_of(&inner.standings(), &wallet)))
    }

    fn player_stats(&self, wallet: &str) -> StoreFuture<Option<PlayerStats>> {
        let wallet = wallet.to_string();
        self.call(move |inner| Ok(inner.standings().into_iter().find(|s| s.wallet_address == wallet)))
    }

    fn game_history(&self, wallet: &str, limit: usize) -> StoreFuture<Vec<GameRecord>> {
        let wallet = wallet.to_string();
        self.call(move |inner| Ok(inner.history(&wallet, limit)))
    }

    fn game_stats(&self) -> StoreFuture<GameStats> {
        self.call(|inner| {
            let scores: Vec<u64> = inner.scores.iter().map(|s| s.score).collect();
            Ok(GameStats::from_scores(&scores, inner.players.len() as u64))
        })
    }

    fn subscribe(&self) -> UnboundedReceiver<ScoreInserted> {
        let (tx, rx) = mpsc::unbounded();
        self.inner.borrow_mut().subscribers.push(tx);
        rx
    }
}
