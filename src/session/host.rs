//! Host-facing session API
//!
//! The page starts a game with `initialize_with_session` once the player is
//! eligible and ends it with `end_game`, which hands back the final score and
//! queues the final persistence calls.

use std::rc::Rc;

use crate::config::PlayfieldConfig;
use crate::error::GameError;
use crate::persistence::SessionId;
use crate::sim::{CaptureOutcome, GameSession, TickInput, tick};

use super::bridge::ScoreBridge;
use super::eligibility::EligibilityGate;

/// Who may start a game, and under which wallet
pub trait PlayGate {
    fn can_play(&self) -> bool;
    fn wallet_address(&self) -> Option<String>;
}

impl PlayGate for EligibilityGate {
    fn can_play(&self) -> bool {
        self.is_eligible()
    }

    fn wallet_address(&self) -> Option<String> {
        EligibilityGate::wallet_address(self)
    }
}

pub struct GameHost {
    config: PlayfieldConfig,
    bridge: ScoreBridge,
    gate: Rc<dyn PlayGate>,
    game: Option<GameSession>,
    started_at_ms: f64,
    /// Wallet the running game was started under
    wallet: Option<String>,
}

impl GameHost {
    pub fn new(config: PlayfieldConfig, bridge: ScoreBridge, gate: Rc<dyn PlayGate>) -> Self {
        Self {
            config,
            bridge,
            gate,
            game: None,
            started_at_ms: 0.0,
            wallet: None,
        }
    }

    pub fn bridge(&self) -> &ScoreBridge {
        &self.bridge
    }

    pub fn game(&self) -> Option<&GameSession> {
        self.game.as_ref()
    }

    pub fn game_mut(&mut self) -> Option<&mut GameSession> {
        self.game.as_mut()
    }

    pub fn is_running(&self) -> bool {
        self.game.as_ref().is_some_and(GameSession::is_running)
    }

    /// Start a fresh game bound to `session`. A game that is still running
    /// is ended first, exactly as `end_game` would.
    pub fn initialize_with_session(&mut self, session: SessionId, seed: u64, now_ms: f64) -> Result<(), GameError> {
        if !self.gate.can_play() {
            log::warn!("Refusing to start session {session}: player not eligible");
            return Err(GameError::NotEligible);
        }
        if self.is_running() {
            self.end_game(now_ms)?;
        }

        let game = GameSession::new(self.config.clone(), seed, Box::new(self.bridge.clone()))?;
        self.bridge.bind(session.clone());
        self.game = Some(game);
        self.started_at_ms = now_ms;
        self.wallet = self.gate.wallet_address();
        log::info!("Game started for session {session}");
        Ok(())
    }

    /// Stop the game and queue the final score and session close.
    /// Returns the final score.
    pub fn end_game(&mut self, now_ms: f64) -> Result<u64, GameError> {
        let game = self
            .game
            .as_mut()
            .filter(|g| g.is_running())
            .ok_or(GameError::NoActiveSession)?;
        game.stop();
        let score = game.score();

        match self.wallet.take() {
            Some(wallet) if score > 0 => {
                let duration_secs = ((now_ms - self.started_at_ms).max(0.0) / 1000.0).round() as u64;
                self.bridge.record_score(&wallet, score, Some(duration_secs));
            }
            Some(_) => {}
            None if score > 0 => log::warn!("No wallet for final score {score}, not recorded"),
            None => {}
        }
        self.bridge.end_session();
        log::info!("Game ended with score {score}");
        Ok(score)
    }

    /// Pointer moved: the viewfinder follows straight away
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        if let Some(game) = self.game.as_mut().filter(|g| g.is_running()) {
            game.on_pointer_move(x, y);
        }
    }

    /// Capture action, resolved against the current frame
    pub fn capture(&mut self, now_ms: f64) -> Option<CaptureOutcome> {
        Some(self.game.as_mut()?.trigger_capture(now_ms))
    }

    /// Advance the running game by one frame
    pub fn tick(&mut self, input: &TickInput, now_ms: f64) -> Option<CaptureOutcome> {
        tick(self.game.as_mut()?, input, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, ScoreStore};
    use futures::executor::{LocalPool, block_on};
    use glam::Vec2;
    use std::cell::Cell;

    struct TestGate {
        open: Cell<bool>,
        wallet: Option<String>,
    }

    impl PlayGate for TestGate {
        fn can_play(&self) -> bool {
            self.open.get()
        }

        fn wallet_address(&self) -> Option<String> {
            self.wallet.clone()
        }
    }

    fn host(store: &MemoryStore, pool: &LocalPool, gate: TestGate) -> (GameHost, Rc<TestGate>) {
        let gate = Rc::new(gate);
        let bridge = ScoreBridge::new(Rc::new(store.clone()), Rc::new(pool.spawner()));
        let host = GameHost::new(PlayfieldConfig::default(), bridge, gate.clone());
        (host, gate)
    }

    fn open_gate() -> TestGate {
        TestGate {
            open: Cell::new(true),
            wallet: Some("wallet-host-test".into()),
        }
    }

    fn capture_once(host: &mut GameHost, now_ms: f64) {
        host.tick(
            &TickInput {
                pointer: Some(Vec2::new(625.0, 437.0)),
                ..Default::default()
            },
            now_ms,
        );
        if let Some(game) = host.game_mut() {
            game.state.target_pos = Vec2::new(600.0, 430.0);
        }
        let outcome = host.tick(
            &TickInput {
                capture: true,
                ..Default::default()
            },
            now_ms,
        );
        assert_eq!(outcome, Some(CaptureOutcome::Captured { score: 10 }));
    }

    #[test]
    fn test_refuses_when_not_eligible() {
        let store = MemoryStore::new();
        let pool = LocalPool::new();
        let (mut host, gate) = host(
            &store,
            &pool,
            TestGate {
                open: Cell::new(false),
                wallet: None,
            },
        );

        let err = host.initialize_with_session(SessionId::new("s1"), 1, 0.0);
        assert_eq!(err, Err(GameError::NotEligible));
        assert!(host.game().is_none());

        gate.open.set(true);
        assert!(host.initialize_with_session(SessionId::new("s1"), 1, 0.0).is_ok());
        assert!(host.is_running());
    }

    #[test]
    fn test_full_game_round_trip() {
        let store = MemoryStore::new();
        let mut pool = LocalPool::new();
        let (mut host, _) = host(&store, &pool, open_gate());
        let session = SessionId::new("round");

        host.initialize_with_session(session.clone(), 3, 1000.0).unwrap();
        capture_once(&mut host, 1000.0);
        pool.run_until_stalled();
        assert_eq!(store.session(&session).map(|s| s.captures), Some(1));

        let score = host.end_game(31_000.0).unwrap();
        assert_eq!(score, 10);
        assert!(!host.is_running());
        assert_eq!(host.bridge().session(), None);

        pool.run_until_stalled();
        assert_eq!(store.session(&session).map(|s| s.ended), Some(true));
        let top = block_on(store.top_players(10)).unwrap();
        assert_eq!(top[0].wallet_address, "wallet-host-test");
        assert_eq!(top[0].best_score, 10);

        // Started at 1000 ms, ended at 31 000 ms
        let history = block_on(store.game_history("wallet-host-test", 10)).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].score, 10);
        assert_eq!(history[0].game_duration, Some(30));
    }

    #[test]
    fn test_input_applies_without_waiting_for_a_frame() {
        let store = MemoryStore::new();
        let pool = LocalPool::new();
        let (mut host, _) = host(&store, &pool, open_gate());
        assert_eq!(host.capture(0.0), None);

        host.initialize_with_session(SessionId::new("direct"), 1, 0.0).unwrap();
        host.pointer_moved(625.0, 437.0);
        let game = host.game_mut().unwrap();
        assert_eq!(game.state.viewfinder.rect().pos(), Vec2::new(500.0, 343.0));
        game.state.target_pos = Vec2::new(600.0, 430.0);

        assert_eq!(host.capture(5.0), Some(CaptureOutcome::Captured { score: 10 }));
        assert_eq!(host.capture(6.0), Some(CaptureOutcome::Ignored));
        assert!(host.game().unwrap().display.show_capture_message());

        host.end_game(10.0).unwrap();
        host.pointer_moved(0.0, 0.0);
        assert_eq!(host.game().unwrap().state.viewfinder.rect().pos(), Vec2::new(500.0, 343.0));
        assert_eq!(host.capture(20.0), Some(CaptureOutcome::Ignored));
    }

    #[test]
    fn test_zero_score_is_not_recorded() {
        let store = MemoryStore::new();
        let mut pool = LocalPool::new();
        let (mut host, _) = host(&store, &pool, open_gate());

        host.initialize_with_session(SessionId::new("empty"), 1, 0.0).unwrap();
        assert_eq!(host.end_game(5000.0), Ok(0));
        pool.run_until_stalled();
        assert_eq!(store.score_count(), 0);
        assert_eq!(store.session(&SessionId::new("empty")).map(|s| s.ended), Some(true));
    }

    #[test]
    fn test_end_without_game() {
        let store = MemoryStore::new();
        let pool = LocalPool::new();
        let (mut host, _) = host(&store, &pool, open_gate());
        assert_eq!(host.end_game(0.0), Err(GameError::NoActiveSession));

        host.initialize_with_session(SessionId::new("once"), 1, 0.0).unwrap();
        host.end_game(10.0).unwrap();
        assert_eq!(host.end_game(20.0), Err(GameError::NoActiveSession));
        // Stopped games ignore input
        assert_eq!(host.tick(&TickInput::default(), 30.0), None);
    }

    #[test]
    fn test_reinitialize_ends_previous_session() {
        let store = MemoryStore::new();
        let mut pool = LocalPool::new();
        let (mut host, _) = host(&store, &pool, open_gate());

        host.initialize_with_session(SessionId::new("first"), 1, 0.0).unwrap();
        capture_once(&mut host, 0.0);
        host.initialize_with_session(SessionId::new("second"), 2, 2000.0).unwrap();
        pool.run_until_stalled();

        assert_eq!(store.session(&SessionId::new("first")).map(|s| s.ended), Some(true));
        assert_eq!(store.score_count(), 1);
        assert_eq!(host.bridge().session(), Some(SessionId::new("second")));
        assert_eq!(host.game().map(GameSession::score), Some(0));
    }

    #[test]
    fn test_persistence_failure_still_returns_score() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let mut pool = LocalPool::new();
        let (mut host, _) = host(&store, &pool, open_gate());

        host.initialize_with_session(SessionId::new("offline"), 1, 0.0).unwrap();
        capture_once(&mut host, 0.0);
        assert_eq!(host.end_game(1000.0), Ok(10));
        pool.run_until_stalled();
        assert_eq!(store.score_count(), 0);
    }
}
