//! Kiss Cam entry point
//!
//! In the browser this only installs logging; the page then constructs a
//! `GameApi`. Natively it plays a short scripted game against the in-memory
//! store and prints the resulting leaderboard.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("Logger already set: {e}").into());
    }
    log::info!("Kiss Cam starting...");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::cell::RefCell;
    use std::rc::Rc;

    use futures::FutureExt;
    use futures::executor::{LocalPool, block_on};
    use futures::future::LocalBoxFuture;
    use glam::Vec2;

    use kiss_cam::consts::FRAME_MS;
    use kiss_cam::error::EligibilityError;
    use kiss_cam::persistence::{MemoryStore, ScoreStore, SessionId};
    use kiss_cam::session::leaderboard::{self, Leaderboard};
    use kiss_cam::session::{
        BalanceOracle, EligibilityGate, EligibilityPolicy, GameHost, ScoreBridge, WalletProvider,
    };
    use kiss_cam::sim::{CaptureOutcome, TickInput};
    use kiss_cam::PlayfieldConfig;

    const DEMO_WALLET: &str = "DemoWa11et1111111111111111111111111111111111";

    /// Stands in for the browser wallet and the balance RPC
    struct DemoWallet;

    impl WalletProvider for DemoWallet {
        fn connect(&self) -> LocalBoxFuture<'static, Result<String, EligibilityError>> {
            async { Ok(DEMO_WALLET.to_string()) }.boxed_local()
        }

        fn disconnect(&self) -> LocalBoxFuture<'static, Result<(), EligibilityError>> {
            async { Ok(()) }.boxed_local()
        }
    }

    impl BalanceOracle for DemoWallet {
        fn balance_sol(&self, _wallet: &str) -> LocalBoxFuture<'static, Result<f64, EligibilityError>> {
            async { Ok(0.5) }.boxed_local()
        }
    }

    /// Walk the viewfinder onto the target with the arrow-key nudge, then
    /// capture. Gives up after `max_frames`.
    fn hunt(host: &mut GameHost, now: &mut f64, max_frames: usize) -> bool {
        for _ in 0..max_frames {
            let Some(game) = host.game() else {
                return false;
            };
            let delta = game.state.target_rect().center() - game.state.viewfinder_rect().center();
            let contained = game.state.viewfinder_rect().contains(&game.state.target_rect());

            let step = |d: f32| if d.abs() > 3.0 { d.signum() } else { 0.0 };
            let input = TickInput {
                nudge: Vec2::new(step(delta.x), step(delta.y)),
                capture: contained,
                ..Default::default()
            };
            *now += FRAME_MS;
            if let Some(CaptureOutcome::Captured { score }) = host.tick(&input, *now) {
                log::info!("Captured at {:.0} ms, score {score}", *now);
                return true;
            }
        }
        false
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let store = MemoryStore::new();
        let mut pool = LocalPool::new();

        let gate = Rc::new(EligibilityGate::new(
            Rc::new(DemoWallet),
            Rc::new(DemoWallet),
            Rc::new(store.clone()),
            EligibilityPolicy::default(),
        ));
        let player = block_on(gate.connect())?;
        log::info!("Player {} eligible={}", player.wallet_address, gate.is_eligible());

        let bridge = ScoreBridge::new(Rc::new(store.clone()), Rc::new(pool.spawner()));
        let mut host = GameHost::new(PlayfieldConfig::default(), bridge, gate);

        let mut now = kiss_cam::now_ms();
        host.initialize_with_session(SessionId::new("native-demo"), 42, now)?;

        let mut captures = 0;
        for _ in 0..3 {
            if !hunt(&mut host, &mut now, 2000) {
                log::warn!("Target not reached");
                break;
            }
            captures += 1;
            // Let the relocation land
            for _ in 0..40 {
                now += FRAME_MS;
                host.tick(&TickInput::default(), now);
            }
            pool.run_until_stalled();
        }

        let score = host.end_game(now)?;
        pool.run_until_stalled();
        println!("Final score: {score} ({captures} captures)");

        let board = RefCell::new(Leaderboard::new());
        block_on(leaderboard::refresh(&board, &store));
        for row in board.borrow().rows() {
            println!("{} {} {}", row.medal, row.label, row.best_score);
        }
        if let Some(rank) = block_on(store.player_rank(DEMO_WALLET))? {
            println!("Rank {}/{} (top {}%)", rank.rank, rank.total_players, rank.percentile);
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Kiss Cam (native) starting...");
    log::info!("Native mode runs a scripted demo - serve the wasm build for the real game");

    if let Err(e) = demo::run() {
        log::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}
