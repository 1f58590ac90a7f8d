//! Browser entry points
//!
//! `GameApi` is what the page holds: it owns the game host, the Canvas2D
//! renderer, the wallet gate and the leaderboard feed. The animation loop
//! reschedules itself only while a game is running, so `endGame` is enough
//! to stop it; the pending capture timers are dropped with it.

use std::cell::RefCell;
use std::rc::Rc;

use futures::StreamExt;
use glam::Vec2;
use gloo_timers::callback::Timeout;
use gloo_timers::future::TimeoutFuture;
use js_sys::Function;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::{Document, HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent};

use super::input::{HeldKeys, KeyAction, client_to_canvas, key_action};
use super::wallet::{InjectedWallet, RpcBalance, injected_provider};
use crate::config::PlayfieldConfig;
use crate::persistence::{PlayerStats, ScoreStore, SessionId, SupabaseStore};
use crate::renderer::CanvasRenderer;
use crate::session::leaderboard::{self, BACKUP_REFRESH_MS, Leaderboard};
use crate::session::{BrowserSpawner, EligibilityGate, EligibilityPolicy, GameHost, ScoreBridge};
use crate::settings::Settings;
use crate::sim::{CaptureOutcome, GameSession, TickInput};

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Plain JS object from any serializable value
fn to_js_value<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value).map_err(to_js)?;
    js_sys::JSON::parse(&json)
}

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

struct WebGame {
    host: GameHost,
    renderer: CanvasRenderer,
    held: HeldKeys,
    settings: Settings,
    /// Only the held-key nudge; pointer and capture apply on the event
    input: TickInput,
    /// Wake-up for the next capture deadline, keyed by that deadline
    timer: Option<(f64, Timeout)>,
    loop_running: bool,
}

impl WebGame {
    fn frame(&mut self, now_ms: f64) {
        self.input.nudge = self.held.direction();
        self.host.tick(&self.input, now_ms);

        if let Some(game) = self.host.game() {
            if let Err(e) = self.renderer.render(game, now_ms) {
                log::warn!("Render error: {e:?}");
            }
        }
        self.update_hud();
    }

    /// Capture now, against the frame the player is looking at
    fn capture(&mut self) {
        if let Some(CaptureOutcome::Captured { score }) = self.host.capture(crate::now_ms()) {
            log::debug!("Captured, score {score}");
            self.update_hud();
        }
    }

    fn update_hud(&self) {
        let Ok(document) = document() else {
            return;
        };
        if let Some(el) = document.get_element_by_id("score") {
            let score = self.host.game().map_or(0, GameSession::score);
            el.set_text_content(Some(&format!("EXPOSED: {score}")));
        }
    }

    fn update_music_display(&self) {
        let Ok(document) = document() else {
            return;
        };
        let Some(el) = document
            .get_element_by_id("musicToggle")
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let (label, color) = self.settings.music_label();
        el.set_text_content(Some(label));
        let _ = el.style().set_property("color", color);
    }

    fn toggle_music(&mut self) {
        self.settings.toggle_music();
        self.update_music_display();
    }
}

fn request_animation_frame(game: Rc<RefCell<WebGame>>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let closure = Closure::once(move |_time: f64| {
        game_loop(game);
    });
    window.request_animation_frame(closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn game_loop(game: Rc<RefCell<WebGame>>) {
    let running = {
        let mut g = game.borrow_mut();
        g.frame(crate::now_ms());
        g.loop_running = g.host.is_running();
        g.loop_running
    };

    schedule_timer(&game);
    if running {
        if let Err(e) = request_animation_frame(game) {
            log::error!("Could not schedule frame: {e:?}");
        }
    } else {
        log::info!("Animation loop stopped");
    }
}

/// Keep one timeout armed for the session's next deadline so captures
/// resolve on time even when frames are throttled
fn schedule_timer(game: &Rc<RefCell<WebGame>>) {
    let mut g = game.borrow_mut();
    let deadline = g.host.game().and_then(GameSession::next_deadline);
    match deadline {
        None => g.timer = None,
        Some(at) if g.timer.as_ref().is_some_and(|(armed, _)| *armed == at) => {}
        Some(at) => {
            let delay_ms = (at - crate::now_ms()).max(0.0).ceil() as u32;
            let weak = Rc::downgrade(game);
            let timeout = Timeout::new(delay_ms, move || {
                if let Some(game) = weak.upgrade() {
                    if let Some(session) = game.borrow_mut().host.game_mut() {
                        session.advance_timers(crate::now_ms());
                    }
                }
            });
            g.timer = Some((at, timeout));
        }
    }
}

fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<WebGame>>) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

    // Pointer position, mapped into canvas units
    {
        let game = game.clone();
        let canvas_clone = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let rect = canvas_clone.get_bounding_client_rect();
            let point = client_to_canvas(
                Vec2::new(event.client_x() as f32, event.client_y() as f32),
                Vec2::new(rect.left() as f32, rect.top() as f32),
                Vec2::new(rect.width() as f32, rect.height() as f32),
                Vec2::new(canvas_clone.width() as f32, canvas_clone.height() as f32),
            );
            game.borrow_mut().host.pointer_moved(point.x, point.y);
        });
        canvas.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Click to capture
    {
        let game = game.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            game.borrow_mut().capture();
        });
        canvas.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Keyboard
    {
        let game = game.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let key = event.key();
            let mut g = game.borrow_mut();
            match key_action(&key) {
                Some(KeyAction::Capture) => {
                    if g.host.is_running() {
                        event.prevent_default();
                    }
                    g.capture();
                }
                Some(KeyAction::ToggleMusic) => g.toggle_music(),
                Some(KeyAction::Move) => {
                    if g.host.is_running() {
                        event.prevent_default();
                    }
                    g.held.press(&key);
                }
                None => {}
            }
        });
        window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            game.borrow_mut().held.release(&event.key());
        });
        window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    Ok(())
}

fn setup_music_toggle(game: Rc<RefCell<WebGame>>) -> Result<(), JsValue> {
    let Some(el) = document()?.get_element_by_id("musicToggle") else {
        return Ok(());
    };
    game.borrow().update_music_display();
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
        game.borrow_mut().toggle_music();
    });
    el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn render_leaderboard(board: &Leaderboard) {
    let Ok(document) = document() else {
        return;
    };
    let Some(list) = document.get_element_by_id("leaderboard-list") else {
        return;
    };
    list.set_text_content(None);
    let _ = list.set_attribute("class", if board.stale { "stale" } else { "" });

    if board.is_empty() {
        list.set_text_content(Some("No scores yet"));
        return;
    }
    for row in board.rows() {
        let Ok(item) = document.create_element("li") else {
            continue;
        };
        item.set_text_content(Some(&format!("{} {} {}", row.medal, row.label, row.best_score)));
        let _ = list.append_child(&item);
    }
}

/// Show the cached snapshot, then follow inserts with a slow backup poll
fn start_leaderboard_feed(board: Rc<RefCell<Leaderboard>>, store: Rc<dyn ScoreStore>) {
    render_leaderboard(&board.borrow());
    {
        let board = board.clone();
        let store = store.clone();
        spawn_local(async move {
            let inserts = store.subscribe();
            leaderboard::follow_inserts(&board, &*store, inserts, render_leaderboard).await;
        });
    }
    spawn_local(async move {
        loop {
            TimeoutFuture::new(BACKUP_REFRESH_MS).await;
            leaderboard::refresh(&board, &*store).await;
            render_leaderboard(&board.borrow());
        }
    });
}

/// Page-facing game API
#[wasm_bindgen]
pub struct GameApi {
    game: Rc<RefCell<WebGame>>,
    gate: Rc<EligibilityGate>,
    board: Rc<RefCell<Leaderboard>>,
    store: Rc<dyn ScoreStore>,
}

#[wasm_bindgen]
impl GameApi {
    /// Bind to the canvas with id `canvas_id` and the hosted score store.
    /// `config_json` overrides the default playfield; an invalid one fails
    /// here, before anything runs.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas_id: &str,
        store_url: &str,
        anon_key: &str,
        config_json: Option<String>,
    ) -> Result<GameApi, JsValue> {
        let config = match config_json {
            Some(json) => PlayfieldConfig::from_json(&json).map_err(to_js)?,
            None => PlayfieldConfig::default(),
        };
        config.validate().map_err(to_js)?;

        let canvas: HtmlCanvasElement = document()?
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str("no canvas"))?
            .dyn_into()?;
        canvas.set_width(config.canvas_width as u32);
        canvas.set_height(config.canvas_height as u32);

        let renderer = CanvasRenderer::new(&canvas)?;
        renderer.load_assets(&config)?;

        let store: Rc<dyn ScoreStore> = Rc::new(SupabaseStore::new(store_url, anon_key));
        let bridge = ScoreBridge::new(store.clone(), Rc::new(BrowserSpawner));
        let gate = Rc::new(EligibilityGate::new(
            Rc::new(InjectedWallet),
            Rc::new(RpcBalance::default()),
            store.clone(),
            EligibilityPolicy::default(),
        ));

        if injected_provider().is_some() {
            let weak = Rc::downgrade(&gate);
            InjectedWallet.on_disconnect(move || {
                if let Some(gate) = weak.upgrade() {
                    gate.handle_disconnect();
                }
            })?;
        } else {
            log::info!("No wallet extension detected");
        }

        let game = Rc::new(RefCell::new(WebGame {
            host: GameHost::new(config, bridge, gate.clone()),
            renderer,
            input: TickInput::default(),
            held: HeldKeys::default(),
            settings: Settings::load(),
            timer: None,
            loop_running: false,
        }));
        setup_input_handlers(&canvas, game.clone())?;
        setup_music_toggle(game.clone())?;
        game.borrow().update_hud();

        let board = Rc::new(RefCell::new(Leaderboard::load()));
        start_leaderboard_feed(board.clone(), store.clone());

        log::info!("Kiss Cam ready");
        Ok(GameApi {
            game,
            gate,
            board,
            store,
        })
    }

    /// Start (or restart) the game bound to a persistence session
    #[wasm_bindgen(js_name = initializeWithSession)]
    pub fn initialize_with_session(&self, session_id: String) -> Result<(), JsValue> {
        let now = crate::now_ms();
        let start_loop = {
            let mut g = self.game.borrow_mut();
            g.host
                .initialize_with_session(SessionId::new(session_id), now as u64, now)
                .map_err(to_js)?;
            g.input = TickInput::default();
            g.held.clear();
            !std::mem::replace(&mut g.loop_running, true)
        };
        if start_loop {
            request_animation_frame(self.game.clone())?;
        }
        Ok(())
    }

    /// Stop the game; resolves the final score
    #[wasm_bindgen(js_name = endGame)]
    pub fn end_game(&self) -> Result<f64, JsValue> {
        let mut g = self.game.borrow_mut();
        let score = g.host.end_game(crate::now_ms()).map_err(to_js)?;
        g.timer = None;
        g.update_hud();
        Ok(score as f64)
    }

    pub fn score(&self) -> f64 {
        self.game.borrow().host.game().map_or(0, GameSession::score) as f64
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.game.borrow().host.is_running()
    }

    /// Resolves to the wallet address
    #[wasm_bindgen(js_name = connectWallet)]
    pub fn connect_wallet(&self) -> js_sys::Promise {
        let gate = self.gate.clone();
        future_to_promise(async move {
            let player = gate.connect().await.map_err(to_js)?;
            Ok(JsValue::from_str(&player.wallet_address))
        })
    }

    #[wasm_bindgen(js_name = disconnectWallet)]
    pub fn disconnect_wallet(&self) -> js_sys::Promise {
        let gate = self.gate.clone();
        future_to_promise(async move {
            gate.disconnect().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Resolves to the new eligibility
    #[wasm_bindgen(js_name = recheckEligibility)]
    pub fn recheck_eligibility(&self) -> js_sys::Promise {
        let gate = self.gate.clone();
        future_to_promise(async move {
            let eligible = gate.recheck().await.map_err(to_js)?;
            Ok(JsValue::from_bool(eligible))
        })
    }

    #[wasm_bindgen(js_name = isEligible)]
    pub fn is_eligible(&self) -> bool {
        self.gate.is_eligible()
    }

    #[wasm_bindgen(js_name = walletAddress)]
    pub fn wallet_address(&self) -> Option<String> {
        self.gate.wallet_address()
    }

    /// `callback(walletAddress | null, eligible)` on every user change
    #[wasm_bindgen(js_name = onUserChange)]
    pub fn on_user_change(&self, callback: Function) {
        let mut events = self.gate.subscribe();
        spawn_local(async move {
            while let Some(event) = events.next().await {
                let wallet = event
                    .user
                    .map_or(JsValue::NULL, |u| JsValue::from_str(&u.wallet_address));
                if let Err(e) = callback.call2(&JsValue::NULL, &wallet, &JsValue::from_bool(event.eligible)) {
                    log::warn!("User change callback failed: {e:?}");
                }
            }
        });
    }

    /// Current standings as JSON
    #[wasm_bindgen(js_name = leaderboardJson)]
    pub fn leaderboard_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&*self.board.borrow()).map_err(to_js)
    }

    /// Resolves to whether the refresh reached the store
    #[wasm_bindgen(js_name = refreshLeaderboard)]
    pub fn refresh_leaderboard(&self) -> js_sys::Promise {
        let board = self.board.clone();
        let store = self.store.clone();
        future_to_promise(async move {
            let ok = leaderboard::refresh(&board, &*store).await;
            render_leaderboard(&board.borrow());
            Ok(JsValue::from_bool(ok))
        })
    }

    /// Resolves to the player's stats row, zeroed until they have a score
    #[wasm_bindgen(js_name = playerStats)]
    pub fn player_stats(&self, wallet: String) -> js_sys::Promise {
        let store = self.store.clone();
        future_to_promise(async move {
            let stats = store.player_stats(&wallet).await.map_err(to_js)?;
            let stats = stats.unwrap_or_else(|| PlayerStats {
                wallet_address: wallet,
                ..Default::default()
            });
            to_js_value(&stats)
        })
    }

    /// Resolves to the player's latest games, newest first
    #[wasm_bindgen(js_name = gameHistory)]
    pub fn game_history(&self, wallet: String, limit: Option<u32>) -> js_sys::Promise {
        let store = self.store.clone();
        let limit = limit.map_or(10, |l| l as usize);
        future_to_promise(async move {
            let history = store.game_history(&wallet, limit).await.map_err(to_js)?;
            to_js_value(&history)
        })
    }

    /// Resolves to the totals across every player
    #[wasm_bindgen(js_name = gameStats)]
    pub fn game_stats(&self) -> js_sys::Promise {
        let store = self.store.clone();
        future_to_promise(async move {
            let stats = store.game_stats().await.map_err(to_js)?;
            to_js_value(&stats)
        })
    }

    /// Resolves to `{rank, total_players, percentile}` or null when unranked
    #[wasm_bindgen(js_name = playerRank)]
    pub fn player_rank(&self, wallet: String) -> js_sys::Promise {
        let store = self.store.clone();
        future_to_promise(async move {
            match store.player_rank(&wallet).await.map_err(to_js)? {
                Some(rank) => to_js_value(&rank),
                None => Ok(JsValue::NULL),
            }
        })
    }
}
