//! Score/session bridge
//!
//! The only path from gameplay into external I/O. Every call is detached
//! onto a `TaskSpawner` and its result only ever logged, so the render path
//! never waits on the network and never sees a persistence error.

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::persistence::{ScoreStore, SessionId, StoreFuture};
use crate::sim::CaptureHook;

/// Runs detached futures to completion somewhere off the render path
pub trait TaskSpawner {
    fn dispatch(&self, task: LocalBoxFuture<'static, ()>);
}

impl TaskSpawner for futures::executor::LocalSpawner {
    fn dispatch(&self, task: LocalBoxFuture<'static, ()>) {
        use futures::task::LocalSpawnExt;
        if let Err(e) = self.spawn_local(task) {
            log::warn!("Could not spawn store task: {e}");
        }
    }
}

/// Spawns onto the browser microtask queue
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSpawner;

#[cfg(target_arch = "wasm32")]
impl TaskSpawner for BrowserSpawner {
    fn dispatch(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

#[derive(Clone)]
pub struct ScoreBridge {
    store: Rc<dyn ScoreStore>,
    spawner: Rc<dyn TaskSpawner>,
    session: Rc<RefCell<Option<SessionId>>>,
}

impl std::fmt::Debug for ScoreBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreBridge")
            .field("session", &self.session.borrow())
            .finish_non_exhaustive()
    }
}

impl ScoreBridge {
    pub fn new(store: Rc<dyn ScoreStore>, spawner: Rc<dyn TaskSpawner>) -> Self {
        Self {
            store,
            spawner,
            session: Rc::new(RefCell::new(None)),
        }
    }

    pub fn store(&self) -> &Rc<dyn ScoreStore> {
        &self.store
    }

    pub fn spawner(&self) -> &Rc<dyn TaskSpawner> {
        &self.spawner
    }

    /// Attach captures to `session` (replacing any previous one)
    pub fn bind(&self, session: SessionId) {
        *self.session.borrow_mut() = Some(session);
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session.borrow().clone()
    }

    /// Mirror one capture to the store. No-op without a session.
    pub fn record_capture(&self) {
        let Some(session) = self.session() else {
            return;
        };
        self.detach("record capture", self.store.record_capture(&session));
    }

    /// Close the bound session and forget it locally
    pub fn end_session(&self) {
        let Some(session) = self.session.borrow_mut().take() else {
            return;
        };
        self.detach("end session", self.store.end_session(&session));
    }

    pub fn record_score(&self, wallet: &str, score: u64, duration_secs: Option<u64>) {
        self.detach("record score", self.store.record_score(wallet, score, duration_secs));
    }

    fn detach(&self, what: &'static str, call: StoreFuture<()>) {
        self.spawner.dispatch(
            async move {
                if let Err(e) = call.await {
                    log::warn!("Failed to {what}: {e}");
                }
            }
            .boxed_local(),
        );
    }
}

impl CaptureHook for ScoreBridge {
    fn on_capture(&mut self, _score: u64) {
        self.record_capture();
    }
}
