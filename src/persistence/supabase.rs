//! Hosted score store over the Supabase PostgREST API
//!
//! Table reads and inserts go to `/rest/v1/<table>`, session bookkeeping to
//! the `record_capture` and `end_game_session` RPCs. Inserts made through
//! this client are published to local subscribers; the web layer's backup
//! poll picks up everyone else's.
//!
//! Standings rely on the `player_stats` view exposing `best_score_at`, the
//! time each player first reached their best score:
//!
//! ```sql
//! select p.wallet_address,
//!        max(s.score) as best_score,
//!        count(s.id) as total_games,
//!        avg(s.score) as average_score,
//!        sum(s.score) as total_score,
//!        min(s.created_at) filter (where s.score = b.best) as best_score_at
//! from players p
//! join game_scores s on s.player_id = p.id
//! join (select player_id, max(score) as best from game_scores group by player_id) b
//!   on b.player_id = p.id
//! group by p.wallet_address;
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::query;
use super::{
    GameRecord, GameStats, Player, PlayerRank, PlayerStats, ScoreInserted, ScoreStore, SessionId, StoreFuture,
    rank_of,
};
use crate::error::StoreError;


#[derive(Debug)]
struct Endpoint {
    base_url: String,
    anon_key: String,
}

impl Endpoint {
    fn url(&self, path: &str) -> String {
        format!("{}/rest/v1/{path}", self.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .header("Authorization", &format!("Bearer {}", self.anon_key))
            .header("X-Client-Info", "kiss-cam")
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, StoreError> {
        let resp = self
            .authorize(Request::get(&self.url(path)))
            .send()
            .await
            .map_err(network)?;
        decode(check(resp)?).await
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B, prefer: &str) -> Result<Response, StoreError> {
        let resp = self
            .authorize(Request::post(&self.url(path)))
            .header("Prefer", prefer)
            .json(body)
            .map_err(|e| StoreError::Decode(e.to_string()))?
            .send()
            .await
            .map_err(network)?;
        check(resp)
    }

    async fn ensure_player(&self, wallet: &str) -> Result<Player, StoreError> {
        if let Some(player) = self.find_player(wallet).await? {
            return Ok(player);
        }

        #[derive(Serialize)]
        struct NewPlayer<'a> {
            wallet_address: &'a str,
        }
        let resp = self
            .post("players", &NewPlayer { wallet_address: wallet }, "return=representation")
            .await?;
        let created: Vec<Player> = decode(resp).await?;
        log::info!("Created player {wallet}");
        created
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::UnknownPlayer(wallet.to_string()))
    }

    async fn find_player(&self, wallet: &str) -> Result<Option<Player>, StoreError> {
        let rows: Vec<Player> = self
            .get(&query::player(wallet))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn standings(&self, limit: Option<usize>) -> Result<Vec<PlayerStats>, StoreError> {
        self.get(&query::standings(limit)).await
    }
}

fn network(err: gloo_net::Error) -> StoreError {
    log::debug!("Store request failed: {err}");
    StoreError::Unavailable
}

fn check(resp: Response) -> Result<Response, StoreError> {
    if resp.ok() {
        Ok(resp)
    } else {
        Err(StoreError::Http { status: resp.status() })
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, StoreError> {
    resp.json::<T>().await.map_err(|e| StoreError::Decode(e.to_string()))
}

#[derive(Serialize)]
struct SessionArgs<'a> {
    session_uuid: &'a str,
}

#[derive(Clone)]
pub struct SupabaseStore {
    endpoint: Rc<Endpoint>,
    subscribers: Rc<RefCell<Vec<UnboundedSender<ScoreInserted>>>>,
}

impl SupabaseStore {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            endpoint: Rc::new(Endpoint {
                base_url: base_url.into(),
                anon_key: anon_key.into(),
            }),
            subscribers: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl ScoreStore for SupabaseStore {
    fn ensure_player(&self, wallet: &str) -> StoreFuture<Player> {
        let endpoint = self.endpoint.clone();
        let wallet = wallet.to_string();
        async move { endpoint.ensure_player(&wallet).await }.boxed_local()
    }

    fn record_capture(&self, session: &SessionId) -> StoreFuture<()> {
        let endpoint = self.endpoint.clone();
        let session = session.clone();
        async move {
            let args = SessionArgs {
                session_uuid: session.as_str(),
            };
            endpoint.post("rpc/record_capture", &args, "return=minimal").await?;
            Ok(())
        }
        .boxed_local()
    }

    fn end_session(&self, session: &SessionId) -> StoreFuture<()> {
        let endpoint = self.endpoint.clone();
        let session = session.clone();
        async move {
            let args = SessionArgs {
                session_uuid: session.as_str(),
            };
            endpoint.post("rpc/end_game_session", &args, "return=minimal").await?;
            log::info!("Session {session} ended");
            Ok(())
        }
        .boxed_local()
    }

    fn record_score(&self, wallet: &str, score: u64, duration_secs: Option<u64>) -> StoreFuture<()> {
        let endpoint = self.endpoint.clone();
        let subscribers = self.subscribers.clone();
        let wallet = wallet.to_string();
        async move {
            let player = endpoint.ensure_player(&wallet).await?;

            #[derive(Serialize)]
            struct NewScore<'a> {
                player_id: &'a str,
                score: u64,
                game_duration: Option<u64>,
            }
            let row = NewScore {
                player_id: &player.id,
                score,
                game_duration: duration_secs,
            };
            endpoint.post("game_scores", &row, "return=minimal").await?;
            log::info!("Recorded score {score} for {wallet}");

            let event = ScoreInserted {
                wallet_address: wallet,
                score,
            };
            subscribers
                .borrow_mut()
                .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
            Ok(())
        }
        .boxed_local()
    }

    fn top_players(&self, limit: usize) -> StoreFuture<Vec<PlayerStats>> {
        let endpoint = self.endpoint.clone();
        async move { endpoint.standings(Some(limit)).await }.boxed_local()
    }

    fn player_rank(&self, wallet: &str) -> StoreFuture<Option<PlayerRank>> {
        let endpoint = self.endpoint.clone();
        let wallet = wallet.to_string();
        async move { Ok(rank_of(&endpoint.standings(None).await?, &wallet)) }.boxed_local()
    }

    fn player_stats(&self, wallet: &str) -> StoreFuture<Option<PlayerStats>> {
        let endpoint = self.endpoint.clone();
        let wallet = wallet.to_string();
        async move {
            let rows: Vec<PlayerStats> = endpoint
                .get(&query::player_stats(&wallet))
                .await?;
            Ok(rows.into_iter().next())
        }
        .boxed_local()
    }

    fn game_history(&self, wallet: &str, limit: usize) -> StoreFuture<Vec<GameRecord>> {
        let endpoint = self.endpoint.clone();
        let wallet = wallet.to_string();
        async move {
            let Some(player) = endpoint.find_player(&wallet).await? else {
                return Ok(Vec::new());
            };
            endpoint.get(&query::history(&player.id, limit)).await
        }
        .boxed_local()
    }

    fn game_stats(&self) -> StoreFuture<GameStats> {
        let endpoint = self.endpoint.clone();
        async move {
            #[derive(serde::Deserialize)]
            struct ScoreOnly {
                score: u64,
            }
            let scores: Vec<ScoreOnly> = endpoint.get("game_scores?select=score").await?;
            let players: Vec<serde::de::IgnoredAny> = endpoint.get("players?select=id").await?;
            let scores: Vec<u64> = scores.into_iter().map(|s| s.score).collect();
            Ok(GameStats::from_scores(&scores, players.len() as u64))
        }
        .boxed_local()
    }

    fn subscribe(&self) -> UnboundedReceiver<ScoreInserted> {
        let (tx, rx) = mpsc::unbounded();
        self.subscribers.borrow_mut().push(tx);
        rx
    }
}
