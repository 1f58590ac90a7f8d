//! PostgREST paths used by the hosted store

pub const STATS_COLUMNS: &str = "wallet_address,best_score,total_games,average_score,total_score,best_score_at";

pub fn player(wallet: &str) -> String {
    format!("players?select=*&wallet_address=eq.{wallet}")
}

/// Best first; equal bests by who reached them first
pub fn standings(limit: Option<usize>) -> String {
    let mut path = format!("player_stats?select={STATS_COLUMNS}&order=best_score.desc,best_score_at.asc.nullslast");
    if let Some(limit) = limit {
        path.push_str(&format!("&limit={limit}"));
    }
    path
}

pub fn player_stats(wallet: &str) -> String {
    format!("player_stats?select={STATS_COLUMNS}&wallet_address=eq.{wallet}")
}

/// Newest first
pub fn history(player_id: &str, limit: usize) -> String {
    format!("game_scores?select=score,game_duration,created_at&player_id=eq.{player_id}&order=created_at.desc&limit={limit}")
}
