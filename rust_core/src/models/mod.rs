// Shared models for the slate projection engine and its consumers
use crate::utils::stats::{round1, round2, round2_opt};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Game State
// ============================================================================

/// Abstract game state reported by the scores feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    Preview,
    Live,
    Final,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Preview => "Preview",
            GameStatus::Live => "Live",
            GameStatus::Final => "Final",
        }
    }

    /// Parse the feed's abstract state, case-insensitively
    pub fn from_abstract(state: &str) -> Option<Self> {
        match state.trim().to_lowercase().as_str() {
            "preview" => Some(GameStatus::Preview),
            "live" => Some(GameStatus::Live),
            "final" => Some(GameStatus::Final),
            _ => None,
        }
    }

    /// Scoreboard ordering: live games first, then upcoming, then finished
    pub fn board_rank(&self) -> u8 {
        match self {
            GameStatus::Live => 0,
            GameStatus::Preview => 1,
            GameStatus::Final => 2,
        }
    }
}

// ============================================================================
// Projection
// ============================================================================

/// Market consensus for one game in one computation cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameConsensus {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub commence_time: DateTime<Utc>,
    pub status: GameStatus,
    /// Number of quotes that fed the consensus
    pub bookmakers_count: usize,
    /// True when stale pregame quotes were replaced by live-fresh ones
    pub live_only: bool,
    #[serde(serialize_with = "round2")]
    pub point_raw: f64,
    #[serde(serialize_with = "round2")]
    pub point_adjusted: f64,
    #[serde(serialize_with = "round2")]
    pub dispersion: f64,
    pub runs_so_far: u32,
    /// Clamped at zero; this is what feeds the projected finish
    #[serde(serialize_with = "round2")]
    pub expected_remaining: f64,
    /// Diagnostic only, negative once the market total has been exceeded
    #[serde(serialize_with = "round2")]
    pub expected_remaining_raw: f64,
}

/// One-dispersion-unit interval around the slate total
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    #[serde(serialize_with = "round1")]
    pub low: f64,
    #[serde(serialize_with = "round1")]
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SlateDiag {
    pub games_preview: usize,
    pub games_live: usize,
    pub games_final: usize,
    /// Same-day events dropped for lack of any quote
    pub excluded_events: usize,
}

/// Parameters the snapshot was computed with, echoed for consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigEcho {
    pub timezone: String,
    pub window_start_hour: u32,
    pub window_end_hour: u32,
    pub cache_minutes: i64,
    pub live_recent_minutes: i64,
    pub juice_to_runs: f64,
}

/// Slate-wide projection, replaced wholesale on every committed recompute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionSnapshot {
    pub as_of_date: NaiveDate,
    #[serde(serialize_with = "round1")]
    pub total_projected: f64,
    #[serde(serialize_with = "round1")]
    pub total_dispersion: f64,
    pub band: Band,
    pub per_game: Vec<GameConsensus>,
    pub game_count_used: usize,
    pub actual_runs_so_far: u32,
    #[serde(serialize_with = "round1")]
    pub remaining_expected: f64,
    #[serde(serialize_with = "round1")]
    pub projected_finish: f64,
    pub computed_at_utc: DateTime<Utc>,
    pub diag: SlateDiag,
    pub config: ConfigEcho,
    pub source: String,
}

// ============================================================================
// Scoreboard & run tally
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreboardItem {
    pub id: String,
    pub away: String,
    pub away_runs: u32,
    pub home: String,
    pub home_runs: u32,
    pub state: GameStatus,
    /// Human-readable situation, e.g. "Top 5, 1 out" or "F/10"
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scoreboard {
    pub date: NaiveDate,
    pub items: Vec<ScoreboardItem>,
    pub last_update_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunTally {
    pub date: NaiveDate,
    pub games_count: usize,
    pub total_runs: u32,
    pub last_update_utc: DateTime<Utc>,
}

// ============================================================================
// Two-number summary (actual runs + projected finish)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwoNumberGame {
    pub game_id: String,
    pub state: GameStatus,
    pub runs_so_far: u32,
    #[serde(serialize_with = "round2")]
    pub consensus_total: f64,
    /// 50% crossing of the alternate-totals ladder, when one exists
    #[serde(serialize_with = "round2_opt")]
    pub alt_median: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwoNumbers {
    pub total_runs_scored: u32,
    #[serde(serialize_with = "round1")]
    pub projected_slate_finish: f64,
    pub games: Vec<TwoNumberGame>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(GameStatus::from_abstract("Live"), Some(GameStatus::Live));
        assert_eq!(GameStatus::from_abstract(" final "), Some(GameStatus::Final));
        assert_eq!(GameStatus::from_abstract("Postponed"), None);
    }

    #[test]
    fn test_board_rank_orders_live_first() {
        let mut states = vec![GameStatus::Final, GameStatus::Preview, GameStatus::Live];
        states.sort_by_key(|s| s.board_rank());
        assert_eq!(
            states,
            vec![GameStatus::Live, GameStatus::Preview, GameStatus::Final]
        );
    }

    #[test]
    fn test_band_serializes_one_decimal() {
        let band = Band {
            low: 70.04999,
            high: 75.96,
        };
        let json = serde_json::to_value(band).unwrap();
        assert_eq!(json["low"], 70.0);
        assert_eq!(json["high"], 76.0);
    }
}
