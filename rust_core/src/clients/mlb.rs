use crate::circuit_breaker::{BreakerConfig, BreakerState, FeedCircuitBreaker};
use crate::error::{Feed, ProjectionError, Result};
use crate::feeds::{ScoreGame, ScoresFeed};
use crate::models::GameStatus;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const MLB_API_BASE: &str = "https://statsapi.mlb.com";

const SCHEDULE_HYDRATE: &str = "linescore,team,game,flags,status";

// ============================================================================
// Schedule wire format (only the fields we read)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct ScheduleResponse {
    #[serde(default)]
    dates: Vec<ScheduleDate>,
}

#[derive(Debug, Default, Deserialize)]
struct ScheduleDate {
    #[serde(default)]
    games: Vec<ScheduleGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleGame {
    game_pk: u64,
    #[serde(default)]
    teams: ScheduleTeams,
    #[serde(default)]
    status: ScheduleStatus,
    linescore: Option<Linescore>,
}

#[derive(Debug, Default, Deserialize)]
struct ScheduleTeams {
    #[serde(default)]
    home: ScheduleSide,
    #[serde(default)]
    away: ScheduleSide,
}

#[derive(Debug, Default, Deserialize)]
struct ScheduleSide {
    #[serde(default)]
    team: TeamRef,
}

#[derive(Debug, Default, Deserialize)]
struct TeamRef {
    #[serde(default)]
    name: String,
    abbreviation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleStatus {
    abstract_game_state: Option<String>,
    detailed_state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Linescore {
    current_inning: Option<u8>,
    current_inning_ordinal: Option<String>,
    is_top_inning: Option<bool>,
    outs: Option<u8>,
    #[serde(default)]
    teams: LinescoreTeams,
}

#[derive(Debug, Default, Deserialize)]
struct LinescoreTeams {
    #[serde(default)]
    home: LinescoreSide,
    #[serde(default)]
    away: LinescoreSide,
}

#[derive(Debug, Default, Deserialize)]
struct LinescoreSide {
    runs: Option<u32>,
}

impl ScheduleGame {
    fn into_score_game(self) -> ScoreGame {
        let abstract_state = self.status.abstract_game_state.unwrap_or_default();
        // Postponed/suspended games surface as "Other"; they have not been
        // played, so they sit with the scheduled games
        let status = GameStatus::from_abstract(&abstract_state).unwrap_or_else(|| {
            debug!(
                "Game {} has unrecognized state '{}', treating as Preview",
                self.game_pk, abstract_state
            );
            GameStatus::Preview
        });
        let linescore = self.linescore.unwrap_or_default();

        ScoreGame {
            game_id: self.game_pk.to_string(),
            home_name: self.teams.home.team.name,
            home_abbr: self.teams.home.team.abbreviation,
            away_name: self.teams.away.team.name,
            away_abbr: self.teams.away.team.abbreviation,
            status,
            detailed_state: self.status.detailed_state,
            home_runs: linescore.teams.home.runs.unwrap_or(0),
            away_runs: linescore.teams.away.runs.unwrap_or(0),
            current_inning: linescore.current_inning,
            inning_ordinal: linescore.current_inning_ordinal,
            is_top_inning: linescore.is_top_inning,
            outs: linescore.outs,
        }
    }
}

/// Decode a schedule body into the day's games (first date block only)
pub fn parse_schedule(body: &str) -> Result<Vec<ScoreGame>> {
    let schedule: ScheduleResponse = serde_json::from_str(body)
        .map_err(|e| ProjectionError::upstream(Feed::Scores, format!("MLB decode error: {}", e)))?;

    Ok(schedule
        .dates
        .into_iter()
        .next()
        .map(|d| d.games.into_iter().map(ScheduleGame::into_score_game).collect())
        .unwrap_or_default())
}

/// MLB Stats API schedule client
#[derive(Clone)]
pub struct MlbStatsClient {
    client: Client,
    base_url: String,
    circuit_breaker: Arc<FeedCircuitBreaker>,
}

impl std::fmt::Debug for MlbStatsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MlbStatsClient")
            .field("base_url", &self.base_url)
            .field("circuit_breaker_state", &self.circuit_breaker.state())
            .finish()
    }
}

impl MlbStatsClient {
    pub fn new() -> Self {
        Self::with_config(MLB_API_BASE, Duration::from_secs(10), BreakerConfig::default())
    }

    pub fn with_config(base_url: &str, timeout: Duration, breaker: BreakerConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(super::USER_AGENT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            circuit_breaker: Arc::new(FeedCircuitBreaker::new(Feed::Scores, breaker)),
        }
    }

    pub fn circuit_state(&self) -> BreakerState {
        self.circuit_breaker.state()
    }

    pub fn reset_circuit_breaker(&self) {
        self.circuit_breaker.reset();
    }

    async fn fetch_schedule_internal(&self, date: NaiveDate) -> Result<Vec<ScoreGame>> {
        let url = format!("{}/api/v1/schedule", self.base_url);
        let date = date.format("%Y-%m-%d").to_string();

        debug!("Fetching MLB schedule for {}", date);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("sportId", "1"),
                ("date", date.as_str()),
                ("hydrate", SCHEDULE_HYDRATE),
            ])
            .send()
            .await
            .map_err(|e| ProjectionError::upstream(Feed::Scores, format!("MLB request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProjectionError::upstream(
                Feed::Scores,
                format!("MLB upstream {}", status.as_u16()),
            ));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ProjectionError::upstream(Feed::Scores, format!("MLB body read failed: {}", e)))?;
        parse_schedule(&body)
    }
}

impl Default for MlbStatsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScoresFeed for MlbStatsClient {
    async fn fetch_scores(&self, date: NaiveDate) -> Result<Vec<ScoreGame>> {
        self.circuit_breaker
            .call(self.fetch_schedule_internal(date))
            .await
    }

    fn feed_name(&self) -> &str {
        "mlb_stats"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEDULE: &str = r#"{
        "totalGames": 3,
        "dates": [{
            "date": "2025-06-01",
            "games": [
                {
                    "gamePk": 777001,
                    "teams": {
                        "home": {"team": {"id": 119, "name": "Los Angeles Dodgers", "abbreviation": "LAD"}},
                        "away": {"team": {"id": 135, "name": "San Diego Padres", "abbreviation": "SD"}}
                    },
                    "status": {"abstractGameState": "Live", "detailedState": "In Progress"},
                    "linescore": {
                        "currentInning": 6,
                        "currentInningOrdinal": "6th",
                        "isTopInning": false,
                        "outs": 2,
                        "teams": {"home": {"runs": 4, "hits": 7}, "away": {"runs": 3}}
                    }
                },
                {
                    "gamePk": 777002,
                    "teams": {
                        "home": {"team": {"name": "Chicago Cubs"}},
                        "away": {"team": {"name": "St. Louis Cardinals"}}
                    },
                    "status": {"abstractGameState": "Preview", "detailedState": "Scheduled"}
                },
                {
                    "gamePk": 777003,
                    "teams": {
                        "home": {"team": {"name": "Boston Red Sox", "abbreviation": "BOS"}},
                        "away": {"team": {"name": "New York Yankees", "abbreviation": "NYY"}}
                    },
                    "status": {"abstractGameState": "Other", "detailedState": "Postponed"},
                    "linescore": {"teams": {"home": {}, "away": {}}}
                }
            ]
        }]
    }"#;

    #[test]
    fn test_parse_schedule() {
        let games = parse_schedule(SCHEDULE).unwrap();
        assert_eq!(games.len(), 3);

        let live = &games[0];
        assert_eq!(live.game_id, "777001");
        assert_eq!(live.home_abbr.as_deref(), Some("LAD"));
        assert_eq!(live.status, GameStatus::Live);
        assert_eq!(live.runs_now(), 7);
        assert_eq!(live.current_inning, Some(6));
        assert_eq!(live.is_top_inning, Some(false));
        assert_eq!(live.outs, Some(2));

        // No linescore before first pitch
        let preview = &games[1];
        assert_eq!(preview.status, GameStatus::Preview);
        assert_eq!(preview.runs_now(), 0);
        assert!(preview.home_abbr.is_none());

        let postponed = &games[2];
        assert_eq!(postponed.status, GameStatus::Preview);
        assert_eq!(postponed.detailed_state.as_deref(), Some("Postponed"));
    }

    #[test]
    fn test_parse_empty_schedule() {
        assert!(parse_schedule(r#"{"dates": []}"#).unwrap().is_empty());
        assert!(parse_schedule("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_garbage_is_upstream_error() {
        let err = parse_schedule("<html>").unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::UpstreamUnavailable { feed: Feed::Scores, .. }
        ));
    }

    #[tokio::test]
    #[ignore] // Requires network
    async fn test_fetch_live_schedule() {
        let client = MlbStatsClient::new();
        let date = chrono::Utc::now().date_naive();
        let games = client.fetch_scores(date).await.unwrap();
        println!("{} games on {}", games.len(), date);
    }
}
