//! Typed boundary schemas for the two upstream feeds.
//!
//! The projection math only ever sees these structs, so upstream JSON drift
//! is absorbed by the clients that build them.

use crate::error::Result;
use crate::models::GameStatus;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Market key for the main game total
pub const MARKET_TOTALS: &str = "totals";
/// Market key for alternate game totals
pub const MARKET_ALTERNATE_TOTALS: &str = "alternate_totals";

// ============================================================================
// Scores feed
// ============================================================================

/// One game of the day as reported by the scores feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreGame {
    pub game_id: String,
    pub home_name: String,
    pub home_abbr: Option<String>,
    pub away_name: String,
    pub away_abbr: Option<String>,
    pub status: GameStatus,
    pub detailed_state: Option<String>,
    pub home_runs: u32,
    pub away_runs: u32,
    pub current_inning: Option<u8>,
    pub inning_ordinal: Option<String>,
    pub is_top_inning: Option<bool>,
    pub outs: Option<u8>,
}

impl ScoreGame {
    /// Combined runs scored so far
    pub fn runs_now(&self) -> u32 {
        self.home_runs + self.away_runs
    }

    /// Abbreviation when known, otherwise the full name
    pub fn home_label(&self) -> &str {
        self.home_abbr.as_deref().unwrap_or(&self.home_name)
    }

    pub fn away_label(&self) -> &str {
        self.away_abbr.as_deref().unwrap_or(&self.away_name)
    }
}

// ============================================================================
// Odds feed
// ============================================================================

/// Single outcome inside a bookmaker market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsOutcome {
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub point: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsMarket {
    pub key: String,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub outcomes: Vec<OddsOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmaker {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub markets: Vec<OddsMarket>,
}

impl Bookmaker {
    pub fn market(&self, key: &str) -> Option<&OddsMarket> {
        self.markets.iter().find(|m| m.key == key)
    }
}

/// Event with quotes from every bookmaker carried by the odds feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsEvent {
    pub id: String,
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

impl OddsEvent {
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.commence_time <= now
    }

    /// Fold another fetch of the same event into this one. Markets a
    /// bookmaker already carries are kept; new markets and bookmakers are added.
    pub fn merge_markets(&mut self, other: OddsEvent) {
        for incoming in other.bookmakers {
            match self.bookmakers.iter_mut().find(|b| b.key == incoming.key) {
                Some(existing) => {
                    for market in incoming.markets {
                        if existing.market(&market.key).is_none() {
                            existing.markets.push(market);
                        }
                    }
                }
                None => self.bookmakers.push(incoming),
            }
        }
    }
}

// ============================================================================
// Feed traits
// ============================================================================

/// Source of the day's games and live run counts
#[async_trait]
pub trait ScoresFeed: Send + Sync {
    async fn fetch_scores(&self, date: NaiveDate) -> Result<Vec<ScoreGame>>;

    /// Feed name for logging
    fn feed_name(&self) -> &str;
}

/// Source of bookmaker totals quotes
#[async_trait]
pub trait OddsFeed: Send + Sync {
    /// Bulk quotes for every listed event
    async fn fetch_odds(&self, markets: &[&str]) -> Result<Vec<OddsEvent>>;

    /// Quotes for a single event, for markets only served per event
    /// (e.g. alternate totals). Feeds without such an endpoint return `None`.
    async fn fetch_event_odds(&self, _event_id: &str, _markets: &[&str]) -> Result<Option<OddsEvent>> {
        Ok(None)
    }

    fn feed_name(&self) -> &str;
}
