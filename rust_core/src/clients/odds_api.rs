use crate::circuit_breaker::{BreakerConfig, BreakerState, FeedCircuitBreaker};
use crate::error::{Feed, ProjectionError, Result};
use crate::feeds::{OddsEvent, OddsFeed};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const THE_ODDS_API_BASE: &str = "https://api.the-odds-api.com/v4";

const SPORT_KEY: &str = "baseball_mlb";

/// Decode an odds response body
pub fn parse_odds(body: &str) -> Result<Vec<OddsEvent>> {
    decode(body)
}

/// Decode a single-event odds response body
pub fn parse_event_odds(body: &str) -> Result<OddsEvent> {
    decode(body)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| ProjectionError::upstream(Feed::Odds, format!("Odds API decode error: {}", e)))
}

/// The Odds API client for MLB totals
#[derive(Clone)]
pub struct OddsApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    region: String,
    circuit_breaker: Arc<FeedCircuitBreaker>,
}

impl std::fmt::Debug for OddsApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OddsApiClient")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .field("circuit_breaker_state", &self.circuit_breaker.state())
            .finish()
    }
}

impl OddsApiClient {
    /// Missing key is allowed here; fetches fail with `ConfigMissing` instead
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_config(
            api_key,
            THE_ODDS_API_BASE,
            Duration::from_secs(10),
            BreakerConfig::default(),
        )
    }

    pub fn with_config(
        api_key: Option<String>,
        base_url: &str,
        timeout: Duration,
        breaker: BreakerConfig,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(super::USER_AGENT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            region: "us".to_string(),
            circuit_breaker: Arc::new(FeedCircuitBreaker::new(Feed::Odds, breaker)),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn circuit_state(&self) -> BreakerState {
        self.circuit_breaker.state()
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ProjectionError::ConfigMissing("ODDS_API_KEY".to_string()))
    }

    async fn fetch_odds_internal(&self, api_key: &str, markets: &[&str]) -> Result<Vec<OddsEvent>> {
        let url = format!("{}/sports/{}/odds", self.base_url, SPORT_KEY);
        let body = self.get_body(&url, api_key, markets).await?;
        let events = parse_odds(&body)?;

        info!("Fetched {} MLB events with odds", events.len());
        Ok(events)
    }

    async fn get_body(&self, url: &str, api_key: &str, markets: &[&str]) -> Result<String> {
        let markets = markets.join(",");

        debug!("Fetching odds from: {} (markets={})", url, markets);

        let resp = self
            .client
            .get(url)
            .query(&[
                ("apiKey", api_key),
                ("regions", self.region.as_str()),
                ("markets", markets.as_str()),
                ("oddsFormat", "american"),
                ("dateFormat", "iso"),
            ])
            .send()
            .await
            .map_err(|e| ProjectionError::upstream(Feed::Odds, format!("Odds API request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProjectionError::upstream(
                Feed::Odds,
                format!("Odds API {}", status.as_u16()),
            ));
        }

        if let Some(remaining) = resp
            .headers()
            .get("x-requests-remaining")
            .and_then(|v| v.to_str().ok())
        {
            debug!("Odds API requests remaining: {}", remaining);
        }

        resp.text()
            .await
            .map_err(|e| ProjectionError::upstream(Feed::Odds, format!("Odds API body read failed: {}", e)))
    }
}

#[async_trait]
impl OddsFeed for OddsApiClient {
    async fn fetch_odds(&self, markets: &[&str]) -> Result<Vec<OddsEvent>> {
        let api_key = self.api_key()?;
        self.circuit_breaker
            .call(self.fetch_odds_internal(api_key, markets))
            .await
    }

    /// Per-event endpoint. Refused while the breaker is open; its own
    /// results are not recorded on the breaker.
    async fn fetch_event_odds(&self, event_id: &str, markets: &[&str]) -> Result<Option<OddsEvent>> {
        let api_key = self.api_key()?;
        if self.circuit_breaker.state() == BreakerState::Open {
            return Err(ProjectionError::upstream(Feed::Odds, "circuit breaker open"));
        }

        let url = format!(
            "{}/sports/{}/events/{}/odds",
            self.base_url, SPORT_KEY, event_id
        );
        let body = self.get_body(&url, api_key, markets).await?;
        parse_event_odds(&body).map(Some)
    }

    fn feed_name(&self) -> &str {
        "the_odds_api"
    }
}
