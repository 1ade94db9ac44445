//! Configuration constants and environment loading for the projection service
//!
//! This module manages the service-level settings layered on top of
//! [`ProjectionConfig`]:
//! - Upstream endpoints and the odds API key
//! - Polling interval and HTTP timeout
//! - Feed circuit breaker settings
//! - Optional team-ID table for matching

use anyhow::{Context, Result};
use slate_core::circuit_breaker::BreakerConfig;
use slate_core::clients::mlb::MLB_API_BASE;
use slate_core::clients::odds_api::THE_ODDS_API_BASE;
use slate_core::ProjectionConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default polling interval in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default per-request HTTP timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub odds_api_key: Option<String>,
    pub odds_api_base_url: String,
    pub mlb_api_base_url: String,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub team_map_path: Option<PathBuf>,
    pub feed_breaker: BreakerConfig,
    pub projection: ProjectionConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Result<Self> {
        let projection =
            ProjectionConfig::from_env().context("Invalid projection configuration")?;

        let poll_interval_secs = env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
            .max(1);

        let http_timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
            .max(1);

        Ok(Self {
            odds_api_key: env::var("ODDS_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            odds_api_base_url: env::var("ODDS_API_BASE_URL")
                .unwrap_or_else(|_| THE_ODDS_API_BASE.to_string()),
            mlb_api_base_url: env::var("MLB_API_BASE_URL")
                .unwrap_or_else(|_| MLB_API_BASE.to_string()),
            poll_interval: Duration::from_secs(poll_interval_secs),
            http_timeout: Duration::from_secs(http_timeout_secs),
            team_map_path: env::var("TEAM_MAP_PATH").ok().map(PathBuf::from),
            feed_breaker: load_feed_circuit_breaker_config(),
            projection,
        })
    }
}

/// Load feed circuit breaker configuration from environment
pub fn load_feed_circuit_breaker_config() -> BreakerConfig {
    BreakerConfig {
        failure_threshold: env::var("FEED_CB_FAILURE_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5),
        recovery_timeout: Duration::from_secs(
            env::var("FEED_CB_RECOVERY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        ),
        success_threshold: 2,
    }
}
