mod config;
mod poller;

use crate::config::ServiceConfig;
use crate::poller::Poller;
use anyhow::{Context, Result};
use dotenv::dotenv;
use slate_core::cache::{Clock, SystemClock};
use slate_core::clients::{MlbStatsClient, OddsApiClient};
use slate_core::{ChainedMatcher, GameMatcher, OddsFeed, PrefixMatcher, ProjectionCache, ScoresFeed, TeamIdMatcher};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn build_matcher(config: &ServiceConfig) -> Result<Arc<dyn GameMatcher>> {
    let mut chain = ChainedMatcher::new(Vec::new());
    if let Some(path) = &config.team_map_path {
        let table = TeamIdMatcher::load(path)
            .with_context(|| format!("Failed to load team map {}", path.display()))?;
        info!("Loaded {} team ids from {}", table.len(), path.display());
        chain.register_matcher(Box::new(table));
    }
    chain.register_matcher(Box::new(PrefixMatcher::default()));
    Ok(Arc::new(chain))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting Projection Service...");

    let once = std::env::args().any(|a| a == "--once");
    let config = ServiceConfig::from_env()?;
    if config.odds_api_key.is_none() {
        warn!("ODDS_API_KEY not set; projections will fail until it is configured");
    }

    // Clients
    let scores: Arc<dyn ScoresFeed> = Arc::new(MlbStatsClient::with_config(
        &config.mlb_api_base_url,
        config.http_timeout,
        config.feed_breaker.clone(),
    ));
    let odds: Arc<dyn OddsFeed> = Arc::new(OddsApiClient::with_config(
        config.odds_api_key.clone(),
        &config.odds_api_base_url,
        config.http_timeout,
        config.feed_breaker.clone(),
    ));
    let matcher = build_matcher(&config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let cache = Arc::new(ProjectionCache::with_clock(
        config.projection.clone(),
        clock.clone(),
        scores.clone(),
        odds,
        matcher,
    ));
    let poller = Arc::new(Poller::new(cache, scores, clock));

    if once {
        let report = poller.run_cycle().await;
        let json = serde_json::to_string_pretty(&report).context("Failed to encode cycle report")?;
        println!("{}", json);
        return Ok(());
    }

    let interval = config.poll_interval;
    let task = tokio::spawn(poller.run(interval));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
        res = task => {
            res.context("Polling loop exited")?;
        }
    }

    info!("Projection Service stopped");
    Ok(())
}
