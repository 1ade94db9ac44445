//! Freshness cache for slate projections.
//!
//! Holds the last computed [`ProjectionSnapshot`] (and its two-number
//! summary) and decides, per read, whether to serve it or recompute:
//!
//! - Empty / stale inside the active window: recompute from both feeds
//! - Fresh (younger than the TTL): serve as-is
//! - Stale outside the active window: serve the last snapshot verbatim, or
//!   report [`CacheRead::OutOfWindow`] when nothing was ever computed
//!
//! A refresh pulls the scores feed and the bulk totals quotes together and
//! commits only if both succeed. Alternate totals, which the odds feed serves
//! per event, are fetched afterwards on a best-effort basis: they only feed
//! the two-number summary, and their failures are logged and dropped.
//!
//! Recomputes are single-flight. Readers queued behind an in-flight refresh
//! re-check freshness once they get the gate and reuse its result. A failed
//! recompute returns the error and leaves the previous snapshot in place.

use crate::config::ProjectionConfig;
use crate::error::Result;
use crate::feeds::{OddsEvent, OddsFeed, ScoresFeed, MARKET_ALTERNATE_TOTALS, MARKET_TOTALS};
use crate::matching::GameMatcher;
use crate::models::{ProjectionSnapshot, TwoNumbers};
use crate::projection::{compute_projection, compute_two_numbers};
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::future::join_all;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const TOTALS_MARKETS: [&str; 1] = [MARKET_TOTALS];
const ALTERNATE_MARKETS: [&str; 1] = [MARKET_ALTERNATE_TOTALS];

/// Source of "now" for TTL and window decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Fresh,
    StaleInWindow,
    StaleOutOfWindow,
}

/// Outcome of [`ProjectionCache::get`]
#[derive(Debug, Clone)]
pub enum CacheRead {
    /// Cached snapshot younger than the TTL
    Fresh(Arc<ProjectionSnapshot>),
    /// Snapshot recomputed by this call
    Refreshed(Arc<ProjectionSnapshot>),
    /// Stale snapshot served because recomputes are paused outside the window
    Retained(Arc<ProjectionSnapshot>),
    /// Nothing cached and outside the active window
    OutOfWindow,
}

impl CacheRead {
    pub fn snapshot(&self) -> Option<&Arc<ProjectionSnapshot>> {
        match self {
            CacheRead::Fresh(s) | CacheRead::Refreshed(s) | CacheRead::Retained(s) => Some(s),
            CacheRead::OutOfWindow => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CacheRead::Fresh(_) => "fresh",
            CacheRead::Refreshed(_) => "refreshed",
            CacheRead::Retained(_) => "retained",
            CacheRead::OutOfWindow => "out_of_window",
        }
    }
}

#[derive(Debug, Clone)]
struct CachedSlate {
    snapshot: Arc<ProjectionSnapshot>,
    two_numbers: Arc<TwoNumbers>,
    stored_at: DateTime<Utc>,
}

pub struct ProjectionCache {
    config: ProjectionConfig,
    clock: Arc<dyn Clock>,
    scores: Arc<dyn ScoresFeed>,
    odds: Arc<dyn OddsFeed>,
    matcher: Arc<dyn GameMatcher>,
    slot: RwLock<Option<CachedSlate>>,
    refresh_gate: Mutex<()>,
}

impl ProjectionCache {
    pub fn new(
        config: ProjectionConfig,
        scores: Arc<dyn ScoresFeed>,
        odds: Arc<dyn OddsFeed>,
        matcher: Arc<dyn GameMatcher>,
    ) -> Self {
        Self::with_clock(config, Arc::new(SystemClock), scores, odds, matcher)
    }

    pub fn with_clock(
        config: ProjectionConfig,
        clock: Arc<dyn Clock>,
        scores: Arc<dyn ScoresFeed>,
        odds: Arc<dyn OddsFeed>,
        matcher: Arc<dyn GameMatcher>,
    ) -> Self {
        Self {
            config,
            clock,
            scores,
            odds,
            matcher,
            slot: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    fn is_fresh(&self, cached: &CachedSlate, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(cached.stored_at) < self.config.cache_ttl
    }

    fn fresh_snapshot(&self, now: DateTime<Utc>) -> Option<Arc<ProjectionSnapshot>> {
        self.slot
            .read()
            .as_ref()
            .filter(|c| self.is_fresh(c, now))
            .map(|c| c.snapshot.clone())
    }

    pub fn state(&self) -> CacheState {
        let now = self.clock.now();
        let slot = self.slot.read();
        match slot.as_ref() {
            None => CacheState::Empty,
            Some(c) if self.is_fresh(c, now) => CacheState::Fresh,
            Some(_) if self.config.window.contains(now) => CacheState::StaleInWindow,
            Some(_) => CacheState::StaleOutOfWindow,
        }
    }

    /// Last snapshot regardless of age, without triggering a recompute
    pub fn peek(&self) -> Option<Arc<ProjectionSnapshot>> {
        self.slot.read().as_ref().map(|c| c.snapshot.clone())
    }

    /// Two-number summary computed alongside the last snapshot
    pub fn two_numbers(&self) -> Option<Arc<TwoNumbers>> {
        self.slot.read().as_ref().map(|c| c.two_numbers.clone())
    }

    /// Drop the cached snapshot; the next in-window read recomputes
    pub fn invalidate(&self) {
        if self.slot.write().take().is_some() {
            info!("Projection cache invalidated");
        }
    }

    pub async fn get(&self) -> Result<CacheRead> {
        let now = self.clock.now();
        if let Some(snapshot) = self.fresh_snapshot(now) {
            return Ok(CacheRead::Fresh(snapshot));
        }

        if !self.config.window.contains(now) {
            let retained = self.peek();
            debug!(
                "Outside active window (local hour {}), serving {}",
                self.config.window.local_hour(now),
                if retained.is_some() { "retained snapshot" } else { "nothing" }
            );
            return Ok(match retained {
                Some(snapshot) => CacheRead::Retained(snapshot),
                None => CacheRead::OutOfWindow,
            });
        }

        let _gate = self.refresh_gate.lock().await;

        // A refresh may have landed while we waited on the gate
        let now = self.clock.now();
        if let Some(snapshot) = self.fresh_snapshot(now) {
            return Ok(CacheRead::Fresh(snapshot));
        }

        match self.recompute(now).await {
            Ok(snapshot) => Ok(CacheRead::Refreshed(snapshot)),
            Err(e) => {
                warn!(
                    "Projection refresh failed, keeping previous snapshot: {}",
                    e
                );
                Err(e)
            }
        }
    }

    async fn recompute(&self, now: DateTime<Utc>) -> Result<Arc<ProjectionSnapshot>> {
        let slate_date = self.config.slate_date(now);

        let (scores, mut odds) = tokio::try_join!(
            self.scores.fetch_scores(slate_date),
            self.odds.fetch_odds(&TOTALS_MARKETS),
        )?;

        let snapshot = compute_projection(&odds, &scores, now, &self.config, self.matcher.as_ref())?;
        if self.config.alternate_totals {
            self.attach_alternates(&mut odds, slate_date).await;
        }
        let two_numbers =
            compute_two_numbers(&odds, &scores, now, &self.config, self.matcher.as_ref())?;

        info!(
            "Projection refreshed for {}: {} games, total {:.1} ± {:.1}, finish {:.1} ({} from {}, {} from {})",
            snapshot.as_of_date,
            snapshot.game_count_used,
            snapshot.total_projected,
            snapshot.total_dispersion,
            snapshot.projected_finish,
            scores.len(),
            self.scores.feed_name(),
            odds.len(),
            self.odds.feed_name(),
        );

        let snapshot = Arc::new(snapshot);
        *self.slot.write() = Some(CachedSlate {
            snapshot: snapshot.clone(),
            two_numbers: Arc::new(two_numbers),
            stored_at: now,
        });
        Ok(snapshot)
    }

    /// Merge per-event alternate totals into the slate's events
    async fn attach_alternates(&self, odds: &mut [OddsEvent], slate_date: NaiveDate) {
        let ids: Vec<String> = odds
            .iter()
            .filter(|ev| self.config.slate_date(ev.commence_time) == slate_date)
            .map(|ev| ev.id.clone())
            .collect();
        if ids.is_empty() {
            return;
        }

        let results = join_all(
            ids.iter()
                .map(|id| self.odds.fetch_event_odds(id, &ALTERNATE_MARKETS)),
        )
        .await;

        let mut failed = 0usize;
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(Some(extra)) => {
                    if let Some(event) = odds.iter_mut().find(|ev| &ev.id == id) {
                        event.merge_markets(extra);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    failed += 1;
                    debug!("Alternate totals for {} unavailable: {}", id, e);
                }
            }
        }
        if failed > 0 {
            warn!(
                "Alternate totals missing for {}/{} events; two-number medians will be partial",
                failed,
                ids.len()
            );
        }
    }
}
