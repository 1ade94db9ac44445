//! Fixed-interval polling of the projection cache and the scoreboard.
//!
//! Each cycle reads the cache (which decides on its own whether to
//! recompute) and, concurrently, pulls the scores feed for the scoreboard
//! and run tally. A failure in one half does not suppress the other.

use futures_util::future::join;
use serde::Serialize;
use slate_core::cache::{CacheRead, Clock};
use slate_core::models::{ProjectionSnapshot, RunTally, Scoreboard, TwoNumbers};
use slate_core::scoreboard::{build_scoreboard, tally_runs};
use slate_core::{ProjectionCache, ScoresFeed};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Everything one polling cycle produced
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// fresh | refreshed | retained | out_of_window | error
    pub projection_status: String,
    pub projection: Option<ProjectionSnapshot>,
    pub two_numbers: Option<TwoNumbers>,
    pub scoreboard: Option<Scoreboard>,
    pub run_tally: Option<RunTally>,
    pub errors: Vec<String>,
}

pub struct Poller {
    cache: Arc<ProjectionCache>,
    scores: Arc<dyn ScoresFeed>,
    clock: Arc<dyn Clock>,
}

impl Poller {
    pub fn new(cache: Arc<ProjectionCache>, scores: Arc<dyn ScoresFeed>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache,
            scores,
            clock,
        }
    }

    pub async fn run_cycle(&self) -> CycleReport {
        let now = self.clock.now();
        let date = self.cache.config().slate_date(now);
        let mut errors = Vec::new();

        let (projection, scores) = join(self.cache.get(), self.scores.fetch_scores(date)).await;

        let (projection_status, projection) = match projection {
            Ok(read) => {
                if let CacheRead::OutOfWindow = read {
                    let window = &self.cache.config().window;
                    errors.push(format!(
                        "Projection updates only between {:02}:00-{:02}:00 {}",
                        window.start_hour, window.end_hour, window.timezone
                    ));
                }
                (read.label().to_string(), read.snapshot().map(|s| (**s).clone()))
            }
            Err(e) => {
                errors.push(e.to_string());
                // Serve whatever the cache still holds
                ("error".to_string(), self.cache.peek().map(|s| (*s).clone()))
            }
        };

        let (scoreboard, run_tally) = match scores {
            Ok(games) => (
                Some(build_scoreboard(date, &games, now)),
                Some(tally_runs(date, &games, now)),
            ),
            Err(e) => {
                errors.push(e.to_string());
                (None, None)
            }
        };

        CycleReport {
            projection_status,
            projection,
            two_numbers: self.cache.two_numbers().map(|t| (*t).clone()),
            scoreboard,
            run_tally,
            errors,
        }
    }

    /// Log the cycle at info, problems at warn
    pub fn log_report(report: &CycleReport) {
        match &report.projection {
            Some(p) => info!(
                "[{}] {} projected {:.1} (band {:.1}-{:.1}), {} runs so far, finish {:.1}",
                report.projection_status,
                p.as_of_date,
                p.total_projected,
                p.band.low,
                p.band.high,
                p.actual_runs_so_far,
                p.projected_finish
            ),
            None => info!("[{}] no projection available", report.projection_status),
        }

        if let Some(t) = &report.two_numbers {
            info!(
                "Two numbers: {} scored, slate finish {:.1} over {} games",
                t.total_runs_scored,
                t.projected_slate_finish,
                t.games.len()
            );
        }

        if let Some(board) = &report.scoreboard {
            for item in &board.items {
                debug!(
                    "{} {} @ {} {} ({})",
                    item.away, item.away_runs, item.home, item.home_runs, item.tag
                );
            }
        }
        if let Some(tally) = &report.run_tally {
            info!("{} games, {} total runs", tally.games_count, tally.total_runs);
        }

        for e in &report.errors {
            warn!("Cycle error: {}", e);
        }
    }

    pub async fn run(self: Arc<Self>, interval: Duration) {
        info!("Polling loop started (interval: {}s)", interval.as_secs());
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let report = self.run_cycle().await;
            Self::log_report(&report);
            if report.projection.is_none() && report.scoreboard.is_none() {
                error!("Cycle produced no data");
            }
        }
    }
}
