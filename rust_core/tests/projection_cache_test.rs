//! Integration tests for the projection freshness cache
//!
//! Drives the cache with a fake clock and counting in-memory feeds, so no
//! network access is needed.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use parking_lot::Mutex;
use slate_core::feeds::{
    Bookmaker, OddsMarket, OddsOutcome, MARKET_ALTERNATE_TOTALS, MARKET_TOTALS,
};
use slate_core::{
    CacheRead, CacheState, Clock, Feed, GameStatus, OddsEvent, OddsFeed, PrefixMatcher,
    ProjectionCache, ProjectionConfig, ProjectionError, Result, ScoreGame, ScoresFeed,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

struct FakeClock(Mutex<DateTime<Utc>>);

impl FakeClock {
    fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(now)))
    }

    fn set(&self, now: DateTime<Utc>) {
        *self.0.lock() = now;
    }

    fn advance(&self, by: Duration) {
        let mut now = self.0.lock();
        *now = *now + by;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}

#[derive(Default)]
struct FakeScores {
    calls: AtomicUsize,
    fail: AtomicBool,
    delay_ms: u64,
}

#[async_trait]
impl ScoresFeed for FakeScores {
    async fn fetch_scores(&self, _date: NaiveDate) -> Result<Vec<ScoreGame>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProjectionError::upstream(Feed::Scores, "MLB upstream 503"));
        }
        Ok(vec![score_game()])
    }

    fn feed_name(&self) -> &str {
        "fake_scores"
    }
}

/// Behaves like the bulk odds endpoint: only featured markets are served
/// there, alternates come from the per-event endpoint
#[derive(Default)]
struct FakeOdds {
    calls: AtomicUsize,
    event_calls: AtomicUsize,
    missing_key: bool,
    alternates_down: AtomicBool,
}

#[async_trait]
impl OddsFeed for FakeOdds {
    async fn fetch_odds(&self, markets: &[&str]) -> Result<Vec<OddsEvent>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.missing_key {
            return Err(ProjectionError::ConfigMissing("ODDS_API_KEY".to_string()));
        }
        if markets.contains(&MARKET_ALTERNATE_TOTALS) {
            return Err(ProjectionError::upstream(Feed::Odds, "Odds API 422"));
        }
        assert_eq!(markets, [MARKET_TOTALS].as_slice());
        Ok(vec![odds_event()])
    }

    async fn fetch_event_odds(&self, event_id: &str, markets: &[&str]) -> Result<Option<OddsEvent>> {
        self.event_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(markets, [MARKET_ALTERNATE_TOTALS].as_slice());
        if self.alternates_down.load(Ordering::SeqCst) {
            return Err(ProjectionError::upstream(Feed::Odds, "Odds API 429"));
        }
        assert_eq!(event_id, "evt-1");
        Ok(Some(alternates_event()))
    }

    fn feed_name(&self) -> &str {
        "fake_odds"
    }
}

/// 13:00 in Los Angeles, inside the default 09-21 window
fn in_window() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 20, 0, 0).unwrap()
}

/// 23:00 in Los Angeles, same slate date
fn after_window() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 6, 0, 0).unwrap()
}

fn score_game() -> ScoreGame {
    ScoreGame {
        game_id: "777001".to_string(),
        home_name: "Los Angeles Dodgers".to_string(),
        home_abbr: Some("LAD".to_string()),
        away_name: "San Diego Padres".to_string(),
        away_abbr: Some("SD".to_string()),
        status: GameStatus::Preview,
        detailed_state: Some("Scheduled".to_string()),
        home_runs: 0,
        away_runs: 0,
        current_inning: None,
        inning_ordinal: None,
        is_top_inning: None,
        outs: None,
    }
}

fn odds_event() -> OddsEvent {
    let updated = in_window() - Duration::minutes(5);
    let book = |key: &str, point: f64| Bookmaker {
        key: key.to_string(),
        title: key.to_string(),
        last_update: Some(updated),
        markets: vec![OddsMarket {
            key: MARKET_TOTALS.to_string(),
            last_update: Some(updated),
            outcomes: vec![
                OddsOutcome {
                    name: "Over".to_string(),
                    price: Some(-110.0),
                    point: Some(point),
                },
                OddsOutcome {
                    name: "Under".to_string(),
                    price: Some(-110.0),
                    point: Some(point),
                },
            ],
        }],
    };

    OddsEvent {
        id: "evt-1".to_string(),
        // 16:10 in Los Angeles
        commence_time: Utc.with_ymd_and_hms(2025, 6, 1, 23, 10, 0).unwrap(),
        home_team: "Los Angeles Dodgers".to_string(),
        away_team: "San Diego Padres".to_string(),
        bookmakers: vec![book("fanduel", 8.5), book("draftkings", 9.5)],
    }
}

/// Ladder crossing 50% halfway between 8 and 9
fn alternates_event() -> OddsEvent {
    let line = |point: f64, over: f64, under: f64| {
        vec![
            OddsOutcome {
                name: "Over".to_string(),
                price: Some(over),
                point: Some(point),
            },
            OddsOutcome {
                name: "Under".to_string(),
                price: Some(under),
                point: Some(point),
            },
        ]
    };
    let mut outcomes = line(8.0, -120.0, 100.0);
    outcomes.extend(line(9.0, 100.0, -120.0));

    let mut event = odds_event();
    event.bookmakers = vec![Bookmaker {
        key: "fanduel".to_string(),
        title: "FanDuel".to_string(),
        last_update: None,
        markets: vec![OddsMarket {
            key: MARKET_ALTERNATE_TOTALS.to_string(),
            last_update: None,
            outcomes,
        }],
    }];
    event
}

struct Harness {
    clock: Arc<FakeClock>,
    scores: Arc<FakeScores>,
    odds: Arc<FakeOdds>,
    cache: Arc<ProjectionCache>,
}

impl Harness {
    fn new(scores: FakeScores, odds: FakeOdds) -> Self {
        let clock = FakeClock::at(in_window());
        let scores = Arc::new(scores);
        let odds = Arc::new(odds);
        let cache = Arc::new(ProjectionCache::with_clock(
            ProjectionConfig::default(),
            clock.clone(),
            scores.clone(),
            odds.clone(),
            Arc::new(PrefixMatcher::default()),
        ));
        Self {
            clock,
            scores,
            odds,
            cache,
        }
    }

    fn fetch_pairs(&self) -> (usize, usize) {
        (
            self.scores.calls.load(Ordering::SeqCst),
            self.odds.calls.load(Ordering::SeqCst),
        )
    }
}

#[tokio::test]
async fn test_first_read_computes_snapshot() {
    let h = Harness::new(FakeScores::default(), FakeOdds::default());
    assert_eq!(h.cache.state(), CacheState::Empty);

    let read = assert_ok!(h.cache.get().await);
    assert!(matches!(read, CacheRead::Refreshed(_)));

    let snapshot = read.snapshot().unwrap();
    assert_eq!(snapshot.game_count_used, 1);
    assert!((snapshot.total_projected - 9.0).abs() < 1e-9);
    assert_eq!(snapshot.as_of_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    assert_eq!(h.fetch_pairs(), (1, 1));
    assert_eq!(h.cache.state(), CacheState::Fresh);
    assert!(h.cache.two_numbers().is_some());
}

#[tokio::test]
async fn test_refresh_requests_bulk_totals_only() {
    let h = Harness::new(FakeScores::default(), FakeOdds::default());

    let read = assert_ok!(h.cache.get().await);
    assert!(matches!(read, CacheRead::Refreshed(_)));
    assert_eq!(h.odds.event_calls.load(Ordering::SeqCst), 1);

    let two = h.cache.two_numbers().unwrap();
    assert_eq!(two.games.len(), 1);
    let median = two.games[0].alt_median.unwrap();
    assert!((median - 8.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_alternates_outage_still_commits_snapshot() {
    let h = Harness::new(FakeScores::default(), FakeOdds::default());
    h.odds.alternates_down.store(true, Ordering::SeqCst);

    let read = assert_ok!(h.cache.get().await);
    assert!(matches!(read, CacheRead::Refreshed(_)));
    assert_eq!(read.snapshot().unwrap().game_count_used, 1);
    assert_eq!(h.cache.state(), CacheState::Fresh);

    let two = h.cache.two_numbers().unwrap();
    assert!(two.games[0].alt_median.is_none());
}

#[tokio::test]
async fn test_alternates_can_be_switched_off() {
    let clock = FakeClock::at(in_window());
    let odds = Arc::new(FakeOdds::default());
    let config = ProjectionConfig {
        alternate_totals: false,
        ..Default::default()
    };
    let cache = ProjectionCache::with_clock(
        config,
        clock,
        Arc::new(FakeScores::default()),
        odds.clone(),
        Arc::new(PrefixMatcher::default()),
    );

    assert_ok!(cache.get().await);
    assert_eq!(odds.calls.load(Ordering::SeqCst), 1);
    assert_eq!(odds.event_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_reads_within_ttl_share_snapshot() {
    let h = Harness::new(FakeScores::default(), FakeOdds::default());

    let first = assert_ok!(h.cache.get().await);
    h.clock.advance(Duration::minutes(9));
    let second = assert_ok!(h.cache.get().await);

    assert!(matches!(second, CacheRead::Fresh(_)));
    assert!(Arc::ptr_eq(
        first.snapshot().unwrap(),
        second.snapshot().unwrap()
    ));
    assert_eq!(h.fetch_pairs(), (1, 1));
}

#[tokio::test]
async fn test_expired_in_window_refreshes_once() {
    let h = Harness::new(FakeScores::default(), FakeOdds::default());

    let first = assert_ok!(h.cache.get().await);
    h.clock.advance(Duration::minutes(11));
    assert_eq!(h.cache.state(), CacheState::StaleInWindow);

    let second = assert_ok!(h.cache.get().await);
    let third = assert_ok!(h.cache.get().await);

    assert!(matches!(second, CacheRead::Refreshed(_)));
    assert!(matches!(third, CacheRead::Fresh(_)));
    assert!(!Arc::ptr_eq(
        first.snapshot().unwrap(),
        second.snapshot().unwrap()
    ));
    assert_eq!(h.fetch_pairs(), (2, 2));
}

#[tokio::test]
async fn test_concurrent_readers_share_one_refresh() {
    let scores = FakeScores {
        delay_ms: 50,
        ..Default::default()
    };
    let h = Harness::new(scores, FakeOdds::default());

    let (a, b) = tokio::join!(h.cache.get(), h.cache.get());
    let a = assert_ok!(a);
    let b = assert_ok!(b);

    assert!(Arc::ptr_eq(a.snapshot().unwrap(), b.snapshot().unwrap()));
    assert_eq!(h.fetch_pairs(), (1, 1));
}

#[tokio::test]
async fn test_out_of_window_serves_retained_snapshot() {
    let h = Harness::new(FakeScores::default(), FakeOdds::default());

    let first = assert_ok!(h.cache.get().await);
    h.clock.set(after_window());
    assert_eq!(h.cache.state(), CacheState::StaleOutOfWindow);

    let read = assert_ok!(h.cache.get().await);
    assert!(matches!(read, CacheRead::Retained(_)));
    assert!(Arc::ptr_eq(first.snapshot().unwrap(), read.snapshot().unwrap()));
    assert_eq!(h.fetch_pairs(), (1, 1));
}

#[tokio::test]
async fn test_out_of_window_without_snapshot() {
    let h = Harness::new(FakeScores::default(), FakeOdds::default());
    h.clock.set(after_window());

    let read = assert_ok!(h.cache.get().await);
    assert!(matches!(read, CacheRead::OutOfWindow));
    assert!(read.snapshot().is_none());
    assert_eq!(read.label(), "out_of_window");
    assert_eq!(h.fetch_pairs(), (0, 0));
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let h = Harness::new(FakeScores::default(), FakeOdds::default());

    let first = assert_ok!(h.cache.get().await);
    h.clock.advance(Duration::minutes(11));
    h.scores.fail.store(true, Ordering::SeqCst);

    let err = assert_err!(h.cache.get().await);
    assert!(matches!(
        err,
        ProjectionError::UpstreamUnavailable {
            feed: Feed::Scores,
            ..
        }
    ));

    let kept = h.cache.peek().unwrap();
    assert!(Arc::ptr_eq(first.snapshot().unwrap(), &kept));
    assert_eq!(h.cache.state(), CacheState::StaleInWindow);

    // Recovers on the next read once the feed is back
    h.scores.fail.store(false, Ordering::SeqCst);
    let read = assert_ok!(h.cache.get().await);
    assert!(matches!(read, CacheRead::Refreshed(_)));
}

#[tokio::test]
async fn test_missing_odds_key_surfaces_to_caller() {
    let odds = FakeOdds {
        missing_key: true,
        ..Default::default()
    };
    let h = Harness::new(FakeScores::default(), odds);

    let err = assert_err!(h.cache.get().await);
    assert_eq!(err.to_string(), "Missing ODDS_API_KEY");
    assert_eq!(h.cache.state(), CacheState::Empty);
}

#[tokio::test]
async fn test_invalidate_forces_recompute() {
    let h = Harness::new(FakeScores::default(), FakeOdds::default());

    assert_ok!(h.cache.get().await);
    h.cache.invalidate();
    assert_eq!(h.cache.state(), CacheState::Empty);
    assert!(h.cache.peek().is_none());

    let read = assert_ok!(h.cache.get().await);
    assert!(matches!(read, CacheRead::Refreshed(_)));
    assert_eq!(h.fetch_pairs(), (2, 2));
}
