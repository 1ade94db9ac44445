//! Circuit breaker for upstream feed resilience.
//!
//! Each feed client owns one breaker:
//! - Closed: requests flow, consecutive failures are counted
//! - Open: requests are refused until the recovery timeout elapses
//! - HalfOpen: trial requests flow; enough successes close the circuit,
//!   any failure reopens it

use crate::error::{Feed, ProjectionError, Result};
use parking_lot::Mutex;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Time spent open before trial requests are let through
    pub recovery_timeout: Duration,
    /// Half-open successes needed to close again
    pub success_threshold: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    failures: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
}

/// Feed-level circuit breaker.
///
/// # Example
/// ```ignore
/// let breaker = FeedCircuitBreaker::new(Feed::Scores, BreakerConfig::default());
/// let games = breaker.call(client.fetch_internal(url)).await?;
/// ```
#[derive(Debug)]
pub struct FeedCircuitBreaker {
    feed: Feed,
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl FeedCircuitBreaker {
    pub fn new(feed: Feed, config: BreakerConfig) -> Self {
        Self {
            feed,
            config,
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                failures: 0,
                half_open_successes: 0,
                opened_at: None,
            }),
        }
    }

    /// Whether a request may go out now; moves Open -> HalfOpen once the
    /// recovery timeout has elapsed
    pub fn is_available(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let recovered = inner
                    .opened_at
                    .map(|t| t.elapsed() >= self.config.recovery_timeout)
                    .unwrap_or(true);
                if recovered {
                    inner.state = BreakerState::HalfOpen;
                    inner.half_open_successes = 0;
                }
                recovered
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.failures = 0;
        if inner.state == BreakerState::HalfOpen {
            inner.half_open_successes += 1;
            if inner.half_open_successes < self.config.success_threshold {
                return;
            }
            info!(
                "{} feed circuit closed after {} trial successes",
                self.feed, inner.half_open_successes
            );
        }
        inner.state = BreakerState::Closed;
        inner.opened_at = None;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.failures += 1;
        match inner.state {
            BreakerState::Closed if inner.failures >= self.config.failure_threshold => {
                warn!(
                    "{} feed circuit OPENED after {} consecutive failures",
                    self.feed, inner.failures
                );
                inner.state = BreakerState::Open;
                inner.opened_at = Some(Instant::now());
            }
            BreakerState::HalfOpen => {
                warn!("{} feed circuit re-OPENED during trial request", self.feed);
                inner.state = BreakerState::Open;
                inner.opened_at = Some(Instant::now());
            }
            _ => {}
        }
    }

    /// Run one upstream request through the breaker
    pub async fn call<T, F>(&self, request: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if !self.is_available() {
            return Err(ProjectionError::upstream(self.feed, "circuit breaker open"));
        }
        let result = request.await;
        match &result {
            Ok(_) => self.record_success(),
            Err(e) if e.is_transient() => self.record_failure(),
            Err(_) => {}
        }
        result
    }

    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failures
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state = BreakerState::Closed;
        inner.failures = 0;
        inner.half_open_successes = 0;
        inner.opened_at = None;
    }
}
