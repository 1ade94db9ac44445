//! Projection engine configuration
//!
//! This module manages:
//! - Juice-to-runs scaling and live-fresh recency for line selection
//! - Cache TTL
//! - Whether refreshes also pull per-event alternate totals
//! - The daily active window (local hours in an IANA time zone)

use crate::error::{ProjectionError, Result};
use crate::models::ConfigEcho;
use crate::odds::JUICE_TO_RUNS;
use crate::selection::LinePolicy;
use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use std::env;
use std::str::FromStr;

/// Default time zone the slate date and active window are evaluated in
pub const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";

/// Default first hour (inclusive) in which recomputes may happen
pub const DEFAULT_WINDOW_START_HOUR: u32 = 9;

/// Default hour (exclusive) after which recomputes stop
pub const DEFAULT_WINDOW_END_HOUR: u32 = 21;

pub const DEFAULT_TTL_MINUTES: i64 = 10;

pub const DEFAULT_LIVE_RECENT_MINUTES: i64 = 15;

/// Local-hour window `[start_hour, end_hour)` in which recomputes are allowed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveWindow {
    pub start_hour: u32,
    pub end_hour: u32,
    pub timezone: Tz,
}

impl ActiveWindow {
    pub fn new(start_hour: u32, end_hour: u32, timezone: Tz) -> Result<Self> {
        if start_hour > 23 || end_hour > 24 {
            return Err(ProjectionError::ConfigInvalid(format!(
                "window hours out of range: {}-{}",
                start_hour, end_hour
            )));
        }
        if start_hour == end_hour {
            return Err(ProjectionError::ConfigInvalid(format!(
                "empty active window: {}-{}",
                start_hour, end_hour
            )));
        }
        Ok(Self {
            start_hour,
            end_hour,
            timezone,
        })
    }

    /// Local hour of `now` in the window's zone
    pub fn local_hour(&self, now: DateTime<Utc>) -> u32 {
        now.with_timezone(&self.timezone).hour()
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let hour = self.local_hour(now);
        // start > end wraps midnight
        if self.start_hour > self.end_hour {
            hour >= self.start_hour || hour < self.end_hour
        } else {
            hour >= self.start_hour && hour < self.end_hour
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    pub juice_to_runs: f64,
    pub live_recent: Duration,
    pub cache_ttl: Duration,
    pub window: ActiveWindow,
    /// Fetch alternate totals per event on refresh (one extra request per game)
    pub alternate_totals: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            juice_to_runs: JUICE_TO_RUNS,
            live_recent: Duration::minutes(DEFAULT_LIVE_RECENT_MINUTES),
            cache_ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
            window: ActiveWindow {
                start_hour: DEFAULT_WINDOW_START_HOUR,
                end_hour: DEFAULT_WINDOW_END_HOUR,
                timezone: chrono_tz::America::Los_Angeles,
            },
            alternate_totals: true,
        }
    }
}

impl ProjectionConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Result<Self> {
        let tz_name = env::var("PROJECTION_TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());
        let timezone = Tz::from_str(&tz_name).map_err(|_| {
            ProjectionError::ConfigInvalid(format!(
                "PROJECTION_TIMEZONE: {} (expected IANA tz like America/Los_Angeles)",
                tz_name
            ))
        })?;

        let window = ActiveWindow::new(
            parse_env("WINDOW_START_HOUR", DEFAULT_WINDOW_START_HOUR)?,
            parse_env("WINDOW_END_HOUR", DEFAULT_WINDOW_END_HOUR)?,
            timezone,
        )?;

        let config = Self {
            juice_to_runs: parse_env("JUICE_TO_RUNS", JUICE_TO_RUNS)?,
            live_recent: minutes_setting(
                "LIVE_RECENT_MINUTES",
                parse_env("LIVE_RECENT_MINUTES", DEFAULT_LIVE_RECENT_MINUTES)?,
            )?,
            cache_ttl: minutes_setting(
                "PROJECTION_TTL_MINUTES",
                parse_env("PROJECTION_TTL_MINUTES", DEFAULT_TTL_MINUTES)?,
            )?,
            window,
            alternate_totals: parse_env("FETCH_ALTERNATE_TOTALS", true)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.juice_to_runs.is_finite() || self.juice_to_runs < 0.0 {
            return Err(ProjectionError::ConfigInvalid(format!(
                "JUICE_TO_RUNS must be a non-negative number, got {}",
                self.juice_to_runs
            )));
        }
        if self.cache_ttl <= Duration::zero() {
            return Err(ProjectionError::ConfigInvalid(
                "PROJECTION_TTL_MINUTES must be positive".to_string(),
            ));
        }
        if self.live_recent < Duration::zero() {
            return Err(ProjectionError::ConfigInvalid(
                "LIVE_RECENT_MINUTES must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn line_policy(&self) -> LinePolicy {
        LinePolicy {
            juice_to_runs: self.juice_to_runs,
            live_recent: self.live_recent,
        }
    }

    /// Calendar date of `now` in the configured zone
    pub fn slate_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.window.timezone).date_naive()
    }

    pub fn echo(&self) -> ConfigEcho {
        ConfigEcho {
            timezone: self.window.timezone.name().to_string(),
            window_start_hour: self.window.start_hour,
            window_end_hour: self.window.end_hour,
            cache_minutes: self.cache_ttl.num_minutes(),
            live_recent_minutes: self.live_recent.num_minutes(),
            juice_to_runs: self.juice_to_runs,
        }
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ProjectionError::ConfigInvalid(format!("{}: {}", key, raw))),
        Err(_) => Ok(default),
    }
}

/// Minutes as a `Duration`, rejecting values chrono cannot represent
fn minutes_setting(key: &str, minutes: i64) -> Result<Duration> {
    Duration::try_minutes(minutes).ok_or_else(|| {
        ProjectionError::ConfigInvalid(format!("{}: {} minutes is out of range", key, minutes))
    })
}
