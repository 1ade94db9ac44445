//! Error taxonomy for projection cycles.
//!
//! Only whole-cycle failures are errors. Per-event problems (no priced
//! quotes, failed team match) degrade to defaults inside the aggregator, and
//! a skipped recompute outside the active window is reported through
//! [`crate::cache::CacheRead::OutOfWindow`].

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Upstream collaborator a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Feed {
    Scores,
    Odds,
}

impl Feed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::Scores => "scores",
            Feed::Odds => "odds",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ProjectionError {
    /// Non-success response, transport failure, undecodable body or open breaker
    #[error("{feed} feed unavailable: {reason}")]
    UpstreamUnavailable { feed: Feed, reason: String },

    /// A required credential or setting is absent
    #[error("Missing {0}")]
    ConfigMissing(String),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
}

impl ProjectionError {
    pub fn upstream(feed: Feed, reason: impl Into<String>) -> Self {
        ProjectionError::UpstreamUnavailable {
            feed,
            reason: reason.into(),
        }
    }

    /// Whether the next cycle can reasonably succeed without operator action
    pub fn is_transient(&self) -> bool {
        matches!(self, ProjectionError::UpstreamUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, ProjectionError>;
