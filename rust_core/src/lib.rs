//! Slate Core - live-aware MLB slate run projection.
//!
//! This crate provides:
//! - Odds normalization (American odds, two-way devig, juice skew)
//! - Line selection per game (live-fresh quotes replace pregame quotes)
//! - Slate aggregation into a projected total, dispersion band and finish
//! - A TTL + active-window freshness cache with single-flight refresh
//! - Alternate-totals median interpolation
//! - Scoreboard and run-tally views over the scores feed
//! - MLB Stats API and The Odds API clients behind circuit breakers

pub mod cache;
pub mod circuit_breaker;
pub mod clients;
pub mod config;
pub mod error;
pub mod feeds;
pub mod matching;
pub mod median;
pub mod models;
pub mod odds;
pub mod projection;
pub mod scoreboard;
pub mod selection;
pub mod utils;

pub use cache::{CacheRead, CacheState, Clock, ProjectionCache, SystemClock};
pub use config::{ActiveWindow, ProjectionConfig};
pub use error::{Feed, ProjectionError, Result};
pub use feeds::{OddsEvent, OddsFeed, ScoreGame, ScoresFeed};
pub use matching::{ChainedMatcher, GameMatcher, PrefixMatcher, TeamIdMatcher};
pub use models::{GameStatus, ProjectionSnapshot, RunTally, Scoreboard, TwoNumbers};
pub use projection::{compute_projection, compute_two_numbers};
