pub mod mlb;
pub mod odds_api;

// Re-export commonly used types
pub use mlb::MlbStatsClient;
pub use odds_api::OddsApiClient;

/// User-Agent sent on every upstream request
pub const USER_AGENT: &str = concat!("slate-runs/", env!("CARGO_PKG_VERSION"));
