//! American odds normalization and juice adjustment.
//!
//! Converts quoted prices into implied probabilities, strips the bookmaker
//! margin from two-way totals markets, and translates the remaining skew
//! toward one side into an expected-runs shift of the quoted point.

use serde::{Deserialize, Serialize};

/// Runs of total movement per unit of devigged probability skew
pub const JUICE_TO_RUNS: f64 = 0.60;

/// Vig-free probabilities for the two sides of a totals market
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DevigResult {
    pub p_over: f64,
    pub p_under: f64,
}

/// Convert an American price to its raw implied probability.
///
/// The result still contains the bookmaker's margin. Returns `None` for
/// zero or non-finite prices.
pub fn american_to_prob(price: f64) -> Option<f64> {
    if !price.is_finite() || price == 0.0 {
        return None;
    }
    if price < 0.0 {
        Some((-price) / ((-price) + 100.0))
    } else {
        Some(100.0 / (price + 100.0))
    }
}

/// Remove vig from a two-way market by normalizing both sides by their sum.
///
/// Assumes the margin is split proportionally across Over and Under.
pub fn devig_two_way(p_over_raw: Option<f64>, p_under_raw: Option<f64>) -> Option<DevigResult> {
    let (over, under) = (p_over_raw?, p_under_raw?);
    let sum = over + under;
    if !(sum > 0.0) {
        return None;
    }
    Some(DevigResult {
        p_over: over / sum,
        p_under: under / sum,
    })
}

/// Devig a pair of American prices in one step
pub fn devig_prices(over_price: Option<f64>, under_price: Option<f64>) -> Option<DevigResult> {
    devig_two_way(
        over_price.and_then(american_to_prob),
        under_price.and_then(american_to_prob),
    )
}

/// Devigged Over probability minus one half, or zero when the pair can't be devigged
pub fn juice_skew(over_price: Option<f64>, under_price: Option<f64>) -> f64 {
    devig_prices(over_price, under_price)
        .map(|dv| dv.p_over - 0.5)
        .unwrap_or(0.0)
}

/// Shift a quoted point by the juice skew.
///
/// With skew in [-0.5, 0.5] the shift never exceeds half of `juice_to_runs`.
#[inline]
pub fn adjusted_point(point: f64, skew: f64, juice_to_runs: f64) -> f64 {
    point + skew * juice_to_runs
}
