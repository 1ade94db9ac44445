//! Per-event line selection.
//!
//! Every bookmaker's totals market is split into Over/Under pairs sharing a
//! point, each pair is juice-adjusted, and the event keeps two pools: every
//! quote, and the live-fresh ones. Once an event is under way and at least one
//! live-fresh quote exists, that pool fully replaces the pregame pool.

use crate::feeds::{OddsEvent, OddsMarket, MARKET_TOTALS};
use crate::median::AltLine;
use crate::odds::{adjusted_point, juice_skew};
use chrono::{DateTime, Duration, Utc};

/// Knobs the selector needs from the projection config
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePolicy {
    pub juice_to_runs: f64,
    /// Max quote age for a quote to count as live-fresh
    pub live_recent: Duration,
}

/// Over/Under prices quoted at one point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalPair {
    pub point: f64,
    pub over_price: Option<f64>,
    pub under_price: Option<f64>,
}

impl From<TotalPair> for AltLine {
    fn from(pair: TotalPair) -> Self {
        AltLine {
            point: pair.point,
            over_price: pair.over_price,
            under_price: pair.under_price,
        }
    }
}

/// A juice-adjusted quote from one bookmaker
#[derive(Debug, Clone, PartialEq)]
pub struct PricedQuote {
    pub bookmaker: String,
    pub point: f64,
    pub adjusted_point: f64,
    pub last_update: Option<DateTime<Utc>>,
}

/// The quotes chosen for an event's consensus
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineSelection {
    pub used_raw: Vec<f64>,
    pub used_adj: Vec<f64>,
    /// Size of the all-quotes pool before the policy was applied
    pub total_quotes: usize,
    pub live_only: bool,
}

impl LineSelection {
    pub fn is_empty(&self) -> bool {
        self.used_raw.is_empty()
    }
}

fn is_side(name: &str, side: &str) -> bool {
    name.to_lowercase().contains(side)
}

/// Group a market's outcomes into Over/Under pairs keyed by point.
///
/// Pairs keep first-seen order. Outcomes with no point are ignored, and a
/// side without a counterpart leaves the other price empty.
pub fn total_pairs(market: &OddsMarket) -> Vec<TotalPair> {
    let mut pairs: Vec<TotalPair> = Vec::new();

    for outcome in &market.outcomes {
        let Some(point) = outcome.point else {
            continue;
        };
        let is_over = is_side(&outcome.name, "over");
        let is_under = !is_over && is_side(&outcome.name, "under");
        if !is_over && !is_under {
            continue;
        }

        let idx = match pairs.iter().position(|p| p.point == point) {
            Some(idx) => idx,
            None => {
                pairs.push(TotalPair {
                    point,
                    over_price: None,
                    under_price: None,
                });
                pairs.len() - 1
            }
        };

        let pair = &mut pairs[idx];
        if is_over && pair.over_price.is_none() {
            pair.over_price = outcome.price;
        } else if is_under && pair.under_price.is_none() {
            pair.under_price = outcome.price;
        }
    }

    pairs
}

/// Price every pair of the given markets across all bookmakers
pub fn priced_quotes(event: &OddsEvent, market_keys: &[&str], juice_to_runs: f64) -> Vec<PricedQuote> {
    let mut quotes = Vec::new();
    for bookmaker in &event.bookmakers {
        for market in bookmaker
            .markets
            .iter()
            .filter(|m| market_keys.contains(&m.key.as_str()))
        {
            let last_update = market.last_update.or(bookmaker.last_update);
            for pair in total_pairs(market) {
                let skew = juice_skew(pair.over_price, pair.under_price);
                quotes.push(PricedQuote {
                    bookmaker: bookmaker.key.clone(),
                    point: pair.point,
                    adjusted_point: adjusted_point(pair.point, skew, juice_to_runs),
                    last_update,
                });
            }
        }
    }
    quotes
}

/// Whether a quote updated recently enough to trust during play
pub fn is_live_fresh(last_update: Option<DateTime<Utc>>, now: DateTime<Utc>, live_recent: Duration) -> bool {
    match last_update {
        Some(ts) => now - ts <= live_recent,
        None => false,
    }
}

/// Choose the quotes behind an event's consensus total
pub fn select_lines(event: &OddsEvent, now: DateTime<Utc>, policy: &LinePolicy) -> LineSelection {
    let started = event.has_started(now);
    let quotes = priced_quotes(event, &[MARKET_TOTALS], policy.juice_to_runs);

    let (live, _): (Vec<&PricedQuote>, Vec<&PricedQuote>) = quotes
        .iter()
        .partition(|q| started && is_live_fresh(q.last_update, now, policy.live_recent));

    let live_only = started && !live.is_empty();
    let used: Vec<&PricedQuote> = if live_only {
        live
    } else {
        quotes.iter().collect()
    };

    LineSelection {
        used_raw: used.iter().map(|q| q.point).collect(),
        used_adj: used.iter().map(|q| q.adjusted_point).collect(),
        total_quotes: quotes.len(),
        live_only,
    }
}
