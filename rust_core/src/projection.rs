//! Slate projection aggregator.
//!
//! Turns one odds-feed snapshot and one scores-feed snapshot into a
//! [`ProjectionSnapshot`]: per-game consensus from the line selector, team
//! matching to pick up live runs and state, then the slate rollup. Pure: the
//! same inputs and `now` always produce the same snapshot.
//!
//! Expected-remaining runs are clamped at zero per game before the slate sum,
//! so a game whose market total has already been exceeded contributes nothing
//! rather than pulling the slate finish down.

use crate::config::ProjectionConfig;
use crate::error::Result;
use crate::feeds::{OddsEvent, ScoreGame, MARKET_ALTERNATE_TOTALS, MARKET_TOTALS};
use crate::matching::GameMatcher;
use crate::median::{implied_median, AltLine};
use crate::models::{
    Band, GameConsensus, GameStatus, ProjectionSnapshot, SlateDiag, TwoNumberGame, TwoNumbers,
};
use crate::selection::{priced_quotes, select_lines, total_pairs};
use crate::utils::stats::{mean, sample_std_dev};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

pub const PROJECTION_SOURCE: &str = "The Odds API + MLB Stats API (live-aware, juice-adjusted)";

/// Events whose first pitch falls on the slate date
fn slate_events<'a>(
    odds: &'a [OddsEvent],
    config: &'a ProjectionConfig,
    slate_date: NaiveDate,
) -> impl Iterator<Item = &'a OddsEvent> + 'a {
    odds.iter()
        .filter(move |ev| config.slate_date(ev.commence_time) == slate_date)
}

/// State for an event with no scores-feed match
fn inferred_status(event: &OddsEvent, now: DateTime<Utc>) -> GameStatus {
    if event.has_started(now) {
        GameStatus::Live
    } else {
        GameStatus::Preview
    }
}

/// Build the consensus for one event, or `None` when it has no usable quote
pub fn game_consensus(
    event: &OddsEvent,
    scores: &[ScoreGame],
    now: DateTime<Utc>,
    config: &ProjectionConfig,
    matcher: &dyn GameMatcher,
) -> Option<GameConsensus> {
    let selection = select_lines(event, now, &config.line_policy());
    if selection.is_empty() {
        debug!(
            "Excluding {} @ {} ({}): no totals quotes",
            event.away_team, event.home_team, event.id
        );
        return None;
    }

    let matched = matcher.find_game(event, scores);
    if matched.is_none() {
        debug!(
            "{} found no scores-feed game for {} @ {}",
            matcher.matcher_name(),
            event.away_team,
            event.home_team
        );
    }
    let runs_so_far = matched.map(|g| g.runs_now()).unwrap_or(0);
    let status = matched
        .map(|g| g.status)
        .unwrap_or_else(|| inferred_status(event, now));

    let point_raw = mean(&selection.used_raw);
    let point_adjusted = mean(&selection.used_adj);
    let expected_remaining_raw = point_adjusted - runs_so_far as f64;

    Some(GameConsensus {
        game_id: event.id.clone(),
        home_team: event.home_team.clone(),
        away_team: event.away_team.clone(),
        commence_time: event.commence_time,
        status,
        bookmakers_count: selection.used_raw.len(),
        live_only: selection.live_only,
        point_raw,
        point_adjusted,
        dispersion: sample_std_dev(&selection.used_raw),
        runs_so_far,
        expected_remaining: expected_remaining_raw.max(0.0),
        expected_remaining_raw,
    })
}

/// Compute the slate projection from one snapshot of each feed.
///
/// `actual_runs_so_far` counts every scores-feed game of the slate, including
/// games the odds feed no longer lists (finished games usually drop off).
pub fn compute_projection(
    odds: &[OddsEvent],
    scores: &[ScoreGame],
    now: DateTime<Utc>,
    config: &ProjectionConfig,
    matcher: &dyn GameMatcher,
) -> Result<ProjectionSnapshot> {
    config.validate()?;
    let as_of_date = config.slate_date(now);

    let mut per_game = Vec::new();
    let mut diag = SlateDiag::default();
    for event in slate_events(odds, config, as_of_date) {
        match game_consensus(event, scores, now, config, matcher) {
            Some(game) => {
                match game.status {
                    GameStatus::Preview => diag.games_preview += 1,
                    GameStatus::Live => diag.games_live += 1,
                    GameStatus::Final => diag.games_final += 1,
                }
                per_game.push(game);
            }
            None => diag.excluded_events += 1,
        }
    }

    let total_projected: f64 = per_game.iter().map(|g| g.point_adjusted).sum();
    let total_dispersion = per_game
        .iter()
        .map(|g| g.dispersion.powi(2))
        .sum::<f64>()
        .sqrt();
    let actual_runs_so_far: u32 = scores.iter().map(|g| g.runs_now()).sum();
    let remaining_expected: f64 = per_game
        .iter()
        .filter(|g| g.status != GameStatus::Final)
        .map(|g| g.expected_remaining)
        .sum();

    Ok(ProjectionSnapshot {
        as_of_date,
        total_projected,
        total_dispersion,
        band: Band {
            low: total_projected - total_dispersion,
            high: total_projected + total_dispersion,
        },
        game_count_used: per_game.len(),
        per_game,
        actual_runs_so_far,
        remaining_expected,
        projected_finish: actual_runs_so_far as f64 + remaining_expected,
        computed_at_utc: now,
        diag,
        config: config.echo(),
        source: PROJECTION_SOURCE.to_string(),
    })
}

/// Mean of the per-bookmaker alternate-totals medians
fn alternate_median(event: &OddsEvent) -> Option<f64> {
    let medians: Vec<f64> = event
        .bookmakers
        .iter()
        .filter_map(|bk| bk.market(MARKET_ALTERNATE_TOTALS))
        .filter_map(|m| {
            let ladder: Vec<AltLine> = total_pairs(m).into_iter().map(AltLine::from).collect();
            implied_median(&ladder)
        })
        .collect();

    if medians.is_empty() {
        None
    } else {
        Some(mean(&medians))
    }
}

/// Actual runs plus projected finish over the matched games of the slate.
///
/// Every totals and alternate-totals pair counts toward the consensus with no
/// live/pregame selection. A game with no quotes projects its current runs.
pub fn compute_two_numbers(
    odds: &[OddsEvent],
    scores: &[ScoreGame],
    now: DateTime<Utc>,
    config: &ProjectionConfig,
    matcher: &dyn GameMatcher,
) -> Result<TwoNumbers> {
    config.validate()?;
    let slate_date = config.slate_date(now);

    let mut total_runs_scored = 0u32;
    let mut projected_slate_finish = 0.0;
    let mut games = Vec::new();

    for event in slate_events(odds, config, slate_date) {
        let Some(game) = matcher.find_game(event, scores) else {
            continue;
        };
        let runs = game.runs_now();
        let adjusted: Vec<f64> = priced_quotes(
            event,
            &[MARKET_TOTALS, MARKET_ALTERNATE_TOTALS],
            config.juice_to_runs,
        )
        .iter()
        .map(|q| q.adjusted_point)
        .collect();

        let consensus_total = if adjusted.is_empty() {
            runs as f64
        } else {
            mean(&adjusted)
        };
        let remaining = if game.status == GameStatus::Final {
            0.0
        } else {
            (consensus_total - runs as f64).max(0.0)
        };

        total_runs_scored += runs;
        projected_slate_finish += runs as f64 + remaining;
        games.push(TwoNumberGame {
            game_id: game.game_id.clone(),
            state: game.status,
            runs_so_far: runs,
            consensus_total,
            alt_median: alternate_median(event),
        });
    }

    Ok(TwoNumbers {
        total_runs_scored,
        projected_slate_finish,
        games,
    })
}
