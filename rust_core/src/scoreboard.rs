//! Scoreboard and run-tally transforms over a scores-feed snapshot.

use crate::feeds::ScoreGame;
use crate::models::{GameStatus, RunTally, Scoreboard, ScoreboardItem};
use chrono::{DateTime, NaiveDate, Utc};

/// Situation tag shown under a scoreboard card
pub fn situation_tag(game: &ScoreGame) -> String {
    match game.status {
        GameStatus::Preview => "Scheduled".to_string(),
        GameStatus::Live => {
            let half = if game.is_top_inning.unwrap_or(false) {
                "Top"
            } else {
                "Bot"
            };
            let inning = game
                .current_inning
                .map(|i| i.to_string())
                .unwrap_or_else(|| "-".to_string());
            let outs = game.outs.unwrap_or(0);
            let plural = if outs == 1 { "" } else { "s" };
            format!("{} {}, {} out{}", half, inning, outs, plural)
        }
        GameStatus::Final => match game.inning_ordinal.as_deref() {
            // Extra innings keep the ordinal, e.g. "10th"
            Some(ord) if game.current_inning.map_or(false, |i| i > 9) => format!("F/{}", ord),
            _ => "F".to_string(),
        },
    }
}

/// Scoreboard ordered live, upcoming, finished; feed order kept within a state
pub fn build_scoreboard(date: NaiveDate, scores: &[ScoreGame], now: DateTime<Utc>) -> Scoreboard {
    let mut items: Vec<ScoreboardItem> = scores
        .iter()
        .map(|g| ScoreboardItem {
            id: g.game_id.clone(),
            away: g.away_label().to_string(),
            away_runs: g.away_runs,
            home: g.home_label().to_string(),
            home_runs: g.home_runs,
            state: g.status,
            tag: situation_tag(g),
        })
        .collect();
    items.sort_by_key(|item| item.state.board_rank());

    Scoreboard {
        date,
        items,
        last_update_utc: now,
    }
}

/// Total runs across every game of the date
pub fn tally_runs(date: NaiveDate, scores: &[ScoreGame], now: DateTime<Utc>) -> RunTally {
    RunTally {
        date,
        games_count: scores.len(),
        total_runs: scores.iter().map(|g| g.runs_now()).sum(),
        last_update_utc: now,
    }
}
