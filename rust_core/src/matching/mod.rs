//! Game Matching Abstractions
//!
//! Defines the GameMatcher trait that pairs an odds-feed event with the
//! scores-feed game it describes. The aggregation math only talks to the
//! trait, so the name heuristics can be swapped for an explicit ID table.

use crate::feeds::{OddsEvent, ScoreGame};

// Concrete matcher implementations
pub mod team;

pub use team::{normalize_team, PrefixMatcher, TeamIdMatcher};

/// Pluggable event-to-game matcher
pub trait GameMatcher: Send + Sync {
    /// Find the scores-feed game for an odds event, if any
    fn find_game<'a>(&self, event: &OddsEvent, games: &'a [ScoreGame]) -> Option<&'a ScoreGame>;

    /// Matcher name for logging and debugging
    fn matcher_name(&self) -> &str;
}

/// Tries each matcher in order and returns the first hit
pub struct ChainedMatcher {
    matchers: Vec<Box<dyn GameMatcher>>,
}

impl ChainedMatcher {
    pub fn new(matchers: Vec<Box<dyn GameMatcher>>) -> Self {
        Self { matchers }
    }

    /// Add a matcher at the end of the chain
    pub fn register_matcher(&mut self, matcher: Box<dyn GameMatcher>) {
        self.matchers.push(matcher);
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl GameMatcher for ChainedMatcher {
    fn find_game<'a>(&self, event: &OddsEvent, games: &'a [ScoreGame]) -> Option<&'a ScoreGame> {
        self.matchers.iter().find_map(|m| m.find_game(event, games))
    }

    fn matcher_name(&self) -> &str {
        "ChainedMatcher"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GameStatus;
    use chrono::Utc;

    fn game(id: &str, home: &str, home_abbr: &str, away: &str, away_abbr: &str) -> ScoreGame {
        ScoreGame {
            game_id: id.to_string(),
            home_name: home.to_string(),
            home_abbr: Some(home_abbr.to_string()),
            away_name: away.to_string(),
            away_abbr: Some(away_abbr.to_string()),
            status: GameStatus::Preview,
            detailed_state: None,
            home_runs: 0,
            away_runs: 0,
            current_inning: None,
            inning_ordinal: None,
            is_top_inning: None,
            outs: None,
        }
    }

    #[test]
    fn test_chain_falls_through_to_prefix() {
        let games = vec![game("g1", "Chicago Cubs", "CHC", "Milwaukee Brewers", "MIL")];
        let event = OddsEvent {
            id: "e1".to_string(),
            commence_time: Utc::now(),
            home_team: "Chicago Cubs".to_string(),
            away_team: "Milwaukee Brewers".to_string(),
            bookmakers: vec![],
        };

        let chain = ChainedMatcher::new(vec![
            Box::new(TeamIdMatcher::new()),
            Box::new(PrefixMatcher::default()),
        ]);
        assert_eq!(chain.len(), 2);
        let found = chain.find_game(&event, &games).unwrap();
        assert_eq!(found.game_id, "g1");
    }
}
