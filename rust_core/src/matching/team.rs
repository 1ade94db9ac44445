//! Team matchers
//!
//! Two ways of pairing an odds event with a scores-feed game:
//! - `PrefixMatcher`: normalized name-prefix containment on both sides
//! - `TeamIdMatcher`: explicit odds-name -> abbreviation table (JSON)

use super::GameMatcher;
use crate::error::{ProjectionError, Result};
use crate::feeds::{OddsEvent, ScoreGame};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Lowercase and keep ASCII letters only ("St. Louis" -> "stlouis")
pub fn normalize_team(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Matches when each side's normalized name + abbreviation contains the first
/// `key_len` normalized characters of the odds event's team name.
#[derive(Debug, Clone, Copy)]
pub struct PrefixMatcher {
    key_len: usize,
}

impl PrefixMatcher {
    pub fn new(key_len: usize) -> Self {
        Self { key_len }
    }

    fn key(&self, team: &str) -> String {
        normalize_team(team).chars().take(self.key_len).collect()
    }

    fn side_matches(name: &str, abbr: Option<&str>, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        let mut haystack = normalize_team(name);
        haystack.push_str(&normalize_team(abbr.unwrap_or_default()));
        haystack.contains(key)
    }
}

impl Default for PrefixMatcher {
    fn default() -> Self {
        Self::new(6)
    }
}

impl GameMatcher for PrefixMatcher {
    fn find_game<'a>(&self, event: &OddsEvent, games: &'a [ScoreGame]) -> Option<&'a ScoreGame> {
        let home_key = self.key(&event.home_team);
        let away_key = self.key(&event.away_team);

        games.iter().find(|g| {
            Self::side_matches(&g.home_name, g.home_abbr.as_deref(), &home_key)
                && Self::side_matches(&g.away_name, g.away_abbr.as_deref(), &away_key)
        })
    }

    fn matcher_name(&self) -> &str {
        "PrefixMatcher"
    }
}

/// Explicit mapping from odds-feed team names to scores-feed abbreviations.
#[derive(Debug, Clone, Default)]
pub struct TeamIdMatcher {
    /// normalized odds name -> uppercase abbreviation
    ids: HashMap<String, String>,
}

impl TeamIdMatcher {
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
        }
    }

    /// Parse a flat JSON object: `{ "New York Yankees": "NYY", ... }`
    pub fn from_json(content: &str) -> Result<Self> {
        let data: HashMap<String, String> = serde_json::from_str(content)
            .map_err(|e| ProjectionError::ConfigInvalid(format!("team map: {}", e)))?;

        let mut matcher = Self::new();
        for (name, abbr) in data {
            matcher.insert(&name, &abbr);
        }
        Ok(matcher)
    }

    /// Load the table from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ProjectionError::ConfigInvalid(format!("team map {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn insert(&mut self, odds_name: &str, abbr: &str) {
        self.ids
            .insert(normalize_team(odds_name), abbr.trim().to_uppercase());
    }

    pub fn abbr_for(&self, odds_name: &str) -> Option<&str> {
        self.ids.get(&normalize_team(odds_name)).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

fn abbr_eq(abbr: Option<&str>, expected: &str) -> bool {
    abbr.map(|a| a.eq_ignore_ascii_case(expected)).unwrap_or(false)
}

impl GameMatcher for TeamIdMatcher {
    fn find_game<'a>(&self, event: &OddsEvent, games: &'a [ScoreGame]) -> Option<&'a ScoreGame> {
        let home = self.abbr_for(&event.home_team)?;
        let away = self.abbr_for(&event.away_team)?;

        games
            .iter()
            .find(|g| abbr_eq(g.home_abbr.as_deref(), home) && abbr_eq(g.away_abbr.as_deref(), away))
    }

    fn matcher_name(&self) -> &str {
        "TeamIdMatcher"
    }
}
