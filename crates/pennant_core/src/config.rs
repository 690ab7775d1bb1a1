//! Playoff Configuration
//!
//! One immutable `PlayoffSettings` value is constructed at the boundary
//! (from JSON or defaults) and threaded through seeding, topology and
//! advancement. Malformed series settings never surface to callers:
//! the resolver falls back to the built-in length and pattern tables.

use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::bracket::SeriesConfig;
use crate::store::StoreError;

/// Default number of playoff slots per league.
pub const DEFAULT_PLAYOFF_TEAMS_PER_LEAGUE: usize = 6;

/// Built-in series lengths per stage.
static DEFAULT_SERIES_LENGTHS: Lazy<BTreeMap<StageKey, u8>> = Lazy::new(|| {
    BTreeMap::from([
        (StageKey::Wildcard, 3),
        (StageKey::Division, 5),
        (StageKey::Championship, 7),
        (StageKey::Final, 7),
    ])
});

/// Built-in home/away patterns per series length.
static DEFAULT_HOME_AWAY_PATTERNS: Lazy<BTreeMap<u8, Vec<u8>>> = Lazy::new(|| {
    BTreeMap::from([(3, vec![1, 1, 1]), (5, vec![2, 2, 1]), (7, vec![2, 3, 2])])
});

/// Stage of a postseason series.
///
/// Round names carry the stage as their trailing token ("AL DS", "WS"),
/// which is how a loaded bracket is re-associated with its settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKey {
    Wildcard,
    Division,
    Championship,
    Final,
}

impl StageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKey::Wildcard => "wildcard",
            StageKey::Division => "division",
            StageKey::Championship => "championship",
            StageKey::Final => "final",
        }
    }

    /// Classify a round name by its most specific token.
    ///
    /// Tokens are scanned right-to-left so "AL DS" resolves from "DS",
    /// not from the league tag. Hyphenated spellings like "play-in"
    /// match once their separators are collapsed.
    pub fn from_round_name(name: &str) -> Option<StageKey> {
        fn classify(token: &str) -> Option<StageKey> {
            match token {
                "ws" | "world" | "worlds" | "final" | "finals" | "championship" => {
                    Some(StageKey::Final)
                }
                "cs" | "lcs" => Some(StageKey::Championship),
                "ds" | "division" | "divisional" => Some(StageKey::Division),
                "wc" | "wildcard" | "playin" => Some(StageKey::Wildcard),
                _ => None,
            }
        }

        let normalized = name.to_ascii_lowercase();
        for token in normalized.split([' ', '-', '_']).rev() {
            if let Some(stage) = classify(token) {
                return Some(stage);
            }
        }
        for word in normalized.split_whitespace().rev() {
            let collapsed: String =
                word.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
            if let Some(stage) = classify(&collapsed) {
                return Some(stage);
            }
        }
        None
    }
}

/// Immutable postseason configuration.
///
/// All fields have serde defaults so a partial settings file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayoffSettings {
    /// Desired playoff slots per league (upper bound, see seeding rules).
    pub num_playoff_teams_per_league: usize,

    /// When true, division winners are seeded ahead of all wildcards.
    /// When false, the league is ranked flat.
    pub division_winners_priority: bool,

    /// Configured series length per stage; missing/invalid entries fall
    /// back to the built-in defaults.
    pub series_lengths: BTreeMap<StageKey, u8>,

    /// Configured home/away pattern per series length. A pattern is
    /// accepted only when its blocks sum to the length.
    pub home_away_patterns: BTreeMap<u8, Vec<u8>>,

    /// Explicit division -> league mapping. Divisions not listed fall
    /// back to the first whitespace token of the division name.
    pub division_to_league: BTreeMap<String, String>,
}

impl Default for PlayoffSettings {
    fn default() -> Self {
        Self {
            num_playoff_teams_per_league: DEFAULT_PLAYOFF_TEAMS_PER_LEAGUE,
            division_winners_priority: true,
            series_lengths: BTreeMap::new(),
            home_away_patterns: BTreeMap::new(),
            division_to_league: BTreeMap::new(),
        }
    }
}

impl PlayoffSettings {
    /// Load settings from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let data = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&data)?;
        Ok(settings)
    }

    /// Resolved series length for a stage.
    pub fn series_length(&self, stage: StageKey) -> u8 {
        let configured = self.series_lengths.get(&stage).copied().unwrap_or(0);
        if configured > 0 {
            configured
        } else {
            DEFAULT_SERIES_LENGTHS.get(&stage).copied().unwrap_or(7)
        }
    }
}

/// Resolve the home/away pattern for a series length.
///
/// Fallback ladder: configured pattern (must sum to the length) ->
/// built-in table -> single block at the higher seed's park.
pub fn pattern_for_length(length: u8, settings: &PlayoffSettings) -> Vec<u8> {
    if let Some(pattern) = settings.home_away_patterns.get(&length) {
        if !pattern.is_empty() && pattern.iter().map(|b| *b as u32).sum::<u32>() == length as u32 {
            return pattern.clone();
        }
    }
    if let Some(fallback) = DEFAULT_HOME_AWAY_PATTERNS.get(&length) {
        return fallback.clone();
    }
    if length > 0 {
        vec![length]
    } else {
        Vec::new()
    }
}

/// Resolve the full series configuration for a stage.
pub fn series_config_for(stage: StageKey, settings: &PlayoffSettings) -> SeriesConfig {
    let length = settings.series_length(stage);
    SeriesConfig { length, pattern: pattern_for_length(length, settings) }
}
