//! Season Data Collaborators
//!
//! Read-only snapshots consumed by the bracket engine: the team roster
//! (used for seeding and staleness detection) and the final standings.
//! Both are normalized into `SeasonData` at the boundary; nothing in the
//! core reaches back into loaders.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// One team as known to the league, independent of any bracket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamEntry {
    pub team_id: String,

    /// Full division name, e.g. "AL East".
    pub division: String,

    /// Explicit league tag; when absent the league is inferred from the
    /// division name (see `infer_league`).
    #[serde(default)]
    pub league: Option<String>,
}

/// Final regular-season line for one team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandingsRecord {
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub runs_for: i32,
    #[serde(default)]
    pub runs_against: i32,
}

impl StandingsRecord {
    pub fn run_diff(&self) -> i32 {
        self.runs_for - self.runs_against
    }
}

/// Authoritative league snapshot for one season.
#[derive(Debug, Clone, Default)]
pub struct SeasonData {
    pub teams: Vec<TeamEntry>,
    pub standings: BTreeMap<String, StandingsRecord>,
}

impl SeasonData {
    pub fn new(teams: Vec<TeamEntry>, standings: BTreeMap<String, StandingsRecord>) -> Self {
        Self { teams, standings }
    }

    /// Load teams and standings from JSON files.
    pub fn from_paths(teams_path: &Path, standings_path: &Path) -> Result<Self, StoreError> {
        let teams: Vec<TeamEntry> = serde_json::from_str(&std::fs::read_to_string(teams_path)?)?;
        let standings: BTreeMap<String, StandingsRecord> =
            serde_json::from_str(&std::fs::read_to_string(standings_path)?)?;
        Ok(Self { teams, standings })
    }

    /// `(wins, run_diff)` for a team, zeros when the team has no line.
    pub fn record_key(&self, team_id: &str) -> (u32, i32) {
        self.standings.get(team_id).map(|r| (r.wins, r.run_diff())).unwrap_or((0, 0))
    }
}

/// A seeded playoff participant.
///
/// `wins` and `run_diff` are snapshotted from the standings at seeding
/// time for display and tiebreaks; they are never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayoffTeam {
    pub team_id: String,

    /// Rank within the league's playoff field, 1 = best.
    pub seed: u8,

    pub league: String,
    pub wins: u32,

    #[serde(default)]
    pub run_diff: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_diff() {
        let record =
            StandingsRecord { wins: 90, losses: 72, runs_for: 750, runs_against: 680 };
        assert_eq!(record.run_diff(), 70);
    }

    #[test]
    fn test_record_key_missing_team() {
        let season = SeasonData::default();
        assert_eq!(season.record_key("GHOST"), (0, 0));
    }

    #[test]
    fn test_team_entry_optional_league() {
        let entry: TeamEntry =
            serde_json::from_str(r#"{"team_id": "NYY", "division": "AL East"}"#).unwrap();
        assert_eq!(entry.team_id, "NYY");
        assert!(entry.league.is_none());
    }
}
