//! Bracket Data Model
//!
//! The persisted shapes for a postseason: best-of-N series configs, game
//! results, matchups, rounds with deferred plan entries, and the root
//! `PlayoffBracket` aggregate. A matchup's winner is always *derived* by
//! replaying its recorded games; there is no independent win counter to
//! drift out of sync, which is what makes resume-after-crash safe.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::StageKey;
use crate::models::PlayoffTeam;

/// Best-of-N series shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Total scheduled games; odd, wins needed = length / 2 + 1.
    pub length: u8,

    /// Consecutive home stands, alternating starting at the higher
    /// seed's park. Best-of-7 2-3-2 -> `[2, 3, 2]`.
    pub pattern: Vec<u8>,
}

impl SeriesConfig {
    pub fn wins_needed(&self) -> u32 {
        u32::from(self.length) / 2 + 1
    }

    /// Whether the pattern blocks sum to the series length.
    pub fn pattern_is_valid(&self) -> bool {
        !self.pattern.is_empty()
            && self.pattern.iter().map(|b| u32::from(*b)).sum::<u32>() == u32::from(self.length)
    }
}

/// One recorded game inside a series.
///
/// Games are appended in order and never removed: the n-th entry
/// occupies the n-th slot of the expanded home/away pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub home: String,
    pub away: String,

    #[serde(default)]
    pub date: Option<String>,

    /// `"<home_runs>-<away_runs>"`, absent while unplayed.
    #[serde(default)]
    pub result: Option<String>,

    /// Relative path to a saved boxscore artifact.
    #[serde(default)]
    pub boxscore: Option<String>,

    /// Free-form oracle metadata.
    #[serde(default)]
    pub meta: BTreeMap<String, serde_json::Value>,
}

impl GameResult {
    /// Parse the recorded score, `None` when absent or malformed.
    pub fn score(&self) -> Option<(u32, u32)> {
        let raw = self.result.as_deref()?;
        let (home, away) = raw.split_once('-')?;
        Some((home.trim().parse().ok()?, away.trim().parse().ok()?))
    }

    /// Winning team id; ties and unplayed games credit neither side.
    pub fn winner_id(&self) -> Option<&str> {
        let (home_runs, away_runs) = self.score()?;
        if home_runs > away_runs {
            Some(&self.home)
        } else if away_runs > home_runs {
            Some(&self.away)
        } else {
            None
        }
    }
}

/// A best-of-N series between two seeded teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    /// Higher seed, owns home-field advantage in the pattern.
    pub high: PlayoffTeam,
    pub low: PlayoffTeam,
    pub config: SeriesConfig,

    #[serde(default)]
    pub games: Vec<GameResult>,

    /// Derived field: recomputed from `games`, never trusted on read.
    #[serde(default)]
    pub winner: Option<String>,
}

impl Matchup {
    pub fn new(high: PlayoffTeam, low: PlayoffTeam, config: SeriesConfig) -> Self {
        Self { high, low, config, games: Vec::new(), winner: None }
    }

    /// Series wins per side, replayed from the recorded games.
    pub fn series_wins(&self) -> (u32, u32) {
        let mut high_wins = 0;
        let mut low_wins = 0;
        for game in &self.games {
            match game.winner_id() {
                Some(id) if id == self.high.team_id => high_wins += 1,
                Some(id) if id == self.low.team_id => low_wins += 1,
                _ => {}
            }
        }
        (high_wins, low_wins)
    }

    /// Re-derive the winner from the games under the current config.
    pub fn recompute_winner(&mut self) {
        let needed = self.config.wins_needed();
        let (high_wins, low_wins) = self.series_wins();
        self.winner = if high_wins >= needed {
            Some(self.high.team_id.clone())
        } else if low_wins >= needed {
            Some(self.low.team_id.clone())
        } else {
            None
        };
    }

    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }

    /// Both participants materialized (non-empty team ids).
    pub fn is_ready(&self) -> bool {
        !self.high.team_id.is_empty() && !self.low.team_id.is_empty()
    }

    /// Home team id for every scheduled slot, pattern expanded.
    pub fn home_order(&self) -> Vec<&str> {
        let mut slots = Vec::with_capacity(self.config.length as usize);
        let mut at_high = true;
        for block in &self.config.pattern {
            for _ in 0..*block {
                slots.push(if at_high {
                    self.high.team_id.as_str()
                } else {
                    self.low.team_id.as_str()
                });
            }
            at_high = !at_high;
        }
        slots
    }

    /// The losing side of a decided matchup.
    pub fn runner_up_id(&self) -> Option<&str> {
        let winner = self.winner.as_deref()?;
        if winner == self.high.team_id {
            Some(&self.low.team_id)
        } else {
            Some(&self.high.team_id)
        }
    }
}

/// Forward reference to a not-yet-materialized participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParticipantRef {
    /// A known seeded team.
    Seed { league: String, seed: u8 },

    /// Winner of a specific matchup in a named round, once decided.
    Winner { source_round: String, slot: usize },
}

/// A matchup that will exist once both sources resolve.
///
/// Entries stay in place after resolving; resolution is idempotent via
/// the set of already-materialized team-id pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundPlanEntry {
    /// Stage controlling which series config the matchup gets.
    pub series_key: StageKey,
    pub sources: Vec<ParticipantRef>,
}

/// A named stage holding concurrent matchups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// Stage-coded name, e.g. "AL DS" or "WS".
    pub name: String,

    #[serde(default)]
    pub matchups: Vec<Matchup>,

    #[serde(default)]
    pub plan: Vec<RoundPlanEntry>,
}

impl Round {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), matchups: Vec::new(), plan: Vec::new() }
    }

    pub fn has_content(&self) -> bool {
        !self.matchups.is_empty() || !self.plan.is_empty()
    }

    pub fn is_decided(&self) -> bool {
        !self.matchups.is_empty() && self.matchups.iter().all(Matchup::is_decided)
    }

    /// Indices of matchups that are materialized but not yet decided.
    pub fn pending_matchups(&self) -> Vec<usize> {
        self.matchups
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_decided() && m.is_ready())
            .map(|(i, _)| i)
            .collect()
    }
}

/// Root aggregate and single unit of persistence for one postseason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayoffBracket {
    pub schema_version: u32,
    pub year: i32,

    #[serde(default)]
    pub champion: Option<String>,

    #[serde(default)]
    pub runner_up: Option<String>,

    /// Seed lists per league, retained for the bracket's lifetime so
    /// later seed-based plan references can resolve.
    #[serde(rename = "seeds", default)]
    pub seeds_by_league: BTreeMap<String, Vec<PlayoffTeam>>,

    /// Earlier rounds first; advancement scans for the first round with
    /// pending matchups rather than assuming strict ordering.
    #[serde(default)]
    pub rounds: Vec<Round>,
}

impl PlayoffBracket {
    pub fn new(year: i32) -> Self {
        Self {
            schema_version: crate::store::SCHEMA_VERSION,
            year,
            champion: None,
            runner_up: None,
            seeds_by_league: BTreeMap::new(),
            rounds: Vec::new(),
        }
    }

    pub fn round(&self, name: &str) -> Option<&Round> {
        self.rounds.iter().find(|r| r.name == name)
    }

    pub fn round_mut(&mut self, name: &str) -> Option<&mut Round> {
        self.rounds.iter_mut().find(|r| r.name == name)
    }

    /// Seeded team for a league/seed pair.
    pub fn seeded_team(&self, league: &str, seed: u8) -> Option<&PlayoffTeam> {
        self.seeds_by_league.get(league)?.iter().find(|t| t.seed == seed)
    }

    /// Every team id referenced by seeds or matchups. Empty ids are
    /// preserved so staleness checks can flag them.
    pub fn referenced_team_ids(&self) -> BTreeSet<String> {
        let mut ids = BTreeSet::new();
        for seeds in self.seeds_by_league.values() {
            for team in seeds {
                ids.insert(team.team_id.clone());
            }
        }
        for round in &self.rounds {
            for matchup in &round.matchups {
                ids.insert(matchup.high.team_id.clone());
                ids.insert(matchup.low.team_id.clone());
            }
        }
        ids
    }

    /// Rounds for presentation.
    ///
    /// Single-league brackets get a synthetic "Final" view aliasing the
    /// league final's matchups. The alias is derived on read and never
    /// persisted; champion resolution ignores it.
    pub fn display_rounds(&self) -> Vec<Round> {
        let mut rounds = self.rounds.clone();
        let final_rounds = self
            .rounds
            .iter()
            .filter(|r| StageKey::from_round_name(&r.name) == Some(StageKey::Final))
            .count();
        if final_rounds == 0 && self.seeds_by_league.len() == 1 {
            if let Some(league_final) = self
                .rounds
                .iter()
                .rev()
                .find(|r| StageKey::from_round_name(&r.name) == Some(StageKey::Championship))
            {
                let mut alias = Round::new("Final");
                alias.matchups = league_final.matchups.clone();
                rounds.push(alias);
            }
        }
        rounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str, seed: u8) -> PlayoffTeam {
        PlayoffTeam {
            team_id: id.to_string(),
            seed,
            league: "AL".to_string(),
            wins: 90,
            run_diff: 0,
        }
    }

    fn best_of(length: u8, pattern: Vec<u8>) -> SeriesConfig {
        SeriesConfig { length, pattern }
    }

    #[test]
    fn test_wins_needed() {
        assert_eq!(best_of(3, vec![1, 1, 1]).wins_needed(), 2);
        assert_eq!(best_of(5, vec![2, 2, 1]).wins_needed(), 3);
        assert_eq!(best_of(7, vec![2, 3, 2]).wins_needed(), 4);
    }

    #[test]
    fn test_game_result_parsing() {
        let mut game = GameResult {
            home: "NYY".to_string(),
            away: "BOS".to_string(),
            date: None,
            result: Some("4-2".to_string()),
            boxscore: None,
            meta: BTreeMap::new(),
        };
        assert_eq!(game.score(), Some((4, 2)));
        assert_eq!(game.winner_id(), Some("NYY"));

        game.result = Some("3-3".to_string());
        assert_eq!(game.winner_id(), None);

        game.result = Some("garbage".to_string());
        assert_eq!(game.score(), None);

        game.result = None;
        assert_eq!(game.score(), None);
    }

    #[test]
    fn test_home_order_expands_pattern() {
        let matchup = Matchup::new(team("NYY", 1), team("BOS", 2), best_of(7, vec![2, 3, 2]));
        assert_eq!(
            matchup.home_order(),
            vec!["NYY", "NYY", "BOS", "BOS", "BOS", "NYY", "NYY"]
        );
    }

    #[test]
    fn test_winner_derived_before_all_slots_filled() {
        // Best-of-5: higher seed takes games 1-3, series over at 3 games.
        let mut matchup = Matchup::new(team("NYY", 1), team("BOS", 2), best_of(5, vec![2, 2, 1]));
        let homes = ["NYY", "NYY", "BOS"];
        for home in homes {
            let (away, result) =
                if home == "NYY" { ("BOS", "5-1") } else { ("NYY", "2-6") };
            matchup.games.push(GameResult {
                home: home.to_string(),
                away: away.to_string(),
                date: None,
                result: Some(result.to_string()),
                boxscore: None,
                meta: BTreeMap::new(),
            });
        }
        matchup.recompute_winner();
        assert_eq!(matchup.winner.as_deref(), Some("NYY"));
        assert_eq!(matchup.games.len(), 3);
    }

    #[test]
    fn test_recompute_clears_stale_winner() {
        let mut matchup = Matchup::new(team("NYY", 1), team("BOS", 2), best_of(5, vec![2, 2, 1]));
        matchup.winner = Some("NYY".to_string());
        matchup.recompute_winner();
        assert_eq!(matchup.winner, None);
    }

    #[test]
    fn test_participant_ref_serde_shape() {
        let seed_ref = ParticipantRef::Seed { league: "AL".to_string(), seed: 1 };
        let json = serde_json::to_value(&seed_ref).unwrap();
        assert_eq!(json["kind"], "seed");
        assert_eq!(json["league"], "AL");

        let winner_ref =
            ParticipantRef::Winner { source_round: "AL WC".to_string(), slot: 0 };
        let json = serde_json::to_value(&winner_ref).unwrap();
        assert_eq!(json["kind"], "winner");
        assert_eq!(json["source_round"], "AL WC");

        let parsed: ParticipantRef = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, winner_ref);
    }

    #[test]
    fn test_seeds_serialize_under_seeds_key() {
        let mut bracket = PlayoffBracket::new(2025);
        bracket.seeds_by_league.insert("AL".to_string(), vec![team("NYY", 1)]);
        let json = serde_json::to_value(&bracket).unwrap();
        assert!(json.get("seeds").is_some());
        assert!(json.get("seeds_by_league").is_none());
    }
}
