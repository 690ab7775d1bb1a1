//! Seeding Engine
//!
//! Ranks a league's teams from final standings, picks division winners
//! and wildcards, computes the playoff slot count and emits the ordered
//! seed list. Ranking is fully deterministic: `(wins, run_diff)`
//! descending with team id ascending as the explicit tiebreak, so seed
//! order never depends on upstream load order.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::config::PlayoffSettings;
use crate::models::{PlayoffTeam, SeasonData, TeamEntry};

/// League tag for a division: explicit mapping first, then the first
/// whitespace token of the division name ("AL East" -> "AL").
pub fn infer_league(division: &str, mapping: &BTreeMap<String, String>) -> String {
    if let Some(league) = mapping.get(division) {
        return league.clone();
    }
    let trimmed = division.trim();
    match trimmed.split_whitespace().next() {
        Some(token) if token.len() < trimmed.len() => token.to_string(),
        _ => String::new(),
    }
}

/// Sort key: best record first, ties broken by team id.
fn rank_key(team: &TeamEntry, season: &SeasonData) -> (Reverse<u32>, Reverse<i32>, String) {
    let (wins, run_diff) = season.record_key(&team.team_id);
    (Reverse(wins), Reverse(run_diff), team.team_id.clone())
}

/// Seed one league's playoff field.
///
/// Returns seeds 1..=slots, or an empty list when fewer than two teams
/// are eligible (such a league contributes no rounds).
pub fn seed_league(
    league_name: &str,
    league_teams: &[TeamEntry],
    season: &SeasonData,
    settings: &PlayoffSettings,
) -> Vec<PlayoffTeam> {
    if league_teams.len() < 2 {
        return Vec::new();
    }

    // Division winners: best record in each division group.
    let mut by_division: BTreeMap<&str, Vec<&TeamEntry>> = BTreeMap::new();
    for team in league_teams {
        by_division.entry(team.division.as_str()).or_default().push(team);
    }

    let mut winners: Vec<&TeamEntry> = Vec::new();
    for members in by_division.values() {
        if let Some(winner) = members.iter().min_by_key(|t| rank_key(t, season)) {
            winners.push(winner);
        }
    }
    winners.sort_by_key(|t| rank_key(t, season));

    let winner_count = winners.len();
    let mut wildcards: Vec<&TeamEntry> = league_teams
        .iter()
        .filter(|t| !winners.iter().any(|w| w.team_id == t.team_id))
        .collect();
    wildcards.sort_by_key(|t| rank_key(t, season));

    let total_candidates = league_teams.len();
    let named_divisions = by_division.keys().filter(|d| !d.trim().is_empty()).count();
    let division_count = if named_divisions > 0 { named_divisions } else { 1 };

    // Slot arithmetic: one slot per division plus at most one wildcard,
    // bounded by the configured count; never below the winner count,
    // never above the eligible field, minimum two.
    let base_slots = division_count.min(total_candidates).max(winner_count);
    let wildcard_bonus = usize::from(!wildcards.is_empty()).min(total_candidates - base_slots);
    let desired = base_slots + wildcard_bonus;

    let configured = settings.num_playoff_teams_per_league;
    let upper = if configured > 0 { configured.min(total_candidates) } else { total_candidates };

    let mut slots = desired.min(upper).max(winner_count);
    if slots < 2 {
        slots = 2.min(total_candidates);
    }

    let pool: Vec<&TeamEntry> = if settings.division_winners_priority {
        winners.into_iter().chain(wildcards).collect()
    } else {
        let mut flat: Vec<&TeamEntry> = league_teams.iter().collect();
        flat.sort_by_key(|t| rank_key(t, season));
        flat
    };

    let seeded: Vec<PlayoffTeam> = pool
        .into_iter()
        .take(slots)
        .enumerate()
        .map(|(index, team)| {
            let (wins, run_diff) = season.record_key(&team.team_id);
            PlayoffTeam {
                team_id: team.team_id.clone(),
                seed: (index + 1) as u8,
                league: league_name.to_string(),
                wins,
                run_diff,
            }
        })
        .collect();

    log::debug!(
        "seeded {} with {} of {} teams ({} division winners)",
        league_name,
        seeded.len(),
        total_candidates,
        winner_count
    );
    seeded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StandingsRecord;

    fn entry(id: &str, division: &str) -> TeamEntry {
        TeamEntry { team_id: id.to_string(), division: division.to_string(), league: None }
    }

    fn season(lines: &[(&str, u32, i32)]) -> SeasonData {
        let standings = lines
            .iter()
            .map(|(id, wins, diff)| {
                (
                    id.to_string(),
                    StandingsRecord {
                        wins: *wins,
                        losses: 162 - *wins,
                        runs_for: *diff,
                        runs_against: 0,
                    },
                )
            })
            .collect();
        SeasonData { teams: Vec::new(), standings }
    }

    fn two_division_league() -> (Vec<TeamEntry>, SeasonData) {
        let teams = vec![
            entry("NYY", "AL East"),
            entry("BOS", "AL East"),
            entry("TOR", "AL East"),
            entry("HOU", "AL West"),
            entry("SEA", "AL West"),
            entry("TEX", "AL West"),
        ];
        let season = season(&[
            ("NYY", 98, 120),
            ("BOS", 92, 60),
            ("TOR", 85, 10),
            ("HOU", 95, 90),
            ("SEA", 88, 30),
            ("TEX", 70, -80),
        ]);
        (teams, season)
    }

    #[test]
    fn test_division_winners_lead_the_field() {
        let (teams, season) = two_division_league();
        let seeds = seed_league("AL", &teams, &season, &PlayoffSettings::default());
        // Two division winners plus one wildcard.
        assert_eq!(seeds.len(), 3);
        assert_eq!(seeds[0].team_id, "NYY");
        assert_eq!(seeds[1].team_id, "HOU");
        assert_eq!(seeds[2].team_id, "BOS");
        assert_eq!(seeds.iter().map(|t| t.seed).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_flat_ranking_when_priority_disabled() {
        let (teams, season) = two_division_league();
        let settings = PlayoffSettings {
            division_winners_priority: false,
            ..PlayoffSettings::default()
        };
        let seeds = seed_league("AL", &teams, &season, &settings);
        assert_eq!(seeds[0].team_id, "NYY");
        assert_eq!(seeds[1].team_id, "HOU");
        assert_eq!(seeds[2].team_id, "BOS");
    }

    #[test]
    fn test_configured_slot_cap() {
        let (teams, season) = two_division_league();
        let settings =
            PlayoffSettings { num_playoff_teams_per_league: 2, ..PlayoffSettings::default() };
        let seeds = seed_league("AL", &teams, &season, &settings);
        // Capped at 2, but never below the division winner count.
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].team_id, "NYY");
        assert_eq!(seeds[1].team_id, "HOU");
    }

    #[test]
    fn test_tiny_league_yields_nothing() {
        let teams = vec![entry("NYY", "AL East")];
        let season = season(&[("NYY", 98, 120)]);
        assert!(seed_league("AL", &teams, &season, &PlayoffSettings::default()).is_empty());
    }

    #[test]
    fn test_identical_records_break_on_team_id() {
        let teams = vec![entry("BBB", "AL East"), entry("AAA", "AL East")];
        let season = season(&[("AAA", 90, 50), ("BBB", 90, 50)]);
        let seeds = seed_league("AL", &teams, &season, &PlayoffSettings::default());
        assert_eq!(seeds[0].team_id, "AAA");
        assert_eq!(seeds[1].team_id, "BBB");
    }

    #[test]
    fn test_snapshot_carries_standings_values() {
        let (teams, season) = two_division_league();
        let seeds = seed_league("AL", &teams, &season, &PlayoffSettings::default());
        assert_eq!(seeds[0].wins, 98);
        assert_eq!(seeds[0].run_diff, 120);
        assert_eq!(seeds[0].league, "AL");
    }

    #[test]
    fn test_infer_league() {
        let mut mapping = BTreeMap::new();
        mapping.insert("Pacific".to_string(), "PL".to_string());
        assert_eq!(infer_league("Pacific", &mapping), "PL");
        assert_eq!(infer_league("AL East", &BTreeMap::new()), "AL");
        assert_eq!(infer_league("Central", &BTreeMap::new()), "");
        assert_eq!(infer_league("", &BTreeMap::new()), "");
    }
}
