//! Bracket Reconciliation
//!
//! Self-heal pass applied to every bracket coming off disk, plus the
//! staleness check that regenerates a bracket whose teams no longer
//! match the current season.

use crate::config::{series_config_for, PlayoffSettings, StageKey};
use crate::models::SeasonData;

use super::champion::{championship_round_names, current_champion};
use super::topology::generate_bracket;
use super::types::PlayoffBracket;

/// Repair derived state against the current configuration.
///
/// Every matchup's series config is replaced with the configured one for
/// its round's stage, winners are re-derived from recorded games, and
/// the champion fields are reconciled: set when a championship round is
/// fully decided, cleared when championship play has started but is
/// undecided, left alone when no championship content exists yet.
pub fn normalize_series_configs(bracket: &mut PlayoffBracket, settings: &PlayoffSettings) {
    for round in &mut bracket.rounds {
        let expected = StageKey::from_round_name(&round.name)
            .map(|stage| series_config_for(stage, settings));
        for matchup in &mut round.matchups {
            if let Some(expected) = &expected {
                if matchup.config != *expected {
                    log::debug!(
                        "{}: replacing series config {}g with configured {}g",
                        round.name,
                        matchup.config.length,
                        expected.length
                    );
                    matchup.config = expected.clone();
                }
            }
            matchup.recompute_winner();
        }
    }

    match current_champion(bracket) {
        Some((champion, runner_up)) => {
            bracket.champion = Some(champion);
            bracket.runner_up = Some(runner_up);
        }
        None => {
            let championship_started = championship_round_names(bracket)
                .iter()
                .any(|name| bracket.round(name).is_some_and(|r| !r.matchups.is_empty()));
            if championship_started {
                bracket.champion = None;
                bracket.runner_up = None;
            }
        }
    }
}

/// Whether the bracket references teams unknown to the season.
///
/// An empty reference set (blank bracket) is not stale; empty team ids
/// inside matchups are.
pub fn is_stale(bracket: &PlayoffBracket, season: &SeasonData) -> bool {
    let referenced = bracket.referenced_team_ids();
    if referenced.is_empty() {
        return false;
    }
    let known: std::collections::BTreeSet<&str> =
        season.teams.iter().map(|t| t.team_id.as_str()).collect();
    referenced.iter().any(|id| id.is_empty() || !known.contains(id.as_str()))
}

/// Normalize the bracket, regenerating it when stale.
///
/// A stale bracket is rebuilt for the same year from current standings.
/// When standings are empty regeneration is impossible; the bracket is
/// kept but its champion fields are cleared so stale results do not
/// present as authoritative. Returns the bracket and whether it was
/// regenerated.
pub fn refresh_if_stale(
    mut bracket: PlayoffBracket,
    season: &SeasonData,
    settings: &PlayoffSettings,
) -> (PlayoffBracket, bool) {
    normalize_series_configs(&mut bracket, settings);
    if season.teams.is_empty() || !is_stale(&bracket, season) {
        return (bracket, false);
    }

    if season.standings.is_empty() {
        log::warn!(
            "{} bracket references unknown teams and no standings exist to regenerate from",
            bracket.year
        );
        bracket.champion = None;
        bracket.runner_up = None;
        return (bracket, false);
    }

    log::warn!("{} bracket is stale, regenerating from current standings", bracket.year);
    let mut regenerated = generate_bracket(bracket.year, season, settings);
    normalize_series_configs(&mut regenerated, settings);
    (regenerated, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::types::{GameResult, Matchup, Round, SeriesConfig};
    use crate::models::{PlayoffTeam, StandingsRecord, TeamEntry};

    fn team(id: &str, seed: u8) -> PlayoffTeam {
        PlayoffTeam {
            team_id: id.to_string(),
            seed,
            league: "AL".to_string(),
            wins: 90,
            run_diff: 0,
        }
    }

    fn won_game(winner: &str, loser: &str) -> GameResult {
        GameResult {
            home: winner.to_string(),
            away: loser.to_string(),
            date: None,
            result: Some("5-2".to_string()),
            boxscore: None,
            meta: Default::default(),
        }
    }

    fn season(ids: &[(&str, u32)]) -> SeasonData {
        let teams = ids
            .iter()
            .map(|(id, _)| TeamEntry {
                team_id: id.to_string(),
                division: "AL East".to_string(),
                league: None,
            })
            .collect();
        let standings = ids
            .iter()
            .map(|(id, wins)| {
                (
                    id.to_string(),
                    StandingsRecord {
                        wins: *wins,
                        losses: 162 - *wins,
                        runs_for: 0,
                        runs_against: 0,
                    },
                )
            })
            .collect();
        SeasonData { teams, standings }
    }

    #[test]
    fn test_normalize_replaces_divergent_config() {
        let mut bracket = PlayoffBracket::new(2025);
        let mut ws = Round::new("WS");
        let mut matchup = Matchup::new(
            team("NYY", 1),
            team("LAD", 1),
            SeriesConfig { length: 3, pattern: vec![1, 1, 1] },
        );
        // Two wins decided a best-of-3; under the configured best-of-7
        // the series must reopen.
        matchup.games.push(won_game("NYY", "LAD"));
        matchup.games.push(won_game("NYY", "LAD"));
        matchup.recompute_winner();
        assert!(matchup.is_decided());
        ws.matchups.push(matchup);
        bracket.rounds = vec![ws];

        normalize_series_configs(&mut bracket, &PlayoffSettings::default());
        let series = &bracket.rounds[0].matchups[0];
        assert_eq!(series.config.length, 7);
        assert_eq!(series.winner, None);
    }

    #[test]
    fn test_normalize_clears_champion_of_undecided_final() {
        let mut bracket = PlayoffBracket::new(2025);
        bracket.champion = Some("NYY".to_string());
        bracket.runner_up = Some("LAD".to_string());
        let mut ws = Round::new("WS");
        ws.matchups.push(Matchup::new(
            team("NYY", 1),
            team("LAD", 1),
            SeriesConfig { length: 7, pattern: vec![2, 3, 2] },
        ));
        bracket.rounds = vec![ws];

        normalize_series_configs(&mut bracket, &PlayoffSettings::default());
        assert_eq!(bracket.champion, None);
        assert_eq!(bracket.runner_up, None);
    }

    #[test]
    fn test_normalize_keeps_champion_fields_without_content() {
        let mut bracket = PlayoffBracket::new(2025);
        bracket.champion = Some("NYY".to_string());
        normalize_series_configs(&mut bracket, &PlayoffSettings::default());
        assert_eq!(bracket.champion.as_deref(), Some("NYY"));
    }

    #[test]
    fn test_stale_bracket_regenerates_with_clean_seeds() {
        let season = season(&[("NYY", 98), ("BOS", 92), ("TOR", 85)]);
        let settings = PlayoffSettings::default();

        let mut bracket = PlayoffBracket::new(2025);
        bracket
            .seeds_by_league
            .insert("AL".to_string(), vec![team("Z99", 1), team("NYY", 2)]);
        assert!(is_stale(&bracket, &season));

        let (refreshed, regenerated) = refresh_if_stale(bracket, &season, &settings);
        assert!(regenerated);
        assert_eq!(refreshed.year, 2025);
        let ids = refreshed.referenced_team_ids();
        assert!(!ids.contains("Z99"));
        assert!(ids.contains("NYY"));
    }

    #[test]
    fn test_current_bracket_passes_through() {
        let season = season(&[("NYY", 98), ("BOS", 92)]);
        let settings = PlayoffSettings::default();
        let bracket = generate_bracket(2025, &season, &settings);
        let snapshot = serde_json::to_string(&bracket).unwrap();

        let (refreshed, regenerated) = refresh_if_stale(bracket, &season, &settings);
        assert!(!regenerated);
        assert_eq!(serde_json::to_string(&refreshed).unwrap(), snapshot);
    }

    #[test]
    fn test_stale_without_standings_degrades() {
        let mut season = season(&[("NYY", 98)]);
        season.standings.clear();
        let settings = PlayoffSettings::default();

        let mut bracket = PlayoffBracket::new(2025);
        bracket.champion = Some("Z99".to_string());
        bracket.seeds_by_league.insert("AL".to_string(), vec![team("Z99", 1)]);

        let (refreshed, regenerated) = refresh_if_stale(bracket, &season, &settings);
        assert!(!regenerated);
        assert_eq!(refreshed.champion, None);
        assert_eq!(refreshed.runner_up, None);
    }

    #[test]
    fn test_empty_bracket_is_not_stale() {
        let season = season(&[("NYY", 98)]);
        assert!(!is_stale(&PlayoffBracket::new(2025), &season));
    }
}
