//! Bracket Topology Builder
//!
//! Builds the round graph for each league from its seed count: the
//! immediate matchups plus planned matchups whose participants are only
//! known once earlier series decide. Shapes are fixed per seed count;
//! fields of six or more play a 6-slot bracket.

use std::collections::BTreeMap;

use crate::config::{series_config_for, PlayoffSettings, StageKey};
use crate::models::{PlayoffTeam, SeasonData, TeamEntry};

use super::seeding::{infer_league, seed_league};
use super::types::{Matchup, ParticipantRef, PlayoffBracket, Round, RoundPlanEntry};

fn seed_ref(league: &str, seed: u8) -> ParticipantRef {
    ParticipantRef::Seed { league: league.to_string(), seed }
}

fn winner_ref(source_round: &str, slot: usize) -> ParticipantRef {
    ParticipantRef::Winner { source_round: source_round.to_string(), slot }
}

fn plan(series_key: StageKey, a: ParticipantRef, b: ParticipantRef) -> RoundPlanEntry {
    RoundPlanEntry { series_key, sources: vec![a, b] }
}

/// Build one league's rounds.
///
/// Returns the rounds in play order and the name of the league's final
/// round (the one whose winner advances to the cross-league final).
pub fn build_league_rounds(
    league: &str,
    seeds: &[PlayoffTeam],
    settings: &PlayoffSettings,
) -> (Vec<Round>, Option<String>) {
    if seeds.len() < 2 {
        return (Vec::new(), None);
    }

    let team = |seed: u8| seeds.iter().find(|t| t.seed == seed).cloned();
    let add_match = |round: &mut Round, high: u8, low: u8, stage: StageKey| {
        if let (Some(high), Some(low)) = (team(high), team(low)) {
            round.matchups.push(Matchup::new(high, low, series_config_for(stage, settings)));
        }
    };

    let wc_name = format!("{league} WC");
    let ds_name = format!("{league} DS");
    let cs_name = format!("{league} CS");

    let mut rounds = Vec::new();
    match seeds.len() {
        2 => {
            let mut cs = Round::new(&cs_name);
            add_match(&mut cs, 1, 2, StageKey::Championship);
            rounds.push(cs);
        }
        3 => {
            let mut wc = Round::new(&wc_name);
            add_match(&mut wc, 2, 3, StageKey::Wildcard);
            rounds.push(wc);

            let mut cs = Round::new(&cs_name);
            cs.plan.push(plan(
                StageKey::Championship,
                seed_ref(league, 1),
                winner_ref(&wc_name, 0),
            ));
            rounds.push(cs);
        }
        4 => {
            let mut ds = Round::new(&ds_name);
            add_match(&mut ds, 1, 4, StageKey::Division);
            add_match(&mut ds, 2, 3, StageKey::Division);
            rounds.push(ds);

            let mut cs = Round::new(&cs_name);
            cs.plan.push(plan(
                StageKey::Championship,
                winner_ref(&ds_name, 0),
                winner_ref(&ds_name, 1),
            ));
            rounds.push(cs);
        }
        5 => {
            let mut wc = Round::new(&wc_name);
            add_match(&mut wc, 4, 5, StageKey::Wildcard);
            rounds.push(wc);

            let mut ds = Round::new(&ds_name);
            add_match(&mut ds, 2, 3, StageKey::Division);
            ds.plan.push(plan(
                StageKey::Division,
                seed_ref(league, 1),
                winner_ref(&wc_name, 0),
            ));
            rounds.push(ds);

            let mut cs = Round::new(&cs_name);
            cs.plan.push(plan(
                StageKey::Championship,
                winner_ref(&ds_name, 0),
                winner_ref(&ds_name, 1),
            ));
            rounds.push(cs);
        }
        _ => {
            // Six or more seeds: 6-slot bracket, top two seeds bye.
            let mut wc = Round::new(&wc_name);
            add_match(&mut wc, 3, 6, StageKey::Wildcard);
            add_match(&mut wc, 4, 5, StageKey::Wildcard);
            rounds.push(wc);

            let mut ds = Round::new(&ds_name);
            ds.plan.push(plan(
                StageKey::Division,
                seed_ref(league, 1),
                winner_ref(&wc_name, 0),
            ));
            ds.plan.push(plan(
                StageKey::Division,
                seed_ref(league, 2),
                winner_ref(&wc_name, 1),
            ));
            rounds.push(ds);

            let mut cs = Round::new(&cs_name);
            cs.plan.push(plan(
                StageKey::Championship,
                winner_ref(&ds_name, 0),
                winner_ref(&ds_name, 1),
            ));
            rounds.push(cs);
        }
    }

    (rounds, Some(cs_name))
}

/// Generate the initial bracket from final standings and configuration.
pub fn generate_bracket(
    year: i32,
    season: &SeasonData,
    settings: &PlayoffSettings,
) -> PlayoffBracket {
    let mut by_league: BTreeMap<String, Vec<TeamEntry>> = BTreeMap::new();
    for team in &season.teams {
        let league = team
            .league
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| infer_league(&team.division, &settings.division_to_league));
        let league = if league.is_empty() { "LEAGUE".to_string() } else { league };
        by_league.entry(league).or_default().push(team.clone());
    }

    let mut bracket = PlayoffBracket::new(year);
    let mut league_finals: BTreeMap<String, String> = BTreeMap::new();

    for (league, teams) in &by_league {
        let seeds = seed_league(league, teams, season, settings);
        if seeds.len() < 2 {
            log::warn!("league {} has no viable playoff field, skipping", league);
            continue;
        }
        let (rounds, final_name) = build_league_rounds(league, &seeds, settings);
        bracket.seeds_by_league.insert(league.clone(), seeds);
        bracket.rounds.extend(rounds);
        if let Some(final_name) = final_name {
            league_finals.insert(league.clone(), final_name);
        }
    }

    // Cross-league final between the first two league champions.
    if league_finals.len() >= 2 {
        let mut finals = league_finals.values();
        if let (Some(first), Some(second)) = (finals.next(), finals.next()) {
            let mut ws = Round::new("WS");
            ws.plan.push(plan(StageKey::Final, winner_ref(first, 0), winner_ref(second, 0)));
            bracket.rounds.push(ws);
        }
    }
    // A single-league bracket keeps its league final as the decisive
    // round; the "Final" alias is derived at display time only.

    log::info!(
        "generated {} bracket: {} league(s), {} round(s)",
        year,
        bracket.seeds_by_league.len(),
        bracket.rounds.len()
    );
    bracket
}
