//! Series Advancement Engine
//!
//! Drives a bracket forward against the external game oracle, one game,
//! one round, or run-to-completion per call. Every entry point is
//! idempotent: winners are re-derived from recorded games, plan
//! resolution skips already-materialized pairs, and the per-game oracle
//! seed is a pure function of the game's bracket coordinates, so a call
//! replayed after a crash-before-persist reproduces the same result.

use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::{series_config_for, PlayoffSettings};
use crate::models::PlayoffTeam;
use crate::oracle::{deterministic_seed, GameOracle, OracleError};
use crate::store::StoreError;

use super::champion::resolve_champion;
use super::types::{GameResult, Matchup, ParticipantRef, PlayoffBracket};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("could not simulate {round} series {matchup}: {source}")]
    Oracle {
        round: String,
        matchup: usize,
        #[source]
        source: OracleError,
    },
}

/// What one advancement call accomplished.
///
/// A mutation failure is an `Err(EngineError)`; a persistence failure is
/// counted here and never raised, because the in-memory mutation already
/// succeeded and has different retry semantics.
#[derive(Debug, Clone, Default)]
pub struct AdvanceOutcome {
    pub games_played: u32,
    pub champion_decided: bool,
    pub persist_failures: u32,
}

impl AdvanceOutcome {
    /// False means nothing was pending (no-op).
    pub fn progressed(&self) -> bool {
        self.games_played > 0
    }
}

type PersistHook<'a> = Box<dyn FnMut(&PlayoffBracket) -> Result<(), StoreError> + 'a>;

/// Advancement driver bound to an oracle and a settings snapshot.
///
/// Single-writer: the host serializes calls for a given bracket.
pub struct SeriesEngine<'a, O: GameOracle> {
    oracle: &'a mut O,
    settings: &'a PlayoffSettings,
    persist: Option<PersistHook<'a>>,
    artifact_dir: Option<PathBuf>,
    game_date: Option<chrono::NaiveDate>,
}

impl<'a, O: GameOracle> SeriesEngine<'a, O> {
    pub fn new(oracle: &'a mut O, settings: &'a PlayoffSettings) -> Self {
        Self { oracle, settings, persist: None, artifact_dir: None, game_date: None }
    }

    /// Hook invoked after every mutation, best-effort.
    pub fn with_persist<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&PlayoffBracket) -> Result<(), StoreError> + 'a,
    {
        self.persist = Some(Box::new(hook));
        self
    }

    /// Directory for boxscore HTML artifacts returned by the oracle.
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    /// Calendar date stamped onto newly recorded games.
    pub fn with_game_date(mut self, date: chrono::NaiveDate) -> Self {
        self.game_date = Some(date);
        self
    }

    /// Simulate the next unplayed game in the first pending round.
    pub fn simulate_next_game(
        &mut self,
        bracket: &mut PlayoffBracket,
    ) -> Result<AdvanceOutcome, EngineError> {
        let mut outcome = AdvanceOutcome::default();
        resolve_plans(bracket, self.settings);

        if let Some(round_index) = first_pending_round(bracket) {
            for matchup_index in bracket.rounds[round_index].pending_matchups() {
                if self.play_one_game(bracket, round_index, matchup_index)? {
                    outcome.games_played = 1;
                    self.try_persist(bracket, &mut outcome);
                    break;
                }
            }
            if bracket.rounds[round_index].is_decided() {
                resolve_plans(bracket, self.settings);
                resolve_champion(bracket);
                self.try_persist(bracket, &mut outcome);
            }
        } else if resolve_champion(bracket) {
            self.try_persist(bracket, &mut outcome);
        }

        outcome.champion_decided = bracket.champion.is_some();
        Ok(outcome)
    }

    /// Simulate the first pending round to completion, then populate the
    /// rounds that depend on it. Never cascades into the next round.
    pub fn simulate_next_round(
        &mut self,
        bracket: &mut PlayoffBracket,
    ) -> Result<AdvanceOutcome, EngineError> {
        let mut outcome = AdvanceOutcome::default();
        resolve_plans(bracket, self.settings);

        if let Some(round_index) = first_pending_round(bracket) {
            'round: loop {
                let pending = bracket.rounds[round_index].pending_matchups();
                if pending.is_empty() {
                    break;
                }
                for matchup_index in pending {
                    if self.play_one_game(bracket, round_index, matchup_index)? {
                        outcome.games_played += 1;
                        self.try_persist(bracket, &mut outcome);
                        continue 'round;
                    }
                }
                // Every pending series has exhausted its slots.
                break;
            }
            if bracket.rounds[round_index].is_decided() {
                resolve_plans(bracket, self.settings);
                resolve_champion(bracket);
                self.try_persist(bracket, &mut outcome);
            }
        } else if resolve_champion(bracket) {
            self.try_persist(bracket, &mut outcome);
        }

        outcome.champion_decided = bracket.champion.is_some();
        Ok(outcome)
    }

    /// Run round-by-round until the championship round is decided or no
    /// further progress is possible.
    pub fn simulate_playoffs(
        &mut self,
        bracket: &mut PlayoffBracket,
    ) -> Result<AdvanceOutcome, EngineError> {
        let mut total = AdvanceOutcome::default();
        loop {
            let step = self.simulate_next_round(bracket)?;
            total.games_played += step.games_played;
            total.persist_failures += step.persist_failures;
            total.champion_decided = step.champion_decided;
            if step.champion_decided || !step.progressed() {
                break;
            }
        }
        Ok(total)
    }

    /// Play one game into a series; false when the series has no
    /// playable slot (already decided, unresolved, or slots exhausted).
    /// On oracle failure nothing is appended.
    fn play_one_game(
        &mut self,
        bracket: &mut PlayoffBracket,
        round_index: usize,
        matchup_index: usize,
    ) -> Result<bool, EngineError> {
        let year = bracket.year;
        let round_name = bracket.rounds[round_index].name.clone();
        let matchup = &mut bracket.rounds[round_index].matchups[matchup_index];

        matchup.recompute_winner();
        if matchup.is_decided() || !matchup.is_ready() {
            return Ok(false);
        }

        let homes: Vec<String> = matchup.home_order().iter().map(|s| s.to_string()).collect();
        let slot = matchup.games.len().min(homes.len());
        if slot >= homes.len() {
            return Ok(false);
        }

        let home = homes[slot].clone();
        let away = if home == matchup.high.team_id {
            matchup.low.team_id.clone()
        } else {
            matchup.high.team_id.clone()
        };

        let seed = deterministic_seed(year, &round_name, matchup_index, slot, &home, &away);
        let score = self.oracle.simulate_game(&home, &away, seed).map_err(|source| {
            EngineError::Oracle { round: round_name.clone(), matchup: matchup_index, source }
        })?;

        let boxscore = score.boxscore_html.as_deref().and_then(|html| {
            save_boxscore(
                self.artifact_dir.as_deref(),
                year,
                &round_name,
                matchup_index,
                slot,
                &home,
                &away,
                html,
            )
        });

        log::debug!(
            "{} game {}: {} {} - {} {}",
            round_name,
            slot + 1,
            home,
            score.home_runs,
            score.away_runs,
            away
        );

        matchup.games.push(GameResult {
            home,
            away,
            date: self.game_date.map(|d| d.to_string()),
            result: Some(format!("{}-{}", score.home_runs, score.away_runs)),
            boxscore,
            meta: score.meta,
        });
        matchup.recompute_winner();
        Ok(true)
    }

    fn try_persist(&mut self, bracket: &PlayoffBracket, outcome: &mut AdvanceOutcome) {
        if let Some(hook) = self.persist.as_mut() {
            if let Err(err) = hook(bracket) {
                outcome.persist_failures += 1;
                log::warn!("bracket persistence failed: {}", err);
            }
        }
    }
}

/// First round, in declared order, with a materialized undecided series.
fn first_pending_round(bracket: &PlayoffBracket) -> Option<usize> {
    bracket.rounds.iter().position(|r| !r.pending_matchups().is_empty())
}

/// Materialize planned matchups whose sources have resolved.
///
/// Plan entries stay in place; a set of already-materialized team-id
/// pairs keeps re-resolution idempotent. Entries referencing unknown
/// seeds or undecided series are skipped, not errors.
pub fn resolve_plans(bracket: &mut PlayoffBracket, settings: &PlayoffSettings) {
    for round_index in 0..bracket.rounds.len() {
        if bracket.rounds[round_index].plan.is_empty() {
            continue;
        }

        let mut existing: BTreeSet<(String, String)> = bracket.rounds[round_index]
            .matchups
            .iter()
            .map(|m| pair_key(&m.high.team_id, &m.low.team_id))
            .collect();

        let mut materialized: Vec<Matchup> = Vec::new();
        for entry in &bracket.rounds[round_index].plan {
            let mut participants: Vec<PlayoffTeam> = Vec::new();
            for source in &entry.sources {
                match resolve_source(bracket, source) {
                    Some(team) => participants.push(team),
                    None => {
                        participants.clear();
                        break;
                    }
                }
            }
            if participants.len() != 2 {
                continue;
            }

            let key = pair_key(&participants[0].team_id, &participants[1].team_id);
            if existing.contains(&key) {
                continue;
            }

            // Lower seed number outranks; records then team id settle
            // cross-league pairings where seed numbers collide.
            participants.sort_by(|a, b| {
                a.seed
                    .cmp(&b.seed)
                    .then(b.wins.cmp(&a.wins))
                    .then(b.run_diff.cmp(&a.run_diff))
                    .then(a.team_id.cmp(&b.team_id))
            });
            let mut drain = participants.into_iter();
            let (Some(high), Some(low)) = (drain.next(), drain.next()) else {
                continue;
            };

            log::info!(
                "{}: {} ({}) vs {} ({})",
                bracket.rounds[round_index].name,
                high.team_id,
                high.seed,
                low.team_id,
                low.seed
            );
            materialized.push(Matchup::new(high, low, series_config_for(entry.series_key, settings)));
            existing.insert(key);
        }
        bracket.rounds[round_index].matchups.extend(materialized);
    }
}

fn resolve_source(bracket: &PlayoffBracket, source: &ParticipantRef) -> Option<PlayoffTeam> {
    match source {
        ParticipantRef::Seed { league, seed } => bracket.seeded_team(league, *seed).cloned(),
        ParticipantRef::Winner { source_round, slot } => {
            let matchup = bracket.round(source_round)?.matchups.get(*slot)?;
            let winner = matchup.winner.as_deref()?;
            if matchup.high.team_id == winner {
                Some(matchup.high.clone())
            } else if matchup.low.team_id == winner {
                Some(matchup.low.clone())
            } else {
                None
            }
        }
    }
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[allow(clippy::too_many_arguments)]
fn save_boxscore(
    dir: Option<&std::path::Path>,
    year: i32,
    round_name: &str,
    matchup_index: usize,
    game_index: usize,
    home: &str,
    away: &str,
    html: &str,
) -> Option<String> {
    let dir = dir?;
    let name = format!(
        "{}_{}_S{}_G{}_{}_at_{}.html",
        year,
        round_name.replace(' ', "_"),
        matchup_index,
        game_index,
        away,
        home
    );
    let path = dir.join(&name);
    if let Err(err) = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, html)) {
        log::warn!("failed to save boxscore {}: {}", path.display(), err);
        return None;
    }
    Some(name)
}
