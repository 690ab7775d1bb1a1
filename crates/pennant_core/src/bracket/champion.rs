//! Champion Resolution
//!
//! Read-side helpers over a bracket snapshot. Which round decides the
//! championship depends on the configuration: the cross-league final
//! when one exists, the league final in single-league setups, otherwise
//! the last round that has any content.

use std::collections::BTreeSet;

use crate::config::StageKey;

use super::types::PlayoffBracket;

/// Names of the rounds that resolve the champion.
///
/// Preference order: final-stage rounds with content, then
/// championship-stage rounds with content (single-league case), then
/// the last round with any content. Empty when nothing is decidable.
pub fn championship_round_names(bracket: &PlayoffBracket) -> BTreeSet<String> {
    let with_content = |stage: StageKey| -> BTreeSet<String> {
        bracket
            .rounds
            .iter()
            .filter(|r| StageKey::from_round_name(&r.name) == Some(stage) && r.has_content())
            .map(|r| r.name.clone())
            .collect()
    };

    let finals = with_content(StageKey::Final);
    if !finals.is_empty() {
        return finals;
    }
    let league_finals = with_content(StageKey::Championship);
    if !league_finals.is_empty() {
        return league_finals;
    }
    bracket
        .rounds
        .iter()
        .rev()
        .find(|r| r.has_content())
        .map(|r| BTreeSet::from([r.name.clone()]))
        .unwrap_or_default()
}

/// Champion and runner-up once a championship round is fully decided.
pub fn current_champion(bracket: &PlayoffBracket) -> Option<(String, String)> {
    for name in championship_round_names(bracket) {
        let round = bracket.round(&name)?;
        if !round.is_decided() {
            continue;
        }
        let decisive = &round.matchups[0];
        let champion = decisive.winner.clone()?;
        let runner_up = decisive.runner_up_id()?.to_string();
        return Some((champion, runner_up));
    }
    None
}

/// Stamp champion/runner-up onto the bracket when decidable.
///
/// Returns whether the bracket now has a champion. Never clears an
/// undecided bracket; that is the self-heal pass's job.
pub fn resolve_champion(bracket: &mut PlayoffBracket) -> bool {
    if let Some((champion, runner_up)) = current_champion(bracket) {
        if bracket.champion.as_deref() != Some(champion.as_str()) {
            log::info!("{} postseason decided: {} over {}", bracket.year, champion, runner_up);
        }
        bracket.champion = Some(champion);
        bracket.runner_up = Some(runner_up);
        true
    } else {
        false
    }
}
