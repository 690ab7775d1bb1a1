//! Postseason bracket: data model, seeding, topology, advancement,
//! champion resolution and self-heal.

pub mod advance;
pub mod champion;
pub mod reconcile;
pub mod seeding;
pub mod topology;
pub mod types;

pub use advance::{resolve_plans, AdvanceOutcome, EngineError, SeriesEngine};
pub use champion::{championship_round_names, current_champion, resolve_champion};
pub use reconcile::{is_stale, normalize_series_configs, refresh_if_stale};
pub use seeding::{infer_league, seed_league};
pub use topology::{build_league_rounds, generate_bracket};
pub use types::{
    GameResult, Matchup, ParticipantRef, PlayoffBracket, Round, RoundPlanEntry, SeriesConfig,
};
