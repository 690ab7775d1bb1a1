//! # pennant_core - Deterministic Postseason Bracket Engine
//!
//! This library seeds a postseason field from final standings, builds a
//! multi-round elimination bracket of best-of-N series, and advances it
//! game by game against a pluggable game oracle.
//!
//! ## Features
//! - 100% deterministic advancement (same bracket + oracle = same result)
//! - Lazy participant resolution for rounds fed by earlier winners
//! - Resumable: winners are derived from recorded games, never stored state
//! - Durable versioned JSON persistence with staleness self-heal

pub mod bracket;
pub mod config;
pub mod models;
pub mod oracle;
pub mod store;

pub use bracket::{
    generate_bracket, resolve_champion, AdvanceOutcome, EngineError, GameResult, Matchup,
    ParticipantRef, PlayoffBracket, Round, SeriesConfig, SeriesEngine,
};
pub use config::{PlayoffSettings, StageKey};
pub use models::{PlayoffTeam, SeasonData, StandingsRecord, TeamEntry};
pub use oracle::{deterministic_seed, GameOracle, GameScore, OracleError, QuickSimOracle};
pub use store::{BracketStore, StoreError, SCHEMA_VERSION};
