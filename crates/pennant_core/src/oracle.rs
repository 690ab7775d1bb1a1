//! Game Oracle Boundary
//!
//! The bracket engine never simulates baseball itself. A single game is
//! resolved by an external oracle that maps `(home, away, seed)` to a
//! final score plus optional artifacts. The engine derives the seed
//! deterministically from the bracket coordinates of the game, so
//! replaying an unpersisted slot reproduces the identical result.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Final score and artifacts for one simulated game.
#[derive(Debug, Clone, Default)]
pub struct GameScore {
    pub home_runs: u32,
    pub away_runs: u32,

    /// Rendered boxscore, saved to disk by the engine when an artifact
    /// directory is configured.
    pub boxscore_html: Option<String>,

    /// Free-form metadata bag (injury events, attendance, ...).
    pub meta: BTreeMap<String, serde_json::Value>,
}

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("oracle failed to simulate {home} vs {away}: {message}")]
    SimulationFailed { home: String, away: String, message: String },
}

/// External single-game simulator.
///
/// The seed is always supplied; an implementation that ignores it is
/// valid but forfeits reproducible resume.
pub trait GameOracle {
    fn simulate_game(&mut self, home: &str, away: &str, seed: u64)
        -> Result<GameScore, OracleError>;
}

/// Stable 30-bit seed for one game slot.
///
/// SHA-256 over the `|`-joined coordinates, first eight hex digits,
/// masked to 30 bits. Identical inputs always yield the identical seed,
/// which is what makes crash-before-persist replays safe.
pub fn deterministic_seed(
    year: i32,
    round_name: &str,
    matchup_index: usize,
    game_index: usize,
    home: &str,
    away: &str,
) -> u64 {
    let key = format!("{year}|{round_name}|{matchup_index}|{game_index}|{home}|{away}");
    let digest = Sha256::digest(key.as_bytes());
    let hex = format!("{:02x}{:02x}{:02x}{:02x}", digest[0], digest[1], digest[2], digest[3]);
    u64::from_str_radix(&hex, 16).unwrap_or(0) & ((1 << 30) - 1)
}

/// Built-in deterministic scorer for the CLI and tests.
///
/// Seeds a ChaCha8 stream from the game seed and draws plausible run
/// totals with a small home edge. Ties are re-rolled (extra innings).
/// This is a stand-in, not a simulator; real hosts plug their own
/// `GameOracle`.
#[derive(Debug, Default)]
pub struct QuickSimOracle;

impl GameOracle for QuickSimOracle {
    fn simulate_game(
        &mut self,
        _home: &str,
        _away: &str,
        seed: u64,
    ) -> Result<GameScore, OracleError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut home_runs = draw_runs(&mut rng) + u32::from(rng.gen_bool(0.54));
        let mut away_runs = draw_runs(&mut rng);
        while home_runs == away_runs {
            home_runs += u32::from(rng.gen_bool(0.5));
            away_runs += u32::from(rng.gen_bool(0.5));
        }
        Ok(GameScore { home_runs, away_runs, ..GameScore::default() })
    }
}

fn draw_runs(rng: &mut ChaCha8Rng) -> u32 {
    // Two draws skew the distribution toward low-scoring games.
    rng.gen_range(0..6).min(rng.gen_range(0..10))
}

/// Scripted oracle: pops pre-recorded `(home_runs, away_runs)` pairs in
/// order. Intended for tests and dry runs.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    scores: std::collections::VecDeque<(u32, u32)>,
}

impl ScriptedOracle {
    pub fn new(scores: impl IntoIterator<Item = (u32, u32)>) -> Self {
        Self { scores: scores.into_iter().collect() }
    }

    pub fn remaining(&self) -> usize {
        self.scores.len()
    }
}

impl GameOracle for ScriptedOracle {
    fn simulate_game(
        &mut self,
        home: &str,
        away: &str,
        _seed: u64,
    ) -> Result<GameScore, OracleError> {
        let (home_runs, away_runs) =
            self.scores.pop_front().ok_or_else(|| OracleError::SimulationFailed {
                home: home.to_string(),
                away: away.to_string(),
                message: "script exhausted".to_string(),
            })?;
        Ok(GameScore { home_runs, away_runs, ..GameScore::default() })
    }
}
