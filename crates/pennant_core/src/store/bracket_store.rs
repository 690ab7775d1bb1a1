//! Durable Bracket Store
//!
//! One JSON file per postseason year. Writes are atomic: serialize to a
//! temp file in the same directory, fsync, rename over the target, with
//! a best-effort `.bak` of the previous contents. Loads are defensive:
//! candidates that fail to parse or carry a foreign schema version are
//! skipped, and every loaded bracket passes through the self-heal and
//! staleness pipeline before it is handed to the caller.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::bracket::{refresh_if_stale, PlayoffBracket};
use crate::config::PlayoffSettings;
use crate::models::SeasonData;

use super::error::StoreError;
use super::SCHEMA_VERSION;

pub struct BracketStore {
    dir: PathBuf,
}

impl BracketStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Legacy un-suffixed file, still accepted on load.
    pub fn default_path(&self) -> PathBuf {
        self.dir.join("playoffs.json")
    }

    pub fn year_path(&self, year: i32) -> PathBuf {
        self.dir.join(format!("playoffs_{year}.json"))
    }

    /// Atomically persist the bracket to its year file.
    pub fn save(&self, bracket: &PlayoffBracket) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.year_path(bracket.year);
        let payload = serde_json::to_string_pretty(bracket)?;

        // Best-effort backup of the previous generation.
        if path.exists() {
            if let Err(err) = fs::copy(&path, path.with_extension("json.bak")) {
                log::warn!("could not back up {}: {}", path.display(), err);
            }
        }

        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(payload.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;

        log::debug!("saved {} bracket to {}", bracket.year, path.display());
        Ok(path)
    }

    /// Load and version-check a single bracket file.
    pub fn load_path(&self, path: &Path) -> Result<PlayoffBracket, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound { path: path.display().to_string() });
        }
        let bracket: PlayoffBracket = serde_json::from_str(&fs::read_to_string(path)?)?;
        if bracket.schema_version != SCHEMA_VERSION {
            return Err(StoreError::VersionMismatch {
                found: bracket.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(bracket)
    }

    /// Load the best available bracket, healed against current data.
    ///
    /// With a year, that year's file wins when it parses. Otherwise
    /// every `playoffs*.json` candidate is considered and the one with
    /// the highest year (newest file on ties) is chosen. Unreadable
    /// candidates are skipped; `Ok(None)` means no usable bracket
    /// exists. A bracket regenerated by the staleness check is
    /// persisted back best-effort.
    pub fn load(
        &self,
        year: Option<i32>,
        season: &SeasonData,
        settings: &PlayoffSettings,
    ) -> Result<Option<PlayoffBracket>, StoreError> {
        if !self.dir.exists() {
            return Ok(None);
        }

        if let Some(year) = year {
            let path = self.year_path(year);
            if path.exists() {
                match self.load_path(&path) {
                    Ok(bracket) => return Ok(Some(self.reconcile(bracket, season, settings))),
                    Err(err) if err.is_recoverable() => {
                        log::warn!("skipping {}: {}", path.display(), err);
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        let mut best: Option<(PlayoffBracket, (i32, SystemTime))> = None;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !is_bracket_file(&path) {
                continue;
            }
            let bracket = match self.load_path(&path) {
                Ok(bracket) => bracket,
                Err(err) if err.is_recoverable() => {
                    log::warn!("skipping {}: {}", path.display(), err);
                    continue;
                }
                Err(err) => return Err(err),
            };
            if year == Some(bracket.year) {
                return Ok(Some(self.reconcile(bracket, season, settings)));
            }
            let modified = fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            let rank = (bracket.year, modified);
            if best.as_ref().map_or(true, |(_, r)| rank > *r) {
                best = Some((bracket, rank));
            }
        }

        Ok(best.map(|(bracket, _)| self.reconcile(bracket, season, settings)))
    }

    fn reconcile(
        &self,
        bracket: PlayoffBracket,
        season: &SeasonData,
        settings: &PlayoffSettings,
    ) -> PlayoffBracket {
        let (bracket, regenerated) = refresh_if_stale(bracket, season, settings);
        if regenerated {
            if let Err(err) = self.save(&bracket) {
                log::warn!("could not persist regenerated bracket: {}", err);
            }
        }
        bracket
    }
}

fn is_bracket_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.starts_with("playoffs") && name.ends_with(".json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::generate_bracket;
    use crate::models::{StandingsRecord, TeamEntry};
    use tempfile::TempDir;

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

    fn default_season() -> SeasonData {
        season(&[("NYY", 98), ("BOS", 92), ("TOR", 85)])
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = BracketStore::new(dir.path());
        let season = default_season();
        let settings = PlayoffSettings::default();
        let bracket = generate_bracket(2025, &season, &settings);

        let path = store.save(&bracket).unwrap();
        assert_eq!(path, store.year_path(2025));
        let loaded = store.load_path(&path).unwrap();
        assert_eq!(loaded, bracket);
    }

    #[test]
    fn test_save_leaves_no_temp_and_backs_up() {
        let dir = TempDir::new().unwrap();
        let store = BracketStore::new(dir.path());
        let bracket = generate_bracket(2025, &default_season(), &PlayoffSettings::default());

        store.save(&bracket).unwrap();
        store.save(&bracket).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(!names.iter().any(|n| n.ends_with(".tmp")));
        assert!(names.iter().any(|n| n.ends_with(".bak")));
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        let store = BracketStore::new(dir.path());
        let path = store.year_path(2025);
        let mut bracket = generate_bracket(2025, &default_season(), &PlayoffSettings::default());
        bracket.schema_version = 99;
        fs::write(&path, serde_json::to_string(&bracket).unwrap()).unwrap();

        let err = store.load_path(&path).unwrap_err();
        assert!(matches!(err, StoreError::VersionMismatch { found: 99, expected: 1 }));

        // The scanning load skips it rather than failing.
        let loaded = store
            .load(None, &default_season(), &PlayoffSettings::default())
            .unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_prefers_requested_year() {
        let dir = TempDir::new().unwrap();
        let store = BracketStore::new(dir.path());
        let season = default_season();
        let settings = PlayoffSettings::default();
        store.save(&generate_bracket(2024, &season, &settings)).unwrap();
        store.save(&generate_bracket(2025, &season, &settings)).unwrap();

        let loaded = store.load(Some(2024), &season, &settings).unwrap().unwrap();
        assert_eq!(loaded.year, 2024);
    }

    #[test]
    fn test_load_without_year_picks_latest() {
        let dir = TempDir::new().unwrap();
        let store = BracketStore::new(dir.path());
        let season = default_season();
        let settings = PlayoffSettings::default();
        store.save(&generate_bracket(2025, &season, &settings)).unwrap();
        store.save(&generate_bracket(2023, &season, &settings)).unwrap();

        let loaded = store.load(None, &season, &settings).unwrap().unwrap();
        assert_eq!(loaded.year, 2025);
    }

    #[test]
    fn test_load_empty_dir_is_none() {
        let dir = TempDir::new().unwrap();
        let store = BracketStore::new(dir.path());
        let loaded = store
            .load(None, &default_season(), &PlayoffSettings::default())
            .unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_stale_bracket_regenerated_and_persisted() {
        let dir = TempDir::new().unwrap();
        let store = BracketStore::new(dir.path());
        let settings = PlayoffSettings::default();

        // Persist a bracket seeded from teams that no longer exist.
        let old = generate_bracket(2025, &season(&[("Z98", 90), ("Z99", 80)]), &settings);
        store.save(&old).unwrap();

        let current = default_season();
        let loaded = store.load(Some(2025), &current, &settings).unwrap().unwrap();
        let ids = loaded.referenced_team_ids();
        assert!(!ids.contains("Z99"));
        assert!(ids.contains("NYY"));

        // The regenerated bracket replaced the stale one on disk.
        let reread = store.load_path(&store.year_path(2025)).unwrap();
        assert_eq!(reread, loaded);
    }
}
