//! Persistence store: named save slots, ranking table, win counters.
//!
//! [`JsonFileStore`] keeps everything as JSON files under one directory:
//! one file per save slot plus `ranking.json` and `wins.json`. Writes go
//! through a temp file and an atomic rename. [`MemoryStore`] backs headless
//! runs and tests.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::EngineSnapshot;

/// Failures surfaced by store operations. None is fatal to the session;
/// the orchestrator converts each into a user-visible notification.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("save '{name}' not found")]
    NotFound { name: String },

    #[error("save data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("save name must not be blank")]
    BlankName,
}

/// Durable key-value collaborator for saves, ranking and wins.
pub trait PersistenceStore {
    /// Load and deserialize the save stored under `name`.
    fn load_save(&self, name: &str) -> Result<EngineSnapshot, StoreError>;
    /// Upsert `snapshot` under `name`.
    fn store_save(&mut self, name: &str, snapshot: &EngineSnapshot) -> Result<(), StoreError>;
    /// Remove the save under `name`. Removing an absent name is not an error.
    fn delete_save(&mut self, name: &str) -> Result<(), StoreError>;
    /// Save names in lexicographic order.
    fn list_saves(&self) -> Result<Vec<String>, StoreError>;

    /// Append a ranking entry. Nicknames are not unique.
    fn record_high_score(&mut self, nickname: &str, score: u32) -> Result<(), StoreError>;
    /// Raise the best-score aggregate to `score` if it exceeds the current
    /// value. Returns whether it did.
    fn record_best_score(&mut self, score: u32) -> Result<bool, StoreError>;
    fn best_score(&self) -> u32;

    /// Increment the win counter for `nickname`.
    fn record_win(&mut self, nickname: &str) -> Result<(), StoreError>;
    fn win_count(&self, nickname: &str) -> u32;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RankingTable {
    best_score: u32,
    entries: Vec<(String, u32)>,
}

/// In-memory store. State does not survive the process.
#[derive(Default)]
pub struct MemoryStore {
    saves: BTreeMap<String, EngineSnapshot>,
    ranking: RankingTable,
    wins: BTreeMap<String, u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ranking entries in append order.
    pub fn high_scores(&self) -> &[(String, u32)] {
        &self.ranking.entries
    }
}

impl PersistenceStore for MemoryStore {
    fn load_save(&self, name: &str) -> Result<EngineSnapshot, StoreError> {
        self.saves
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })
    }

    fn store_save(&mut self, name: &str, snapshot: &EngineSnapshot) -> Result<(), StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::BlankName);
        }
        self.saves.insert(name.to_string(), snapshot.clone());
        Ok(())
    }

    fn delete_save(&mut self, name: &str) -> Result<(), StoreError> {
        self.saves.remove(name);
        Ok(())
    }

    fn list_saves(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.saves.keys().cloned().collect())
    }

    fn record_high_score(&mut self, nickname: &str, score: u32) -> Result<(), StoreError> {
        self.ranking.entries.push((nickname.to_string(), score));
        Ok(())
    }

    fn record_best_score(&mut self, score: u32) -> Result<bool, StoreError> {
        if score > self.ranking.best_score {
            self.ranking.best_score = score;
            return Ok(true);
        }
        Ok(false)
    }

    fn best_score(&self) -> u32 {
        self.ranking.best_score
    }

    fn record_win(&mut self, nickname: &str) -> Result<(), StoreError> {
        *self.wins.entry(nickname.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn win_count(&self, nickname: &str) -> u32 {
        self.wins.get(nickname).copied().unwrap_or(0)
    }
}

const SAVE_EXT: &str = "json";
const RANKING_FILE: &str = "ranking.json";
const WINS_FILE: &str = "wins.json";

/// Encode a save name into a file stem: bytes outside `[A-Za-z0-9_-]` are
/// percent-escaped, so any name maps to a unique, traversal-safe file and
/// listing can recover the exact name the user chose.
fn encode_save_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Inverse of [`encode_save_name`]. Stray `%` sequences that are not valid
/// escapes pass through literally.
fn decode_save_name(stem: &str) -> String {
    let bytes = stem.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3]) {
                if let Ok(b) = u8::from_str_radix(hex, 16) {
                    out.push(b);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// File-backed store rooted at one directory.
pub struct JsonFileStore {
    root: PathBuf,
    ranking: RankingTable,
    wins: BTreeMap<String, u32>,
}

impl JsonFileStore {
    /// Open (or initialize) a store under `root`. Existing ranking and win
    /// tables are loaded eagerly; a corrupt table surfaces as Malformed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join("saves"))?;

        let ranking = match Self::read_json::<RankingTable>(&root.join(RANKING_FILE))? {
            Some(table) => table,
            None => RankingTable::default(),
        };
        let wins = match Self::read_json::<BTreeMap<String, u32>>(&root.join(WINS_FILE))? {
            Some(table) => table,
            None => BTreeMap::new(),
        };

        Ok(Self { root, ranking, wins })
    }

    fn save_path(&self, name: &str) -> PathBuf {
        self.root
            .join("saves")
            .join(format!("{}.{SAVE_EXT}", encode_save_name(name)))
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(path)?;
        let value = serde_json::from_str(&data)?;
        Ok(Some(value))
    }

    // Atomic write: temp file, flush, sync, rename over the target.
    fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(value)?;
        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(data.as_bytes())?;
            file.flush()?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, path)?;
        log::debug!("wrote {} bytes to {:?}", data.len(), path);
        Ok(())
    }

    /// Ranking entries in append order.
    pub fn high_scores(&self) -> &[(String, u32)] {
        &self.ranking.entries
    }

    fn persist_ranking(&self) -> Result<(), StoreError> {
        Self::write_json(&self.root.join(RANKING_FILE), &self.ranking)
    }

    fn persist_wins(&self) -> Result<(), StoreError> {
        Self::write_json(&self.root.join(WINS_FILE), &self.wins)
    }
}

impl PersistenceStore for JsonFileStore {
    fn load_save(&self, name: &str) -> Result<EngineSnapshot, StoreError> {
        let path = self.save_path(name);
        match Self::read_json::<EngineSnapshot>(&path)? {
            Some(snapshot) => {
                log::info!("loaded save '{name}'");
                Ok(snapshot)
            }
            None => Err(StoreError::NotFound {
                name: name.to_string(),
            }),
        }
    }

    fn store_save(&mut self, name: &str, snapshot: &EngineSnapshot) -> Result<(), StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::BlankName);
        }
        Self::write_json(&self.save_path(name), snapshot)?;
        log::info!("stored save '{name}'");
        Ok(())
    }

    fn delete_save(&mut self, name: &str) -> Result<(), StoreError> {
        let path = self.save_path(name);
        if path.exists() {
            fs::remove_file(&path)?;
            log::info!("deleted save '{name}'");
        }
        Ok(())
    }

    fn list_saves(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.root.join("saves"))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(SAVE_EXT) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(decode_save_name(stem));
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn record_high_score(&mut self, nickname: &str, score: u32) -> Result<(), StoreError> {
        self.ranking.entries.push((nickname.to_string(), score));
        self.persist_ranking()
    }

    fn record_best_score(&mut self, score: u32) -> Result<bool, StoreError> {
        if score > self.ranking.best_score {
            self.ranking.best_score = score;
            self.persist_ranking()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn best_score(&self) -> u32 {
        self.ranking.best_score
    }

    fn record_win(&mut self, nickname: &str) -> Result<(), StoreError> {
        *self.wins.entry(nickname.to_string()).or_insert(0) += 1;
        self.persist_wins()
    }

    fn win_count(&self, nickname: &str) -> u32 {
        self.wins.get(nickname).copied().unwrap_or(0)
    }
}
