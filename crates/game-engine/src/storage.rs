//! High-score persistence behind [`KeyValueStore`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use game_core::{GameError, KeyValueStore};
use serde_json::{Map, Value};

/// Key under which the high score is stored
pub const HIGH_SCORE_KEY: &str = "highScore";

/// Volatile store for tests and throwaway sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, GameError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), GameError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A flat JSON object on disk: `{ "highScore": "1234" }`.
///
/// The file is re-read on every access and rewritten in full on every set.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<platform data dir>/trading-game/store.json`
    pub fn default_path() -> Result<PathBuf, GameError> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| GameError::Storage("Cannot determine data directory".to_string()))?;
        Ok(data_dir.join("trading-game").join("store.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>, GameError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&raw)? {
            Value::Object(map) => Ok(map),
            other => Err(GameError::Storage(format!(
                "{} does not hold a JSON object (found {})",
                self.path.display(),
                other
            ))),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, GameError> {
        let entries = self.read_all()?;
        Ok(entries.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), GameError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write-then-rename: readers never see a half-written file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&Value::Object(entries))?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Read the stored high score. Missing or unreadable values count as 0.
pub fn load_high_score(store: &dyn KeyValueStore) -> u64 {
    match store.get(HIGH_SCORE_KEY) {
        Ok(Some(raw)) => match raw.trim().parse::<u64>() {
            Ok(score) => score,
            Err(_) => {
                tracing::warn!("Ignoring unparseable high score {:?}", raw);
                0
            }
        },
        Ok(None) => 0,
        Err(e) => {
            tracing::warn!("Failed to load high score: {}", e);
            0
        }
    }
}

pub fn save_high_score(store: &mut dyn KeyValueStore, score: u64) {
    if let Err(e) = store.set(HIGH_SCORE_KEY, &score.to_string()) {
        tracing::warn!("Failed to persist high score {}: {}", score, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("trading-game-test-{}-{}", name, std::process::id()))
            .join("store.json")
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_high_score_defaults_to_zero() {
        let mut store = MemoryStore::new();
        assert_eq!(load_high_score(&store), 0);

        store.set(HIGH_SCORE_KEY, "not a number").unwrap();
        assert_eq!(load_high_score(&store), 0);

        save_high_score(&mut store, 1234);
        assert_eq!(load_high_score(&store), 1234);
    }

    #[test]
    fn test_json_file_store_persists_across_instances() {
        let path = temp_store_path("persist");
        let _ = fs::remove_dir_all(path.parent().unwrap());

        let mut store = JsonFileStore::new(&path);
        assert_eq!(store.get(HIGH_SCORE_KEY).unwrap(), None);
        save_high_score(&mut store, 777);
        store.set("other", "kept").unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(load_high_score(&reopened), 777);
        assert_eq!(reopened.get("other").unwrap(), Some("kept".to_string()));

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_json_file_store_rejects_non_object() {
        let path = temp_store_path("garbage");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[1, 2, 3]").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.get(HIGH_SCORE_KEY), Err(GameError::Storage(_))));
        assert_eq!(load_high_score(&store), 0);

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
