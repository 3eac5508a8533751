//! Persisted key-value store for notifier bookkeeping
//!
//! `ConfigStore` keeps a flat JSON object on disk, one file per tool:
//! `<config_dir>/configstore/<name>.json`
//!
//! Only integer values are read back; anything else under a key reads as absent.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Errors that can occur reading or writing the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Could not determine the user config directory")]
    NoConfigDir,

    #[error("Failed to access store file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file '{path}' is not a JSON object: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store file '{0}' does not contain a JSON object")]
    NotAnObject(PathBuf),
}

/// Narrow integer key-value store
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<i64>, StoreError>;

    fn set(&mut self, key: &str, value: i64) -> Result<(), StoreError>;
}

/// JSON file store laid out like the `configstore` convention
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Open the store named `name` under the user config directory
    pub fn open(name: &str) -> Result<Self, StoreError> {
        let config_dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(Self::at(config_dir.join("configstore").join(format!("{name}.json"))))
    }

    /// Use an explicit file path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>, StoreError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        let value: Value = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        match value {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::NotAnObject(self.path.clone())),
        }
    }

    fn save(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        let io_error = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(io_error)?;

        let content = serde_json::to_string_pretty(map).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        // Write to a sibling temp file, then rename over the target
        let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(io_error)?;
        temp.write_all(content.as_bytes()).map_err(io_error)?;
        temp.persist(&self.path).map_err(|e| io_error(e.error))?;

        Ok(())
    }
}

impl KeyValueStore for ConfigStore {
    fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.load()?.get(key).and_then(Value::as_i64))
    }

    fn set(&mut self, key: &str, value: i64) -> Result<(), StoreError> {
        let mut map = self.load()?;
        map.insert(key.to_string(), Value::from(value));
        self.save(&map)
    }
}

/// In-memory store; records how many writes it has seen
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, i64>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without counting it as a write
    pub fn with_value(mut self, key: &str, value: i64) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    /// Overwrite a value without counting it as a write
    pub fn seed(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), value);
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.values.get(key).copied())
    }

    fn set(&mut self, key: &str, value: i64) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_store_missing_file_reads_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = ConfigStore::at(temp_dir.path().join("missing.json"));

        assert_eq!(store.get("lastCliUpdateNotifiedAt").unwrap(), None);
    }

    #[test]
    fn test_config_store_set_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = ConfigStore::at(temp_dir.path().join("nested/dir/tool.json"));

        store.set("lastCliUpdateNotifiedAt", 1_700_000_000_000).unwrap();

        assert_eq!(
            store.get("lastCliUpdateNotifiedAt").unwrap(),
            Some(1_700_000_000_000)
        );
        assert!(store.path().exists());
    }

    #[test]
    fn test_config_store_preserves_other_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tool.json");
        fs::write(&path, r#"{ "theme": "dark", "count": 3 }"#).unwrap();

        let mut store = ConfigStore::at(&path);
        store.set("count", 4).unwrap();

        let content: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content["theme"], "dark");
        assert_eq!(content["count"], 4);
    }

    #[test]
    fn test_config_store_non_integer_reads_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tool.json");
        fs::write(&path, r#"{ "lastCliUpdateNotifiedAt": "yesterday" }"#).unwrap();

        let store = ConfigStore::at(&path);
        assert_eq!(store.get("lastCliUpdateNotifiedAt").unwrap(), None);
    }

    #[test]
    fn test_config_store_rejects_non_object() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tool.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let store = ConfigStore::at(&path);
        assert!(matches!(store.get("k"), Err(StoreError::NotAnObject(_))));

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(store.get("k"), Err(StoreError::Parse { .. })));
    }

    #[test]
    fn test_memory_store_counts_writes() {
        let mut store = MemoryStore::new().with_value("k", 1);
        assert_eq!(store.get("k").unwrap(), Some(1));
        assert_eq!(store.writes(), 0);

        store.set("k", 2).unwrap();
        store.seed("k", 3);
        assert_eq!(store.get("k").unwrap(), Some(3));
        assert_eq!(store.writes(), 1);
    }
}
