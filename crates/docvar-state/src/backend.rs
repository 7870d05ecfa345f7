//! Storage backends
//!
//! Keys and values are opaque strings. [`MemoryStorage`] keeps them for the
//! lifetime of the process, [`FileStorage`] writes them through to a JSON file.

use crate::error::{StateError, StateResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key/value medium behind the state store
pub trait StorageBackend: Send {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value
    fn set(&mut self, key: &str, value: &str) -> StateResult<()>;

    /// Delete a value, missing keys are ignored
    fn remove(&mut self, key: &str) -> StateResult<()>;

    /// All keys currently stored
    fn keys(&self) -> Vec<String>;
}

/// In-memory backend
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    /// Create empty storage
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-filled with entries
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> StateResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StateResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Backend persisted as a flat JSON object
///
/// The file is read once on open and rewritten after every mutation.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open a state file, starting empty if it does not exist yet
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn open(path: impl Into<PathBuf>) -> StateResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content =
                fs::read_to_string(&path).map_err(|e| StateError::io_error(&path, e))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| StateError::json_error(&path, e))?
            }
        } else {
            BTreeMap::new()
        };
        debug!("Opened state file {} with {} entries", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    /// Location of the state file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> StateResult<()> {
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| StateError::json_error(&self.path, e))?;
        fs::write(&self.path, json).map_err(|e| StateError::io_error(&self.path, e))
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> StateResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> StateResult<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_basic_ops() {
        let mut storage = MemoryStorage::new();
        assert!(storage.get("a").is_none());

        storage.set("a", "1").unwrap();
        assert_eq!(storage.get("a").as_deref(), Some("1"));
        assert_eq!(storage.keys(), vec!["a".to_string()]);

        storage.remove("a").unwrap();
        storage.remove("a").unwrap();
        assert!(storage.keys().is_empty());
    }

    #[test]
    fn file_storage_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut storage = FileStorage::open(&path).unwrap();
        storage.set("PLACEHOLDER_A_TEXT", "hello").unwrap();

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("PLACEHOLDER_A_TEXT").as_deref(), Some("hello"));
    }

    #[test]
    fn file_storage_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let result = FileStorage::open(&path);
        assert!(matches!(result, Err(StateError::Json { .. })));
    }

    #[test]
    fn file_storage_accepts_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let storage = FileStorage::open(file.path()).unwrap();
        assert!(storage.keys().is_empty());
    }
}
