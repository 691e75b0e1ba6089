//! File-backed key/value store for native platforms.

use super::{KeyValueStore, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const STORE_FILE: &str = "session.json";

/// Persists all keys as one JSON object in `<dir>/session.json`.
///
/// Every write rewrites the whole file; the store only holds a handful of
/// small values.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or create) a store in `dir`.
    pub fn new(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let dir = dir.as_ref();
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        let path = dir.join(STORE_FILE);
        let values = if path.exists() {
            let json = fs::read_to_string(&path).map_err(|e| {
                StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;
            match serde_json::from_str(&json) {
                Ok(values) => values,
                Err(e) => {
                    log::warn!("Discarding corrupt store {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Store in the default location.
    ///
    /// On Unix: `~/.local/share/memorybank/`
    /// On Windows: `%LOCALAPPDATA%\memorybank\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("memorybank"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, json).map_err(|e| {
            StorageError::Io(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let values = self.values.lock().map_err(lock_error)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut values = self.values.lock().map_err(lock_error)?;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut values = self.values.lock().map_err(lock_error)?;
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = FileStore::new(temp_dir.path()).unwrap();
            store.set("access_token", "abc").unwrap();
            store.set("user", r#"{"id":"u1"}"#).unwrap();
        }
        let store = FileStore::new(temp_dir.path()).unwrap();
        assert_eq!(store.get("access_token").unwrap().as_deref(), Some("abc"));
        assert_eq!(store.get("user").unwrap().as_deref(), Some(r#"{"id":"u1"}"#));
    }

    #[test]
    fn test_remove_persists() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();
        store.set("refresh_token", "r").unwrap();
        store.remove("refresh_token").unwrap();
        store.remove("missing").unwrap();

        let reopened = FileStore::new(temp_dir.path()).unwrap();
        assert_eq!(reopened.get("refresh_token").unwrap(), None);
    }

    #[test]
    fn test_creates_nested_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("a").join("b");
        let store = FileStore::new(&dir).unwrap();
        store.set("k", "v").unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(STORE_FILE), "{not json").unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();
        assert_eq!(store.get("access_token").unwrap(), None);
    }
}
