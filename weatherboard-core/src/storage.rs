use directories::ProjectDirs;
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

/// Errors raised when persisting values. Reads never fail: anything that
/// can't be read back is reported as absent.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to write storage file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize storage contents: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Could not determine platform data directory")]
    NoDataDir,
}

/// String-keyed string storage, the same shape as browser local storage.
pub trait KeyValueStore: Send + Sync {
    fn get_string(&self, key: &str) -> Option<String>;
    fn set_string(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// A JSON object on disk. Every call goes back to the file; nothing is
/// cached between calls, so concurrent writers resolve as last-write-wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform data directory, e.g. `~/.local/share/weatherboard/storage.json`.
    pub fn open_default() -> Result<Self, StorageError> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn default_path() -> Result<PathBuf, StorageError> {
        let dirs = ProjectDirs::from("dev", "weatherboard", "weatherboard")
            .ok_or(StorageError::NoDataDir)?;

        Ok(dirs.data_dir().join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> BTreeMap<String, String> {
        if !self.path.exists() {
            return BTreeMap::new();
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "storage file unreadable, treating as empty");
                return BTreeMap::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(map) => map,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "storage file corrupt, treating as empty");
                BTreeMap::new()
            }
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source: std::io::Error| StorageError::Io { path: self.path.clone(), source };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(map)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;

        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.read_map().remove(key)
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.read_map();
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// In-process store; contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get_string("k"), None);

        store.set_string("k", "v").unwrap();
        assert_eq!(store.get_string("k").as_deref(), Some("v"));

        store.remove("k").unwrap();
        assert_eq!(store.get_string("k"), None);
    }

    #[test]
    fn file_store_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nope.json"));

        assert_eq!(store.get_string("savedLocations"), None);
    }

    #[test]
    fn file_store_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        FileStore::new(&path).set_string("lastSearchedCity", "Oslo").unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get_string("lastSearchedCity").as_deref(), Some("Oslo"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn file_store_corrupt_file_reads_as_empty_and_is_replaced_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{ not json").unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.get_string("anything"), None);

        store.set_string("a", "1").unwrap();
        assert_eq!(store.get_string("a").as_deref(), Some("1"));
    }

    #[test]
    fn file_store_remove_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("storage.json"));

        store.set_string("a", "1").unwrap();
        store.set_string("b", "2").unwrap();
        store.remove("a").unwrap();
        store.remove("missing").unwrap();

        assert_eq!(store.get_string("a"), None);
        assert_eq!(store.get_string("b").as_deref(), Some("2"));
    }
}
