//! Key/value preference storage.
//!
//! Tables persist small string preferences (visible columns, user scope)
//! under well-known keys. The store is injected so hosts decide where the
//! values live: [`MemoryStorage`] for tests and throwaway sessions,
//! [`FileStorage`] for a JSON file that survives restarts.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use log::{debug, warn};

use crate::StorageError;

/// A string key/value store shared between tables.
///
/// Methods take `&self` so one store can back every open table at once.
pub trait ClientStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

fn lock(entries: &Mutex<BTreeMap<String, String>>) -> MutexGuard<'_, BTreeMap<String, String>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory storage. Nothing outlives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.entries).insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// Storage backed by a single JSON object on disk.
///
/// The whole map is rewritten on every change; preference maps stay tiny.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|source| StorageError::corrupt(&path, source))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No storage file at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(err) => return Err(StorageError::io(&path, err)),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|err| StorageError::io(parent, err))?;
            }
            _ => {}
        }

        let contents = serde_json::to_string_pretty(entries)
            .map_err(|source| StorageError::corrupt(&self.path, source))?;
        fs::write(&self.path, contents).map_err(|err| {
            warn!("Failed to write storage file {}: {err}", self.path.display());
            StorageError::io(&self.path, err)
        })
    }
}

impl ClientStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_owned(), value.to_owned());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}
