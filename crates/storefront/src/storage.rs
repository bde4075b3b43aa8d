//! Durable local key/value storage.
//!
//! The storefront keeps a handful of values on the device between runs:
//! the signed-in user, their bearer token, recent searches and the cart.
//! Values are JSON strings stored under the fixed keys in [`keys`].
//!
//! Two backends are provided:
//! - [`MemoryStorage`] - process-local, used by tests and ephemeral sessions
//! - [`FileStorage`] - a single JSON document on disk, rewritten on every change
//!
//! Concurrent processes sharing one file are not coordinated: last writer wins.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Fixed storage keys.
pub mod keys {
    /// Serialized profile of the signed-in user.
    pub const USER: &str = "user";
    /// Opaque bearer token issued by the API.
    pub const TOKEN: &str = "token";
    /// Most-recent-first list of submitted search queries.
    pub const RECENT_SEARCHES: &str = "recentSearches";
    /// Cart line items.
    pub const CART: &str = "cart";
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stored value could not be (de)serialized.
    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A previous writer panicked while holding the lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// A string key/value store that survives restarts.
pub trait Storage: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and deserialize the JSON value stored under `key`.
///
/// # Errors
///
/// Returns an error if the backend fails or the stored value is not valid
/// JSON for `T`.
pub fn read_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    storage
        .get(key)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(StorageError::from)
}

/// Serialize `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns an error if serialization or the backend write fails.
pub fn write_json<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw)
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-memory storage. Contents are lost when the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|e| e.is_empty()).unwrap_or(true)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// Storage backed by one JSON object on disk.
///
/// The file is read once when opened. Every mutation rewrites it through a
/// temporary sibling file followed by a rename.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`.
    ///
    /// A missing file is treated as empty storage. A corrupt file is logged
    /// and replaced on the next write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Discarding corrupt storage file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}
