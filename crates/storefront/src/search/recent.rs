//! Recently submitted search queries.

use std::sync::{Arc, Mutex, PoisonError};

use crate::storage::{self, Storage, StorageError, keys};

/// How many queries are remembered.
pub const MAX_RECENT_SEARCHES: usize = 5;

/// Move `query` to the front of `entries`, dropping duplicates and capping
/// the list at `cap`. Blank queries are ignored.
pub fn push_recent(entries: &mut Vec<String>, query: &str, cap: usize) {
    let query = query.trim();
    if query.is_empty() {
        return;
    }
    entries.retain(|existing| existing != query);
    entries.insert(0, query.to_string());
    entries.truncate(cap);
}

/// Most-recent-first history of submitted queries, persisted under
/// `recentSearches`.
///
/// Storage is read once at construction; every change is written through.
pub struct RecentSearches {
    storage: Arc<dyn Storage>,
    entries: Mutex<Vec<String>>,
}

impl RecentSearches {
    /// Load the stored history. Unreadable history starts empty.
    #[must_use]
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let entries: Vec<String> = storage::read_json(storage.as_ref(), keys::RECENT_SEARCHES)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Ignoring unreadable recent searches");
                None
            })
            .unwrap_or_default();

        Self {
            storage,
            entries: Mutex::new(entries),
        }
    }

    /// Current entries, most recent first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record a submitted query and return the updated list.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted. The in-memory list
    /// is updated regardless.
    pub fn record(&self, query: &str) -> Result<Vec<String>, StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        push_recent(&mut entries, query, MAX_RECENT_SEARCHES);
        storage::write_json(self.storage.as_ref(), keys::RECENT_SEARCHES, &*entries)?;
        Ok(entries.clone())
    }

    /// Forget all entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored list cannot be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.storage.remove(keys::RECENT_SEARCHES)
    }
}
