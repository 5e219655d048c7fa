//! A list that mirrors itself into one store key.

use std::sync::Arc;

use converter_types::{KeyValueStore, PersistenceError};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

/// In-memory list plus the store key it is written to.
///
/// Mutations apply synchronously under the list lock. Persisting takes a
/// separate write lock and serializes the list as it is *at write time*,
/// so writes land in order and the last one always carries the newest state.
pub(crate) struct PersistedList<T, S> {
    key: &'static str,
    store: Arc<S>,
    items: Mutex<Vec<T>>,
    write_lock: tokio::sync::Mutex<()>,
}

impl<T, S> PersistedList<T, S>
where
    T: Clone + Serialize + DeserializeOwned,
    S: KeyValueStore,
{
    pub(crate) fn new(store: Arc<S>, key: &'static str) -> Self {
        Self {
            key,
            store,
            items: Mutex::new(Vec::new()),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Replaces the in-memory list with the stored copy.
    ///
    /// A missing, unreadable or undecodable record leaves the list empty.
    /// Entries that fail to decode on their own are dropped and the rest
    /// kept. Returns the number of rehydrated items.
    #[instrument(skip(self), fields(key = self.key))]
    pub(crate) async fn rehydrate(&self, limit: Option<usize>) -> usize {
        let Some(raw) = read_key(self.store.as_ref(), self.key).await else {
            return 0;
        };

        let entries: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Discarding undecodable record: {}", e);
                return 0;
            }
        };

        let mut loaded: Vec<T> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(index, "Skipping undecodable entry: {}", e);
                    None
                }
            })
            .collect();
        if let Some(limit) = limit {
            loaded.truncate(limit);
        }

        let count = loaded.len();
        *self.items.lock() = loaded;
        debug!(count, "Rehydrated list");
        count
    }

    pub(crate) fn snapshot(&self) -> Vec<T> {
        self.items.lock().clone()
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.items.lock())
    }

    pub(crate) fn mutate<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        f(&mut self.items.lock())
    }

    /// Writes the current list wholesale.
    #[instrument(skip(self), fields(key = self.key))]
    pub(crate) async fn persist(&self) -> Result<(), PersistenceError> {
        let _writing = self.write_lock.lock().await;

        let encoded = {
            let items = self.items.lock();
            serde_json::to_string(&*items).map_err(|e| PersistenceError::new(self.key, e))?
        };

        self.store
            .set(self.key, &encoded)
            .await
            .map_err(|e| PersistenceError::new(self.key, e))
    }
}

/// Reads a key, logging and swallowing store failures.
pub(crate) async fn read_key<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Option<String> {
    match store.get(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!(key, "Failed to read stored record: {}", e);
            None
        }
    }
}
