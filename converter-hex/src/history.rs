//! History Manager
//!
//! Newest-first log of completed conversions, bounded to
//! [`HISTORY_LIMIT`] entries and mirrored to the `conversionHistory` key.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use converter_types::{
    CurrencyCode, HISTORY_LIMIT, HistoryEntry, KeyValueStore, Persisted, keys,
};
use tracing::debug;

use crate::persisted::PersistedList;

/// Exclusive owner of the conversion history.
pub struct HistoryManager<S> {
    list: PersistedList<HistoryEntry, S>,
}

impl<S: KeyValueStore> HistoryManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            list: PersistedList::new(store, keys::CONVERSION_HISTORY),
        }
    }

    /// Loads the stored history, keeping at most [`HISTORY_LIMIT`] entries.
    pub async fn rehydrate(&self) -> usize {
        self.list.rehydrate(Some(HISTORY_LIMIT)).await
    }

    /// Prepends a new entry, evicts beyond the bound and persists.
    pub async fn record(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
        amount: &str,
        result: &str,
        timestamp: DateTime<Utc>,
    ) -> Persisted<HistoryEntry> {
        let entry = HistoryEntry::new(from, to, amount, result, timestamp);
        let evicted = self.list.mutate(|items| {
            items.insert(0, entry.clone());
            let evicted = items.len().saturating_sub(HISTORY_LIMIT);
            items.truncate(HISTORY_LIMIT);
            evicted
        });
        debug!(id = %entry.id, evicted, "Recorded conversion");

        match self.list.persist().await {
            Ok(()) => Persisted::durable(entry),
            Err(e) => Persisted::with_warning(entry, e),
        }
    }

    /// Entries newest-first.
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.list.snapshot()
    }

    pub fn len(&self) -> usize {
        self.list.read(|items| items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
