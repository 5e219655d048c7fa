//! Favorites Manager
//!
//! Ordered bookmarks of currency pairs, mirrored to the `favorites` key.

use std::sync::Arc;

use converter_types::{
    CurrencyCode, FavoriteId, FavoritePair, KeyValueStore, Persisted, keys,
};
use tracing::{debug, info};

use crate::persisted::PersistedList;

/// Exclusive owner of the favorites list.
pub struct FavoritesManager<S> {
    list: PersistedList<FavoritePair, S>,
}

impl<S: KeyValueStore> FavoritesManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            list: PersistedList::new(store, keys::FAVORITES),
        }
    }

    /// Loads the stored favorites, replacing the in-memory list.
    pub async fn rehydrate(&self) -> usize {
        self.list.rehydrate(None).await
    }

    /// Appends a new pair with a fresh id and persists the list.
    ///
    /// Duplicate (from, to) pairs are allowed. The pair stays in memory even
    /// when the write fails.
    pub async fn add(&self, from: CurrencyCode, to: CurrencyCode) -> Persisted<FavoritePair> {
        let favorite = self.list.mutate(|items| {
            let mut favorite = FavoritePair::new(from, to);
            while items.iter().any(|f| f.id == favorite.id) {
                favorite.id = FavoriteId::new();
            }
            items.push(favorite.clone());
            favorite
        });
        info!(id = %favorite.id, from = %favorite.from, to = %favorite.to, "Added favorite");

        match self.list.persist().await {
            Ok(()) => Persisted::durable(favorite),
            Err(e) => Persisted::with_warning(favorite, e),
        }
    }

    /// Removes a pair by id. Unknown ids leave the list untouched.
    ///
    /// The value is `true` when an entry was removed.
    pub async fn remove(&self, id: &FavoriteId) -> Persisted<bool> {
        let removed = self.list.mutate(|items| {
            let before = items.len();
            items.retain(|f| &f.id != id);
            items.len() != before
        });

        if !removed {
            debug!(id = %id, "No favorite to remove");
            return Persisted::durable(false);
        }
        info!(id = %id, "Removed favorite");

        match self.list.persist().await {
            Ok(()) => Persisted::durable(true),
            Err(e) => Persisted::with_warning(true, e),
        }
    }

    /// Looks up a pair without changing the list.
    pub fn select(&self, id: &FavoriteId) -> Option<FavoritePair> {
        self.list
            .read(|items| items.iter().find(|f| &f.id == id).cloned())
    }

    /// Favorites in insertion order.
    pub fn list(&self) -> Vec<FavoritePair> {
        self.list.snapshot()
    }
}
