//! # Converter Repository
//!
//! Concrete key-value store implementations (adapters) for the converter.
//! Every adapter implements the `KeyValueStore` port.

use async_trait::async_trait;
use converter_types::{KeyValueStore, StoreError};

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// URL selecting the in-process store.
pub const MEMORY_URL: &str = "memory://";

/// Unified store wrapper over the available adapters.
pub enum Store {
    Memory(MemoryStore),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteStore),
}

/// Build and initialize a store from a URL.
///
/// # Examples
///
/// ```ignore
/// // Ephemeral, process-local
/// let store = build_store("memory://").await?;
///
/// // SQLite (with `sqlite` feature)
/// let store = build_store("sqlite://converter.db?mode=rwc").await?;
/// ```
pub async fn build_store(url: &str) -> anyhow::Result<Store> {
    Store::new(url).await
}

impl Store {
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        if url == MEMORY_URL || url == "memory" {
            tracing::info!("Using in-memory store");
            return Ok(Store::Memory(MemoryStore::new()));
        }

        #[cfg(feature = "sqlite")]
        if url.starts_with("sqlite:") {
            tracing::info!("Using SQLite store at {}", url);
            return Ok(Store::Sqlite(SqliteStore::new(url).await?));
        }

        anyhow::bail!("Unsupported store URL: {}", url)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Implement KeyValueStore for Store (delegation)
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl KeyValueStore for Store {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            Store::Memory(inner) => inner.get(key).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(inner) => inner.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            Store::Memory(inner) => inner.set(key, value).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(inner) => inner.set(key, value).await,
        }
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self {
            Store::Memory(inner) => inner.remove(key).await,
            #[cfg(feature = "sqlite")]
            Store::Sqlite(inner) => inner.remove(key).await,
        }
    }
}
