//! Persistent store port.
//!
//! A string-keyed, string-valued durable store. Structured values are
//! JSON-encoded by the caller and each record is written wholesale.

use crate::error::StoreError;

/// Keys under which the converter keeps its records.
pub mod keys {
    pub const LAST_AMOUNT: &str = "lastAmount";
    pub const LAST_FROM_CURRENCY: &str = "lastFromCurrency";
    pub const LAST_TO_CURRENCY: &str = "lastToCurrency";
    pub const FAVORITES: &str = "favorites";
    pub const CONVERSION_HISTORY: &str = "conversionHistory";
}

/// Port trait for the on-device key-value store.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Reads a value, `None` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes a key. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
