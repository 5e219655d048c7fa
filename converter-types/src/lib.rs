//! # Converter Types
//!
//! Domain records and port traits for the currency converter core.
//! This crate has no IO of its own - only data structures, error types
//! and trait definitions.
//!
//! ## Architecture
//!
//! - `domain/` - Session, FavoritePair, HistoryEntry
//! - `ports/` - Traits the rate provider and key-value store adapters implement
//! - `dto/` - What the presentation layer reads back
//! - `error/` - Storage, persistence and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    FavoriteId, FavoritePair, HISTORY_LIMIT, HistoryEntry, HistoryId, Session,
};
pub use dto::*;
pub use error::{ConverterError, PersistenceError, StoreError};
pub use exchange_rates::{CurrencyCode, RateSnapshot};
pub use ports::{FetchError, KeyValueStore, RateProvider, keys};
