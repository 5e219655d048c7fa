//! # Converter Hex
//!
//! Application layer of the currency converter.
//!
//! ## Architecture
//!
//! - `service/` - Session controller (startup, fetch, conversion, session writes)
//! - `favorites/` - Favorites manager
//! - `history/` - Bounded conversion history manager
//!
//! The controller is generic over `S: KeyValueStore` and `P: RateProvider`,
//! allowing different adapters to be injected.

pub mod favorites;
pub mod history;
mod persisted;
pub mod service;
mod state;

#[cfg(test)]
mod service_tests;

pub use favorites::FavoritesManager;
pub use history::HistoryManager;
pub use service::{ControllerSettings, ConversionOutcome, SessionController};
