//! Domain models for the currency converter.

pub mod favorite;
pub mod history;
pub mod session;

pub use favorite::{FavoriteId, FavoritePair};
pub use history::{HISTORY_LIMIT, HistoryEntry, HistoryId};
pub use session::Session;
