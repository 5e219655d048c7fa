//! Favorite currency pair domain model.

use exchange_rates::CurrencyCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a FavoritePair.
///
/// Freshly created ids are random UUIDs. Stored ids are accepted as opaque
/// strings so records written by older builds rehydrate unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteId(String);

impl FavoriteId {
    /// Creates a new random FavoriteId.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FavoriteId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FavoriteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FavoriteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FavoriteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A saved (from, to) shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoritePair {
    pub id: FavoriteId,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl FavoritePair {
    /// Creates a favorite with a fresh id.
    pub fn new(from: CurrencyCode, to: CurrencyCode) -> Self {
        Self {
            id: FavoriteId::new(),
            from,
            to,
        }
    }
}
