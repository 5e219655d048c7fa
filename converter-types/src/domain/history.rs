//! Conversion history domain model.

use chrono::{DateTime, SecondsFormat, Utc};
use exchange_rates::CurrencyCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of entries the history retains.
pub const HISTORY_LIMIT: usize = 10;

/// Unique identifier for a HistoryEntry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(String);

impl HistoryId {
    /// Creates a new random HistoryId.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for HistoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HistoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One completed conversion.
///
/// Entries are immutable once recorded. `amount` is kept exactly as the user
/// typed it; `result` always carries two fraction digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryId,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub amount: String,
    pub result: String,
    /// ISO-8601 timestamp. Older records stored it under `date`.
    #[serde(alias = "date")]
    pub timestamp: String,
}

impl HistoryEntry {
    /// Creates a new entry with a fresh id.
    pub fn new(
        from: CurrencyCode,
        to: CurrencyCode,
        amount: impl Into<String>,
        result: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: HistoryId::new(),
            from,
            to,
            amount: amount.into(),
            result: result.into(),
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}
