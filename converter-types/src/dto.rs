//! Data Transfer Objects handed to the presentation layer.

use std::sync::Arc;

use exchange_rates::{CurrencyCode, RateSnapshot};
use serde::{Deserialize, Serialize};

use crate::domain::{FavoritePair, HistoryEntry, Session};
use crate::error::PersistenceError;
use crate::ports::FetchError;

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    /// Ready, with at least one conversion request in flight.
    Converting,
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// A conversion shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Order in which the request was issued.
    pub sequence: u64,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// Amount exactly as entered.
    pub amount: String,
    /// Converted amount with two fraction digits.
    pub result: String,
    /// "1 from = unit_rate to", four fraction digits.
    pub unit_rate: String,
}

/// Value of an operation whose durable write may have failed.
///
/// The value is valid either way; `warning` only reports that the store
/// does not yet mirror it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persisted<T> {
    pub value: T,
    pub warning: Option<PersistenceError>,
}

impl<T> Persisted<T> {
    pub fn durable(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    pub fn with_warning(value: T, warning: PersistenceError) -> Self {
        Self {
            value,
            warning: Some(warning),
        }
    }

    pub fn is_durable(&self) -> bool {
        self.warning.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// State view
// ─────────────────────────────────────────────────────────────────────────────

/// A consistent copy of everything the presentation layer renders.
#[derive(Debug, Clone)]
pub struct StateView {
    pub phase: Phase,
    pub session: Session,
    /// Latest successfully fetched rates, if any fetch has succeeded.
    pub rates: Option<Arc<RateSnapshot>>,
    /// Most recently initiated conversion that completed.
    pub last_conversion: Option<ConversionResult>,
    /// Error of the most recent fetch, cleared by the next success.
    pub last_fetch_error: Option<FetchError>,
    pub favorites: Vec<FavoritePair>,
    pub history: Vec<HistoryEntry>,
}
