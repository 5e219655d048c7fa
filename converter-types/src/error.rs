//! Error types for the currency converter.

use exchange_rates::{ConversionError, CurrencyCode};

use crate::domain::FavoriteId;
use crate::ports::FetchError;

/// Storage-level errors (key-value adapter failures).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A write that did not reach durable storage.
///
/// Always non-fatal: the in-memory state it was meant to mirror stays
/// authoritative.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Failed to persist {key}: {message}")]
pub struct PersistenceError {
    pub key: String,
    pub message: String,
}

impl PersistenceError {
    pub fn new(key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self {
            key: key.into(),
            message: err.to_string(),
        }
    }
}

/// Errors surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConverterError {
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Rate provider rejected the request: {0}")]
    ProviderRejected(String),

    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("Rate not available for {0}")]
    RateUnavailable(CurrencyCode),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Favorite not found: {0}")]
    FavoriteNotFound(FavoriteId),
}

impl From<FetchError> for ConverterError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NetworkUnavailable(msg) => ConverterError::NetworkUnavailable(msg),
            FetchError::ProviderRejected(msg) => ConverterError::ProviderRejected(msg),
        }
    }
}

impl From<ConversionError> for ConverterError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::InvalidAmount(raw) | ConversionError::OutOfRange(raw) => {
                ConverterError::InvalidAmount(raw)
            }
            ConversionError::RateUnavailable(code) => ConverterError::RateUnavailable(code),
        }
    }
}
