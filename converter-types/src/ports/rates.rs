//! Rate provider port.
//!
//! Implementations fetch a complete rate table for one base currency.
//! They never retry and never touch local storage.

use exchange_rates::{CurrencyCode, RateSnapshot};

/// Error type for rate fetches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The provider answered but flagged the request as failed.
    #[error("Provider rejected the request: {0}")]
    ProviderRejected(String),

    /// No response was received.
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),
}

/// Port trait for remote rate providers.
#[async_trait::async_trait]
pub trait RateProvider: Send + Sync + 'static {
    /// Fetches every rate quoted against `base`.
    async fn fetch(&self, base: &CurrencyCode) -> Result<RateSnapshot, FetchError>;
}
