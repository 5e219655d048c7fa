//! # Converter Application
//!
//! Wires the components together:
//! - Load configuration from environment
//! - Initialize the store adapter
//! - Build the rate provider client
//! - Create and start the session controller

pub mod config;
pub mod telemetry;

use converter_client::ExchangeRateClient;
use converter_hex::{ControllerSettings, SessionController};
use converter_repo::{Store, build_store};

pub use config::{Config, LogFormat};
pub use telemetry::init_tracing;

/// The controller as wired for production use.
pub type Converter = SessionController<Store, ExchangeRateClient>;

/// Builds every adapter from `config` and runs startup.
///
/// The first rate fetch may still be running when this returns; call
/// `settle()` on the controller to wait for it.
pub async fn bootstrap(config: &Config) -> anyhow::Result<Converter> {
    tracing::info!("Using store: {}", config.store_url);
    tracing::info!(
        "Fetching {} rates from {}",
        config.base_currency,
        config.api_url
    );

    // Build store (handles connection and migration)
    let store = build_store(&config.store_url).await?;

    let client = ExchangeRateClient::new(&config.api_url)
        .with_api_key(&config.api_key)
        .with_timeout(config.http_timeout);

    let settings = ControllerSettings {
        base_currency: config.base_currency.clone(),
        default_from: config.default_from.clone(),
        default_to: config.default_to.clone(),
    };

    let controller = SessionController::new(store, client, settings);
    controller.initialize().await;
    Ok(controller)
}
