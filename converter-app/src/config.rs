//! Configuration loading from environment.

use std::env;
use std::time::Duration;

use anyhow::Context;
use converter_client::DEFAULT_BASE_URL;
use converter_types::CurrencyCode;

const DEFAULT_STORE_URL: &str = "sqlite://converter.db?mode=rwc";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub base_currency: CurrencyCode,
    pub default_from: CurrencyCode,
    pub default_to: CurrencyCode,
    pub store_url: String,
    pub http_timeout: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables, after applying a
    /// `.env` file if one exists.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        let code = |name: &str, default: &str| -> anyhow::Result<CurrencyCode> {
            var(name, default)
                .parse()
                .with_context(|| format!("{} is not a currency code", name))
        };

        let api_key = lookup("EXCHANGE_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("EXCHANGE_API_KEY environment variable is required"))?;

        let http_timeout = var("HTTP_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .map(Duration::from_secs)
            .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?;

        let log_format = match var("LOG_FORMAT", "pretty").to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => anyhow::bail!("Unsupported LOG_FORMAT: {}", other),
        };

        Ok(Self {
            api_key,
            api_url: var("EXCHANGE_API_URL", DEFAULT_BASE_URL),
            base_currency: code("BASE_CURRENCY", "USD")?,
            default_from: code("DEFAULT_FROM_CURRENCY", "USD")?,
            default_to: code("DEFAULT_TO_CURRENCY", "EUR")?,
            store_url: var("STORE_URL", DEFAULT_STORE_URL),
            http_timeout,
            log_format,
        })
    }
}
