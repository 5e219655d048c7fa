//! # Converter Client
//!
//! A typed HTTP adapter for the remote exchange rate provider.
//! Implements the `RateProvider` port.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use converter_types::{CurrencyCode, FetchError, RateProvider, RateSnapshot};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

/// Public endpoint of the v6 provider API.
pub const DEFAULT_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";

const SUCCESS: &str = "success";

/// Body of `GET {base_url}/{api_key}/latest/{base}`.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    result: String,
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
}

/// Exchange rate provider client.
pub struct ExchangeRateClient {
    base_url: String,
    api_key: String,
    timeout: Option<Duration>,
    http: Client,
}

impl ExchangeRateClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: String::new(),
            timeout: None,
            http: Client::new(),
        }
    }

    /// Sets the API key placed in the request path.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Bounds each request; an elapsed timeout counts as no response.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn latest_url(&self, base: &CurrencyCode) -> String {
        format!("{}/{}/latest/{}", self.base_url, self.api_key, base)
    }

    fn into_snapshot(
        base: &CurrencyCode,
        body: LatestRatesResponse,
    ) -> Result<RateSnapshot, FetchError> {
        if body.conversion_rates.is_empty() {
            return Err(FetchError::ProviderRejected(
                "response carried no rates".to_string(),
            ));
        }

        let mut rates = Vec::with_capacity(body.conversion_rates.len());
        for (raw, rate) in body.conversion_rates {
            match raw.parse::<CurrencyCode>() {
                Ok(code) => rates.push((code, rate)),
                Err(e) => debug!("Skipping rate with unusable code: {}", e),
            }
        }

        RateSnapshot::from_f64_rates(base.clone(), rates, Utc::now())
            .map_err(|e| FetchError::ProviderRejected(e.to_string()))
    }
}

#[async_trait]
impl RateProvider for ExchangeRateClient {
    #[instrument(skip(self), fields(base = %base))]
    async fn fetch(&self, base: &CurrencyCode) -> Result<RateSnapshot, FetchError> {
        let mut req = self.http.get(self.latest_url(base));
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| FetchError::NetworkUnavailable(e.without_url().to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::NetworkUnavailable(e.without_url().to_string()))?;

        let parsed: LatestRatesResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                warn!("Undecodable rate response: {}", e);
                return Err(FetchError::ProviderRejected(format!(
                    "undecodable response: {}",
                    e
                )));
            }
            Err(_) => return Err(FetchError::ProviderRejected(format!("HTTP {}", status))),
        };

        if parsed.result != SUCCESS || !status.is_success() {
            let reason = parsed
                .error_type
                .unwrap_or_else(|| format!("HTTP {} with result {:?}", status, parsed.result));
            warn!("Rate provider rejected request: {}", reason);
            return Err(FetchError::ProviderRejected(reason));
        }

        let snapshot = Self::into_snapshot(base, parsed)?;
        debug!(rates = snapshot.len(), "Fetched rate snapshot");
        Ok(snapshot)
    }
}
