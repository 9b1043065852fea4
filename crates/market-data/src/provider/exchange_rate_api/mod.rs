//! ExchangeRate-API provider.
//!
//! Uses the v6 pair endpoint, which returns a single conversion rate:
//!
//! ```text
//! GET {base_url}/v6/{api_key}/pair/{from}/{to}
//! {"result":"success","base_code":"EUR","target_code":"NOK","conversion_rate":11.52,
//!  "time_last_update_unix":1700000000}
//! ```
//!
//! Failures are reported in-band with `"result":"error"` and an `error-type`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::ProviderRate;
use crate::provider::{rate_from_f64, ExchangeRateProvider};

/// Provider ID constant
const PROVIDER_ID: &str = "EXCHANGE_RATE_API";

const DEFAULT_BASE_URL: &str = "https://v6.exchangerate-api.com";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct PairResponse {
    result: String,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    conversion_rate: Option<f64>,
    time_last_update_unix: Option<i64>,
}

/// Primary exchange-rate source.
///
/// # Example
///
/// ```ignore
/// use tallyfolio_market_data::ExchangeRateApiProvider;
///
/// let provider = ExchangeRateApiProvider::new("your_api_key".to_string());
/// ```
pub struct ExchangeRateApiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ExchangeRateApiProvider {
    /// Create a new provider with the given API key.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Create a provider pointed at a custom host (used by tests and proxies).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn map_error_type(error_type: &str, from: &str, to: &str) -> MarketDataError {
        match error_type {
            "unsupported-code" => MarketDataError::UnsupportedPair {
                from: from.to_string(),
                to: to.to_string(),
            },
            "quota-reached" => MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            },
            other => MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[async_trait]
impl ExchangeRateProvider for ExchangeRateApiProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_exchange_rate(
        &self,
        from: &str,
        to: &str,
    ) -> Result<ProviderRate, MarketDataError> {
        if self.api_key.is_empty() {
            return Err(MarketDataError::NotConfigured {
                provider: PROVIDER_ID.to_string(),
            });
        }

        let url = format!(
            "{}/v6/{}/pair/{}/{}",
            self.base_url, self.api_key, from, to
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketDataError::from_reqwest(PROVIDER_ID, e))?;

        // The API reports most failures in the body with a 4xx status, so the
        // body is parsed before the status is checked.
        let status = response.status();
        let body: PairResponse = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(MarketDataError::from_status(PROVIDER_ID, status))
            }
            Err(e) => {
                return Err(MarketDataError::InvalidResponse {
                    provider: PROVIDER_ID.to_string(),
                    message: e.to_string(),
                })
            }
        };

        if body.result != "success" {
            let error_type = body.error_type.as_deref().unwrap_or("unknown-error");
            return Err(Self::map_error_type(error_type, from, to));
        }

        let raw_rate = body
            .conversion_rate
            .ok_or_else(|| MarketDataError::InvalidResponse {
                provider: PROVIDER_ID.to_string(),
                message: "Missing conversion_rate".to_string(),
            })?;
        let rate = rate_from_f64(PROVIDER_ID, raw_rate)?;
        let as_of = body
            .time_last_update_unix
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0));

        Ok(ProviderRate::new(from, to, rate, PROVIDER_ID).with_as_of(as_of))
    }
}
