//! Frankfurter provider (ECB reference rates).
//!
//! ```text
//! GET {base_url}/latest?from=EUR&to=NOK
//! {"amount":1.0,"base":"EUR","date":"2024-01-05","rates":{"NOK":11.52}}
//! ```
//!
//! Frankfurter needs no API key. Unknown currencies answer with HTTP 404.
//! Rates are published once per business day, so `date` becomes the
//! provider timestamp at midnight UTC.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::ProviderRate;
use crate::provider::{rate_from_f64, ExchangeRateProvider};

/// Provider ID constant
const PROVIDER_ID: &str = "FRANKFURTER";

const DEFAULT_BASE_URL: &str = "https://api.frankfurter.app";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct LatestResponse {
    date: Option<String>,
    rates: HashMap<String, f64>,
}

/// Secondary exchange-rate source.
pub struct FrankfurterProvider {
    client: Client,
    base_url: String,
}

impl Default for FrankfurterProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FrankfurterProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    /// Create a provider pointed at a self-hosted Frankfurter instance.
    pub fn with_base_url(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ExchangeRateProvider for FrankfurterProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_exchange_rate(
        &self,
        from: &str,
        to: &str,
    ) -> Result<ProviderRate, MarketDataError> {
        let url = format!("{}/latest", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("from", from), ("to", to)])
            .send()
            .await
            .map_err(|e| MarketDataError::from_reqwest(PROVIDER_ID, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(MarketDataError::UnsupportedPair {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        if !status.is_success() {
            return Err(MarketDataError::from_status(PROVIDER_ID, status));
        }

        let body: LatestResponse =
            response
                .json()
                .await
                .map_err(|e| MarketDataError::InvalidResponse {
                    provider: PROVIDER_ID.to_string(),
                    message: e.to_string(),
                })?;

        let raw_rate = body
            .rates
            .get(to)
            .copied()
            .ok_or_else(|| MarketDataError::UnsupportedPair {
                from: from.to_string(),
                to: to.to_string(),
            })?;
        let rate = rate_from_f64(PROVIDER_ID, raw_rate)?;

        let as_of = body
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());

        Ok(ProviderRate::new(from, to, rate, PROVIDER_ID).with_as_of(as_of))
    }
}
