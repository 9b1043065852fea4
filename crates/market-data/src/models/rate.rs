use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single exchange rate as reported by a provider.
///
/// `rate` is the amount of `to` currency bought by one unit of `from`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRate {
    pub from: String,
    pub to: String,
    pub rate: Decimal,
    /// Time the provider last refreshed the rate, if it reports one.
    pub as_of: Option<DateTime<Utc>>,
    pub provider: String,
}

impl ProviderRate {
    pub fn new(from: &str, to: &str, rate: Decimal, provider: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            rate,
            as_of: None,
            provider: provider.to_string(),
        }
    }

    pub fn with_as_of(mut self, as_of: Option<DateTime<Utc>>) -> Self {
        self.as_of = as_of;
        self
    }
}
