use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

use super::fx_errors::FxError;
use crate::constants::DECIMAL_PRECISION;

/// Where a rate came from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RateSource {
    PrimaryApi,
    SecondaryApi,
    Fallback,
    Cached,
    /// Same-currency conversion; no lookup was made.
    Identity,
}

impl RateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateSource::PrimaryApi => "primary-api",
            RateSource::SecondaryApi => "secondary-api",
            RateSource::Fallback => "fallback",
            RateSource::Cached => "cached",
            RateSource::Identity => "identity",
        }
    }
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RateSource {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary-api" => Ok(RateSource::PrimaryApi),
            "secondary-api" => Ok(RateSource::SecondaryApi),
            "fallback" => Ok(RateSource::Fallback),
            "cached" => Ok(RateSource::Cached),
            "identity" => Ok(RateSource::Identity),
            other => Err(FxError::InvalidRate(format!("unknown rate source '{}'", other))),
        }
    }
}

/// Amount of `to` bought by one unit of `from`, valid until `expires_at`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub from: String,
    pub to: String,
    #[serde(serialize_with = "serialize_rate", deserialize_with = "deserialize_rate")]
    pub rate: Decimal,
    pub source: RateSource,
    pub timestamp: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn new(
        from: &str,
        to: &str,
        rate: Decimal,
        source: RateSource,
        timestamp: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            rate,
            source,
            timestamp,
            expires_at: timestamp
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn identity(currency: &str, now: DateTime<Utc>) -> Self {
        Self::new(
            currency,
            currency,
            Decimal::ONE,
            RateSource::Identity,
            now,
            Duration::zero(),
        )
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// The same rate re-labelled as served from a cache.
    pub fn as_cached(&self) -> Self {
        Self {
            source: RateSource::Cached,
            ..self.clone()
        }
    }
}

fn serialize_rate<S>(decimal: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let rounded = decimal.round_dp(DECIMAL_PRECISION);
    serializer.serialize_str(&rounded.to_string())
}

/// Accepts the string form written by `serialize_rate` as well as plain numbers.
fn deserialize_rate<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRate {
        Text(String),
        Number(f64),
    }

    match RawRate::deserialize(deserializer)? {
        RawRate::Text(text) => text.parse().map_err(de::Error::custom),
        RawRate::Number(number) => Decimal::try_from(number).map_err(de::Error::custom),
    }
}

/// One row of the static fallback table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FallbackRateEntry {
    pub from: String,
    pub to: String,
    pub rate: Decimal,
}

impl FallbackRateEntry {
    pub fn new(from: &str, to: &str, rate: Decimal) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            rate,
        }
    }
}

/// An amount tagged with its currency, as fed to `convert_multiple_amounts`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoneyAmount {
    pub amount: Decimal,
    pub currency: String,
}

impl MoneyAmount {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub original_amount: Decimal,
    /// Converted amount, in `to`.
    pub amount: Decimal,
    pub from: String,
    pub to: String,
    #[serde(serialize_with = "serialize_rate", deserialize_with = "deserialize_rate")]
    pub rate: Decimal,
    pub source: RateSource,
    pub timestamp: DateTime<Utc>,
    /// Set when no rate was known at all and 1.0 was assumed.
    pub is_default_rate: bool,
    /// Set when `original_amount * rate` does not fit a `Decimal`; `amount`
    /// is zero then.
    #[serde(default)]
    pub overflowed: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MultiConversionResult {
    pub base_currency: String,
    /// Sum of the conversions that fit; overflowing items are left out.
    pub total: Decimal,
    pub conversions: Vec<ConversionResult>,
    #[serde(default)]
    pub overflowed: bool,
}

/// Canonical (trimmed, uppercase) form of an ISO 4217 code.
pub fn parse_currency_code(code: &str) -> Result<String, FxError> {
    let normalized = code.trim().to_uppercase();
    if normalized.len() == 3 && normalized.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(normalized)
    } else {
        Err(FxError::InvalidCurrencyCode(code.to_string()))
    }
}
