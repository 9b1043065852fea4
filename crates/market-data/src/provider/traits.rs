//! Exchange-rate provider trait definitions.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::ProviderRate;

/// Trait for exchange-rate providers.
///
/// Implement this trait to add a new rate source. The conversion service
/// wraps every call in its own timeout, so implementations only need to make
/// a best effort to fail fast.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use tallyfolio_market_data::{ExchangeRateProvider, MarketDataError, ProviderRate};
///
/// struct StaticProvider;
///
/// #[async_trait]
/// impl ExchangeRateProvider for StaticProvider {
///     fn id(&self) -> &'static str {
///         "STATIC"
///     }
///
///     async fn get_exchange_rate(&self, from: &str, to: &str) -> Result<ProviderRate, MarketDataError> {
///         Ok(ProviderRate::new(from, to, rust_decimal::Decimal::ONE, self.id()))
///     }
/// }
/// ```
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "EXCHANGE_RATE_API" or "FRANKFURTER".
    /// Used for logging.
    fn id(&self) -> &'static str;

    /// Fetch the latest rate converting one unit of `from` into `to`.
    async fn get_exchange_rate(&self, from: &str, to: &str)
        -> Result<ProviderRate, MarketDataError>;
}

/// Converts a float rate from a JSON payload into a positive `Decimal`.
///
/// Zero, negative and non-finite rates are rejected as invalid responses.
pub fn rate_from_f64(provider: &str, value: f64) -> Result<Decimal, MarketDataError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(MarketDataError::InvalidResponse {
            provider: provider.to_string(),
            message: format!("Invalid rate: {}", value),
        });
    }
    Decimal::try_from(value).map_err(|_| MarketDataError::InvalidResponse {
        provider: provider.to_string(),
        message: format!("Rate {} is not representable as a decimal", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rate_from_f64_accepts_positive() {
        assert_eq!(rate_from_f64("TEST", 8.5).unwrap(), dec!(8.5));
    }

    #[test]
    fn test_rate_from_f64_rejects_zero_and_negative() {
        assert!(rate_from_f64("TEST", 0.0).is_err());
        assert!(rate_from_f64("TEST", -1.2).is_err());
        assert!(rate_from_f64("TEST", f64::NAN).is_err());
    }
}
