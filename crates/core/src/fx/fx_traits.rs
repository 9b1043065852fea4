use super::fx_model::{ConversionResult, ExchangeRate, MoneyAmount, MultiConversionResult};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Persistent second-level rate cache.
///
/// Reads are synchronous; writes go through the storage writer.
#[async_trait]
pub trait ExchangeRateCacheStore: Send + Sync {
    /// Stored rate for the ordered pair, expired or not.
    fn get_rate(&self, from: &str, to: &str) -> Result<Option<ExchangeRate>>;
    async fn upsert_rate(&self, rate: ExchangeRate) -> Result<()>;
    /// Deletes every entry expired at `now` and returns the deleted pairs.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<Vec<(String, String)>>;
}

/// Store used when no persistence is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpExchangeRateCacheStore;

#[async_trait]
impl ExchangeRateCacheStore for NoOpExchangeRateCacheStore {
    fn get_rate(&self, _from: &str, _to: &str) -> Result<Option<ExchangeRate>> {
        Ok(None)
    }

    async fn upsert_rate(&self, _rate: ExchangeRate) -> Result<()> {
        Ok(())
    }

    async fn delete_expired(&self, _now: DateTime<Utc>) -> Result<Vec<(String, String)>> {
        Ok(Vec::new())
    }
}

/// Trait defining the contract for currency conversion.
///
/// Rate resolution never fails: when every live source is unavailable the
/// static table (and ultimately 1.0) answers.
#[async_trait]
pub trait FxServiceTrait: Send + Sync {
    async fn get_exchange_rate(&self, from: &str, to: &str) -> ExchangeRate;

    async fn convert_amount(&self, amount: Decimal, from: &str, to: &str) -> ConversionResult;

    async fn convert_multiple_amounts(
        &self,
        items: &[MoneyAmount],
        base_currency: &str,
    ) -> MultiConversionResult;

    /// Removes expired rates from both cache levels. Returns the number of
    /// persistent entries deleted.
    async fn cleanup_expired_rates(&self) -> Result<usize>;
}
