use async_trait::async_trait;
use chrono::Duration;
use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tallyfolio_market_data::ExchangeRateProvider;

use super::fallback_rates::{FallbackKind, FallbackRates};
use super::fx_model::{
    ConversionResult, ExchangeRate, MoneyAmount, MultiConversionResult, RateSource,
};
use super::fx_traits::{ExchangeRateCacheStore, FxServiceTrait};
use super::rate_cache::RateCache;
use crate::errors::Result;
use crate::settings::FxSettings;
use crate::utils::{Clock, SystemClock};

/// Resolves exchange rates through memory cache, persistent store, primary
/// API, secondary API and finally the static fallback table.
///
/// Live fetches are written back to both cache levels. Fallback answers are
/// never cached, so a recovered provider is picked up on the next lookup.
pub struct CurrencyConversionService {
    primary: Option<Arc<dyn ExchangeRateProvider>>,
    secondary: Option<Arc<dyn ExchangeRateProvider>>,
    store: Arc<dyn ExchangeRateCacheStore>,
    cache: RateCache,
    fallback: FallbackRates,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    request_timeout: std::time::Duration,
}

impl CurrencyConversionService {
    pub fn new(store: Arc<dyn ExchangeRateCacheStore>, settings: &FxSettings) -> Result<Self> {
        Ok(Self {
            primary: None,
            secondary: None,
            store,
            cache: RateCache::new(),
            fallback: FallbackRates::new(&settings.fallback_rates)?,
            clock: Arc::new(SystemClock),
            ttl: settings.cache_ttl(),
            request_timeout: settings.request_timeout(),
        })
    }

    pub fn with_primary_provider(mut self, provider: Arc<dyn ExchangeRateProvider>) -> Self {
        self.primary = Some(provider);
        self
    }

    pub fn with_secondary_provider(mut self, provider: Arc<dyn ExchangeRateProvider>) -> Self {
        self.secondary = Some(provider);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The in-memory cache level, exposed for inspection.
    pub fn memory_cache(&self) -> &RateCache {
        &self.cache
    }

    fn normalize(code: &str) -> String {
        code.trim().to_uppercase()
    }

    fn read_persistent(&self, from: &str, to: &str) -> Option<ExchangeRate> {
        let now = self.clock.now();
        match self.store.get_rate(from, to) {
            Ok(Some(rate)) if !rate.is_expired_at(now) => Some(rate),
            Ok(Some(_)) => {
                log::debug!("Persistent rate {}/{} is expired, ignoring", from, to);
                None
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Failed to read cached rate {}/{}: {}", from, to, e);
                None
            }
        }
    }

    async fn fetch_from_provider(
        &self,
        provider: &Arc<dyn ExchangeRateProvider>,
        from: &str,
        to: &str,
    ) -> Option<Decimal> {
        let call = provider.get_exchange_rate(from, to);
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(Ok(fetched)) if fetched.rate > Decimal::ZERO => Some(fetched.rate),
            Ok(Ok(fetched)) => {
                log::warn!(
                    "{} returned a non-positive rate {} for {}/{}",
                    provider.id(),
                    fetched.rate,
                    from,
                    to
                );
                None
            }
            Ok(Err(e)) if e.is_transient() => {
                log::warn!("{} unavailable for {}/{}: {}", provider.id(), from, to, e);
                None
            }
            Ok(Err(e)) => {
                log::debug!("{} cannot serve {}/{}: {}", provider.id(), from, to, e);
                None
            }
            Err(_) => {
                log::warn!(
                    "{} timed out after {:?} for {}/{}",
                    provider.id(),
                    self.request_timeout,
                    from,
                    to
                );
                None
            }
        }
    }

    async fn fetch_live(&self, from: &str, to: &str) -> Option<ExchangeRate> {
        let sources = [
            (self.primary.as_ref(), RateSource::PrimaryApi),
            (self.secondary.as_ref(), RateSource::SecondaryApi),
        ];
        for (provider, source) in sources {
            let Some(provider) = provider else {
                continue;
            };
            if let Some(rate) = self.fetch_from_provider(provider, from, to).await {
                return Some(ExchangeRate::new(
                    from,
                    to,
                    rate,
                    source,
                    self.clock.now(),
                    self.ttl,
                ));
            }
        }
        None
    }

    async fn remember(&self, rate: &ExchangeRate) {
        self.cache.insert(rate.clone());
        if let Err(e) = self.store.upsert_rate(rate.clone()).await {
            log::warn!("Failed to persist rate {}/{}: {}", rate.from, rate.to, e);
        }
    }

    fn fallback_rate(&self, from: &str, to: &str) -> ExchangeRate {
        let fallback = self.fallback.lookup(from, to);
        match fallback.kind {
            FallbackKind::Default => log::warn!(
                "No exchange rate available for {}/{}; assuming 1.0",
                from,
                to
            ),
            kind => log::info!(
                "Using static fallback rate for {}/{} ({:?}): {}",
                from,
                to,
                kind,
                fallback.rate
            ),
        }
        ExchangeRate::new(
            from,
            to,
            fallback.rate,
            RateSource::Fallback,
            self.clock.now(),
            self.ttl,
        )
    }

    fn is_default_rate(&self, rate: &ExchangeRate) -> bool {
        rate.source == RateSource::Fallback
            && self.fallback.lookup(&rate.from, &rate.to).kind == FallbackKind::Default
    }

    fn to_conversion(&self, amount: Decimal, rate: &ExchangeRate) -> ConversionResult {
        let converted = amount.checked_mul(rate.rate);
        if converted.is_none() {
            log::warn!(
                "Converting {} {} to {} at {} overflows; reporting zero",
                amount,
                rate.from,
                rate.to,
                rate.rate
            );
        }
        ConversionResult {
            original_amount: amount,
            amount: converted.unwrap_or(Decimal::ZERO),
            from: rate.from.clone(),
            to: rate.to.clone(),
            rate: rate.rate,
            source: rate.source,
            timestamp: rate.timestamp,
            is_default_rate: self.is_default_rate(rate),
            overflowed: converted.is_none(),
        }
    }
}

#[async_trait]
impl FxServiceTrait for CurrencyConversionService {
    async fn get_exchange_rate(&self, from: &str, to: &str) -> ExchangeRate {
        let from = Self::normalize(from);
        let to = Self::normalize(to);
        let now = self.clock.now();

        if from == to {
            return ExchangeRate::identity(&from, now);
        }

        if let Some(rate) = self.cache.get(&from, &to, now) {
            return rate.as_cached();
        }

        if let Some(rate) = self.read_persistent(&from, &to) {
            self.cache.insert(rate.clone());
            return rate.as_cached();
        }

        if let Some(rate) = self.fetch_live(&from, &to).await {
            self.remember(&rate).await;
            return rate;
        }

        self.fallback_rate(&from, &to)
    }

    async fn convert_amount(&self, amount: Decimal, from: &str, to: &str) -> ConversionResult {
        let rate = self.get_exchange_rate(from, to).await;
        self.to_conversion(amount, &rate)
    }

    async fn convert_multiple_amounts(
        &self,
        items: &[MoneyAmount],
        base_currency: &str,
    ) -> MultiConversionResult {
        let base = Self::normalize(base_currency);

        let mut seen = HashSet::new();
        let currencies: Vec<String> = items
            .iter()
            .map(|item| Self::normalize(&item.currency))
            .filter(|currency| seen.insert(currency.clone()))
            .collect();

        let rates = join_all(
            currencies
                .iter()
                .map(|currency| self.get_exchange_rate(currency, &base)),
        )
        .await;
        let by_currency: HashMap<String, ExchangeRate> =
            currencies.into_iter().zip(rates).collect();

        let conversions: Vec<ConversionResult> = items
            .iter()
            .filter_map(|item| {
                by_currency
                    .get(&Self::normalize(&item.currency))
                    .map(|rate| self.to_conversion(item.amount, rate))
            })
            .collect();
        let mut overflowed = conversions.iter().any(|c| c.overflowed);
        let mut total = Decimal::ZERO;
        for conversion in &conversions {
            match total.checked_add(conversion.amount) {
                Some(sum) => total = sum,
                None => {
                    log::warn!(
                        "Total in {} overflows; leaving out {} {}",
                        base,
                        conversion.original_amount,
                        conversion.from
                    );
                    overflowed = true;
                }
            }
        }

        MultiConversionResult {
            base_currency: base,
            total,
            conversions,
            overflowed,
        }
    }

    async fn cleanup_expired_rates(&self) -> Result<usize> {
        let now = self.clock.now();
        let deleted = self.store.delete_expired(now).await?;
        self.cache.purge(&deleted);
        let purged = self.cache.purge_expired(now);
        log::info!(
            "Removed {} expired persistent rates and {} expired in-memory rates",
            deleted.len(),
            purged
        );
        Ok(deleted.len())
    }
}
