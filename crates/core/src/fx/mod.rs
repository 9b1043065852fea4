//! FX (Foreign Exchange) module - rate resolution, caching and conversion.

mod fallback_rates;
mod fx_errors;
mod fx_model;
mod fx_service;
mod fx_traits;
mod rate_cache;


pub use fallback_rates::{default_fallback_rates, FallbackKind, FallbackRate, FallbackRates};
pub use fx_errors::FxError;
pub use fx_model::{
    parse_currency_code, ConversionResult, ExchangeRate, FallbackRateEntry, MoneyAmount,
    MultiConversionResult, RateSource,
};
pub use fx_service::CurrencyConversionService;
pub use fx_traits::{ExchangeRateCacheStore, FxServiceTrait, NoOpExchangeRateCacheStore};
pub use rate_cache::RateCache;
