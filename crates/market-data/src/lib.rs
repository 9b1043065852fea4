//! Tallyfolio Market Data Crate
//!
//! Provider-agnostic exchange-rate fetching for the reconciliation core.
//!
//! # Overview
//!
//! The crate exposes a single abstraction, [`ExchangeRateProvider`], and two
//! HTTP-backed implementations:
//!
//! - [`ExchangeRateApiProvider`] - the primary, key-authenticated source
//! - [`FrankfurterProvider`] - the secondary, ECB-backed source
//!
//! # Architecture
//!
//! ```text
//! +---------------------------+
//! | CurrencyConversionService |  (tallyfolio-core)
//! +---------------------------+
//!        |  primary   |  secondary
//!        v            v
//! +--------------+  +--------------+
//! | ExchangeRate |  | Frankfurter  |   (ExchangeRateProvider)
//! |     API      |  |              |
//! +--------------+  +--------------+
//!        |            |
//!        v            v
//!     ProviderRate (rate + provider timestamp)
//! ```
//!
//! Providers never retry and never fall back on their own: every failure is
//! surfaced as a [`MarketDataError`] and the caller decides which source to
//! try next.

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::MarketDataError;
pub use models::ProviderRate;
pub use provider::exchange_rate_api::ExchangeRateApiProvider;
pub use provider::frankfurter::FrankfurterProvider;
pub use provider::ExchangeRateProvider;
