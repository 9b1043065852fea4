//! Exchange-rate provider abstractions and implementations.
//!
//! This module contains:
//! - The `ExchangeRateProvider` trait that all providers implement
//! - Concrete HTTP providers (ExchangeRate-API, Frankfurter)
//!
//! Providers receive already-normalized ISO 4217 codes (uppercase, trimmed).

mod traits;

pub mod exchange_rate_api;
pub mod frankfurter;

pub use traits::{rate_from_f64, ExchangeRateProvider};
