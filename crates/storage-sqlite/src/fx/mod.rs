//! SQLite-backed second-level exchange-rate cache.

mod model;
mod repository;

pub use model::ExchangeRateCacheDB;
pub use repository::ExchangeRateCacheRepository;
