//! Market data models
//!
//! - `rate` - Exchange rate as returned by a provider (ProviderRate)

mod rate;

pub use rate::ProviderRate;
