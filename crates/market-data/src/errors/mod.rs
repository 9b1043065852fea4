//! Error types for the market data crate.

use thiserror::Error;

/// Errors that can occur while fetching an exchange rate.
///
/// The reconciliation core treats every variant as "source unavailable" and
/// moves on to the next source in its cascade; the distinction between
/// variants is kept for logging and for callers that use providers directly.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider does not know one of the currencies in the pair.
    #[error("Unsupported currency pair: {from}/{to}")]
    UnsupportedPair {
        /// Source currency
        from: String,
        /// Target currency
        to: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// A provider-specific error occurred.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider answered, but the payload could not be used.
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse {
        /// The provider that returned the payload
        provider: String,
        /// What was wrong with it
        message: String,
    },

    /// The provider is not configured (for example, a missing API key).
    #[error("Provider not configured: {provider}")]
    NotConfigured {
        /// The provider that is missing configuration
        provider: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Whether the failure is transient, i.e. the same request may succeed later.
    ///
    /// Transient failures are worth a log line at `warn`; permanent ones
    /// (unsupported pair, missing configuration) only at `debug`.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::RateLimited { .. } | Self::Network(_) => true,
            Self::ProviderError { .. } | Self::InvalidResponse { .. } => true,
            Self::UnsupportedPair { .. } | Self::NotConfigured { .. } => false,
        }
    }

    /// Builds an error from a non-success HTTP status.
    pub fn from_status(provider: &str, status: reqwest::StatusCode) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited {
                provider: provider.to_string(),
            }
        } else {
            Self::ProviderError {
                provider: provider.to_string(),
                message: format!("HTTP {}", status),
            }
        }
    }

    /// Maps a reqwest error, distinguishing timeouts from other network failures.
    pub fn from_reqwest(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                provider: provider.to_string(),
            }
        } else {
            Self::Network(err)
        }
    }
}
