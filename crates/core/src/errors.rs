//! Error types of the reconciliation core.
//!
//! The engine itself degrades instead of failing (see the module docs of
//! `fx` and `conflicts`); these errors come from the collaborators it talks
//! to: stores, providers and configuration. Storage crates convert their own
//! errors into [`DatabaseError`] so this crate stays database-agnostic.

use thiserror::Error;

use crate::conflicts::ConflictError;
use crate::fx::FxError;
use tallyfolio_market_data::MarketDataError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to load configuration: {0}")]
    ConfigIO(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Exchange-rate provider failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Conflict resolution failed: {0}")]
    Conflict(#[from] ConflictError),

    #[error("Currency conversion failed: {0}")]
    Fx(#[from] FxError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Storage failures, flattened to strings by the storage layer.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Malformed input records or documents.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::ConfigIO(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_are_validation_errors() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, Error::Validation(ValidationError::InvalidInput(_))));
    }

    #[test]
    fn test_conflict_error_converts() {
        let err: Error = ConflictError::EmptyGroup.into();
        assert!(matches!(err, Error::Conflict(ConflictError::EmptyGroup)));
    }
}
