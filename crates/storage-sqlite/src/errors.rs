//! Storage-specific error types for SQLite operations.
//!
//! Diesel and r2d2 errors never leave this crate; they are converted to the
//! database-agnostic errors of `tallyfolio_core`.

use diesel::result::Error as DieselError;
use thiserror::Error;
use tallyfolio_core::errors::{DatabaseError, Error};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be mapped back to its domain type.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    #[error("Core error: {0}")]
    CoreError(String),
}

/// Used by the write actor, whose jobs return core errors inside a Diesel
/// transaction.
impl From<Error> for StorageError {
    fn from(err: Error) -> Self {
        StorageError::CoreError(err.to_string())
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => {
                Error::Database(DatabaseError::ConnectionFailed(e.to_string()))
            }
            StorageError::PoolError(e) => {
                Error::Database(DatabaseError::PoolCreationFailed(e.to_string()))
            }
            StorageError::QueryFailed(DieselError::NotFound) => {
                Error::Database(DatabaseError::NotFound("Record not found".to_string()))
            }
            StorageError::QueryFailed(DieselError::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                info,
            )) => Error::Database(DatabaseError::UniqueViolation(info.message().to_string())),
            StorageError::QueryFailed(e) => {
                Error::Database(DatabaseError::QueryFailed(e.to_string()))
            }
            StorageError::MigrationFailed(e) => Error::Database(DatabaseError::MigrationFailed(e)),
            StorageError::CorruptRow(e) => Error::Database(DatabaseError::Internal(e)),
            StorageError::CoreError(e) => Error::Database(DatabaseError::Internal(e)),
        }
    }
}

/// `.into_core()` on Diesel and r2d2 results.
pub trait IntoCore<T> {
    fn into_core(self) -> tallyfolio_core::Result<T>;
}

impl<T> IntoCore<T> for std::result::Result<T, DieselError> {
    fn into_core(self) -> tallyfolio_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

impl<T> IntoCore<T> for std::result::Result<T, r2d2::Error> {
    fn into_core(self) -> tallyfolio_core::Result<T> {
        self.map_err(|e| StorageError::from(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_core_not_found() {
        let err: Error = StorageError::QueryFailed(DieselError::NotFound).into();
        assert!(matches!(err, Error::Database(DatabaseError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_row_maps_to_internal() {
        let err: Error = StorageError::CorruptRow("rate 'abc'".to_string()).into();
        assert!(matches!(err, Error::Database(DatabaseError::Internal(ref m)) if m == "rate 'abc'"));
    }
}
