//! Tallyfolio Core - reconciliation of holdings reported by several brokers.
//!
//! This crate contains the reconciliation engine: identifier resolution,
//! duplicate detection, conflict resolution and currency conversion. It is
//! database-agnostic and defines the traits that are implemented by the
//! `storage-sqlite` crate.
//!
//! ```text
//! holdings -> SecurityIdentifierResolver -> DuplicateDetector
//!          -> ConflictResolver (per group) -> CurrencyConversionService
//!          -> AggregationResult
//! ```

pub mod conflicts;
pub mod constants;
pub mod duplicates;
pub mod errors;
pub mod fx;
pub mod identifiers;
pub mod portfolio;
pub mod settings;
pub mod utils;

pub use portfolio::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
