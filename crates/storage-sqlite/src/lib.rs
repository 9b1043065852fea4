//! SQLite storage for Tallyfolio.
//!
//! Implements the persistence traits defined in `tallyfolio-core` with Diesel
//! on SQLite:
//! - the second-level exchange-rate cache ([`ExchangeRateCacheRepository`])
//! - security reference data used to enrich holdings
//!   ([`SecurityReferenceRepository`])
//!
//! This crate is the only place where Diesel dependencies exist.
//!
//! ```text
//! core (reconciliation engine)
//!          │  ExchangeRateCacheStore, SecurityReferenceLookup
//!          ▼
//! storage-sqlite (this crate)
//!          │
//!          ▼
//!      SQLite DB
//! ```
//!
//! Reads go straight to the pool; every write goes through the single writer
//! task ([`WriteHandle`]).

pub mod db;
pub mod errors;
pub mod schema;

pub mod fx;
pub mod securities;

pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};
pub use errors::{IntoCore, StorageError};
pub use fx::ExchangeRateCacheRepository;
pub use securities::SecurityReferenceRepository;

pub use tallyfolio_core::errors::{DatabaseError, Error, Result};
