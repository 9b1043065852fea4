//! SQLite storage for security reference data (ISIN, CUSIP, SEDOL, name,
//! exchange keyed by normalized symbol).

mod model;
mod repository;

pub use model::SecurityReferenceDB;
pub use repository::SecurityReferenceRepository;
