//! Security identifiers - canonical identity of a holding's instrument.
//!
//! Broker feeds describe the same security in different ways ("AAPL",
//! "AAPL.O", "Apple Inc.", an ISIN on one feed and a CUSIP on another). This
//! module turns every holding into a [`SecurityIdentifiers`] record that the
//! duplicate detector can compare.

mod identifier_resolver;
mod identifiers_constants;
mod identifiers_model;
mod identifiers_traits;
mod normalization;

pub use identifier_resolver::SecurityIdentifierResolver;
pub use identifiers_constants::{ENTITY_SUFFIXES, EXCHANGE_SUFFIXES};
pub use identifiers_model::{SecurityIdentifiers, SecurityReference};
pub use identifiers_traits::{NoOpSecurityReferenceLookup, SecurityReferenceLookup};
pub use normalization::{normalize_code, normalize_name, normalize_symbol};
