//! Conflict resolution - picks the authoritative holding of a duplicate group.

mod conflict_resolver;
mod conflicts_errors;
mod conflicts_model;
mod conflicts_traits;
mod rules;


pub use conflict_resolver::ConflictResolver;
pub use conflicts_errors::ConflictError;
pub use conflicts_model::{AppliedRule, ConflictResolutionResult, RuleKind};
pub use conflicts_traits::{BrokerPreferenceLookup, StaticBrokerPreferences};
pub use rules::{completeness_factor, price_factor, recency_factor};
