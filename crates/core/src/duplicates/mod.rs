//! Duplicate detection - finds holdings of the same security reported by
//! different brokers.

mod duplicate_detector;
mod duplicates_model;
mod similarity;


pub use duplicate_detector::{unique_indices, DuplicateDetector};
pub use duplicates_model::{DuplicateGroup, MatchType};
pub use similarity::{levenshtein, name_similarity};
