//! Reconciliation settings - thresholds, weights and FX configuration.

mod settings_model;

#[cfg(test)]
mod settings_model_tests;

pub use settings_model::{
    ConflictResolutionSettings, DuplicateDetectionSettings, FxSettings, ReconciliationSettings,
    RuleWeights, MAX_CACHE_TTL_SECS,
};
