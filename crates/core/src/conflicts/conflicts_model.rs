use serde::{Deserialize, Serialize};

use crate::portfolio::holdings::Holding;

/// Rules of the resolution cascade, in evaluation order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    DataQuality,
    BrokerPriority,
    Timestamp,
    Manual,
    Fallback,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::DataQuality => "data_quality",
            RuleKind::BrokerPriority => "broker_priority",
            RuleKind::Timestamp => "timestamp",
            RuleKind::Manual => "manual",
            RuleKind::Fallback => "fallback",
        }
    }
}

/// Audit entry for one rule of the cascade.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppliedRule {
    pub rule: RuleKind,
    /// False when the rule had nothing to decide on (no timestamps, no
    /// configured preference).
    pub applied: bool,
    pub selected_broker: Option<String>,
    pub score: f64,
    pub weighted_score: f64,
    pub won: bool,
}

impl AppliedRule {
    pub(crate) fn skipped(rule: RuleKind) -> Self {
        Self {
            rule,
            applied: false,
            selected_broker: None,
            score: 0.0,
            weighted_score: 0.0,
            won: false,
        }
    }
}

/// Outcome of resolving one duplicate group.
///
/// `preferred_holding` is always one of the group's members; every other
/// member is listed in `alternatives`, in input order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResolutionResult {
    pub preferred_holding: Holding,
    /// Broker id of `preferred_holding`.
    pub preferred_source: String,
    pub reason: String,
    pub confidence: f64,
    pub alternatives: Vec<Holding>,
    pub applied_rules: Vec<AppliedRule>,
}
