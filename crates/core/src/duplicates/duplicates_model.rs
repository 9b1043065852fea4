use serde::{Deserialize, Serialize};

use crate::identifiers::SecurityIdentifiers;
use crate::portfolio::holdings::Holding;

/// Which detection pass produced a group.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Accepted for groups confirmed outside the detection cascade; the
    /// cascade itself never emits it.
    Exact,
    Isin,
    Cusip,
    Symbol,
    Fuzzy,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Isin => "isin",
            MatchType::Cusip => "cusip",
            MatchType::Symbol => "symbol",
            MatchType::Fuzzy => "fuzzy",
        }
    }
}

/// Holdings believed to represent the same security across brokers.
///
/// Members come from pairwise-distinct brokers (unless same-broker identifier
/// matches are enabled), share one asset class and span at most the
/// configured number of currencies.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub members: Vec<Holding>,
    /// Positions of `members` in the detector's input, ascending.
    pub member_indices: Vec<usize>,
    pub primary_symbol: String,
    pub match_type: MatchType,
    pub confidence: f64,
    /// First non-empty value per field, in member order.
    pub identifiers: SecurityIdentifiers,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn broker_ids(&self) -> Vec<&str> {
        self.members.iter().map(|h| h.broker_id.as_str()).collect()
    }
}
