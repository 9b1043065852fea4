use serde::{Deserialize, Serialize};

use crate::conflicts::ConflictResolutionResult;
use crate::duplicates::DuplicateGroup;
use crate::fx::MultiConversionResult;
use crate::portfolio::holdings::Holding;

/// A duplicate group together with the holding chosen to represent it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedHolding {
    pub group: DuplicateGroup,
    pub resolution: ConflictResolutionResult,
}

/// Reconciled view of holdings reported by several brokers.
///
/// Every input holding appears exactly once: either in `unique_holdings` or
/// as a member of one `resolved` group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub unique_holdings: Vec<Holding>,
    pub resolved: Vec<ResolvedHolding>,
    /// Market value of the unique and preferred holdings, in the base currency.
    pub total_market_value: MultiConversionResult,
}

impl AggregationResult {
    /// Holdings that count towards the portfolio: unique ones, then the
    /// preferred holding of each group.
    pub fn surviving_holdings(&self) -> impl Iterator<Item = &Holding> {
        self.unique_holdings
            .iter()
            .chain(self.resolved.iter().map(|r| &r.resolution.preferred_holding))
    }
}
