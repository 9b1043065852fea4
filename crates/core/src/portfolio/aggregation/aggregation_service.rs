use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, info};
use std::sync::Arc;

use super::aggregation_model::{AggregationResult, ResolvedHolding};
use crate::conflicts::ConflictResolver;
use crate::duplicates::{unique_indices, DuplicateDetector};
use crate::errors::Result;
use crate::fx::{FxServiceTrait, MoneyAmount};
use crate::portfolio::holdings::Holding;

#[async_trait]
pub trait PortfolioAggregationServiceTrait: Send + Sync {
    /// Deduplicates holdings across brokers and values the result in
    /// `base_currency`.
    async fn aggregate(&self, holdings: &[Holding], base_currency: &str)
        -> Result<AggregationResult>;
}

/// Runs the full reconciliation pipeline: identifier resolution, duplicate
/// detection, conflict resolution and currency conversion.
pub struct PortfolioAggregationService {
    detector: DuplicateDetector,
    resolver: Arc<ConflictResolver>,
    fx: Arc<dyn FxServiceTrait>,
}

impl PortfolioAggregationService {
    pub fn new(
        detector: DuplicateDetector,
        resolver: Arc<ConflictResolver>,
        fx: Arc<dyn FxServiceTrait>,
    ) -> Self {
        Self {
            detector,
            resolver,
            fx,
        }
    }
}

#[async_trait]
impl PortfolioAggregationServiceTrait for PortfolioAggregationService {
    async fn aggregate(
        &self,
        holdings: &[Holding],
        base_currency: &str,
    ) -> Result<AggregationResult> {
        let groups = self.detector.detect_duplicates(holdings).await;
        let unique_holdings: Vec<Holding> = unique_indices(holdings.len(), &groups)
            .into_iter()
            .map(|i| holdings[i].clone())
            .collect();

        debug!(
            "Resolving {} duplicate groups; {} holdings are unique",
            groups.len(),
            unique_holdings.len()
        );

        let resolutions = join_all(
            groups
                .iter()
                .map(|group| self.resolver.resolve_conflicts(&group.members)),
        )
        .await;

        let mut resolved = Vec::with_capacity(groups.len());
        for (group, resolution) in groups.into_iter().zip(resolutions) {
            resolved.push(ResolvedHolding {
                group,
                resolution: resolution?,
            });
        }

        let amounts: Vec<MoneyAmount> = unique_holdings
            .iter()
            .chain(resolved.iter().map(|r| &r.resolution.preferred_holding))
            .map(|h| MoneyAmount::new(h.market_value, &h.currency))
            .collect();
        let total_market_value = self.fx.convert_multiple_amounts(&amounts, base_currency).await;

        info!(
            "Aggregated {} holdings into {} positions worth {} {}",
            holdings.len(),
            amounts.len(),
            total_market_value.total.round_dp(2),
            total_market_value.base_currency
        );

        Ok(AggregationResult {
            unique_holdings,
            resolved,
            total_market_value,
        })
    }
}
