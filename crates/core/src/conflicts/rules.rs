use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use super::conflicts_errors::ConflictError;
use super::conflicts_model::RuleKind;
use super::conflicts_traits::BrokerPreferenceLookup;
use crate::portfolio::holdings::{Holding, HoldingMetadata};
use crate::settings::{ConflictResolutionSettings, RuleWeights};
use crate::utils::age_of;

/// Everything a rule may look at besides the members themselves.
pub(crate) struct ScoringContext<'a> {
    pub settings: &'a ConflictResolutionSettings,
    /// Unit price of each member in the base currency, index-aligned.
    pub base_prices: &'a [Decimal],
    pub now: DateTime<Utc>,
    pub symbol: &'a str,
    pub preferences: Option<&'a dyn BrokerPreferenceLookup>,
}

/// A rule's pick: member position and raw score in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RulePick {
    pub index: usize,
    pub score: f64,
}

pub(crate) trait ConflictRule: Send + Sync {
    fn kind(&self) -> RuleKind;

    fn weight(&self, weights: &RuleWeights) -> f64;

    /// `Ok(None)` when the rule has nothing to decide on.
    fn evaluate(
        &self,
        members: &[Holding],
        ctx: &ScoringContext<'_>,
    ) -> Result<Option<RulePick>, ConflictError>;

    fn weighted_score(&self, score: f64, weight: f64) -> f64 {
        score * weight
    }

    fn reason(&self, broker: &str, score: f64) -> String;
}

/// The cascade, in evaluation order.
pub(crate) fn default_rules() -> Vec<Box<dyn ConflictRule>> {
    vec![
        Box::new(DataQualityRule),
        Box::new(BrokerPriorityRule),
        Box::new(TimestampRule),
        Box::new(ManualRule),
        Box::new(FallbackRule),
    ]
}

/// Position of the highest score; the earliest wins ties.
fn best_by<F>(members: &[Holding], mut score: F) -> Result<Option<RulePick>, ConflictError>
where
    F: FnMut(usize, &Holding) -> Result<Option<f64>, ConflictError>,
{
    let mut best: Option<RulePick> = None;
    for (index, holding) in members.iter().enumerate() {
        let Some(value) = score(index, holding)? else {
            continue;
        };
        if !value.is_finite() {
            return Err(ConflictError::Scoring(format!(
                "non-finite score for holding {}",
                holding.id
            )));
        }
        if best.map_or(true, |b| value > b.score) {
            best = Some(RulePick {
                index,
                score: value,
            });
        }
    }
    Ok(best)
}

/// 1.0 when `price * quantity` reconciles with the market value within the
/// tolerance, 0.7 when it does not, 0.0 for a non-positive or implausible
/// price.
pub fn price_factor(
    holding: &Holding,
    base_price: Decimal,
    tolerance: Decimal,
    max_plausible_price: Decimal,
) -> Result<f64, ConflictError> {
    if holding.market_price <= Decimal::ZERO || base_price > max_plausible_price {
        return Ok(0.0);
    }
    let computed = holding
        .market_price
        .checked_mul(holding.quantity)
        .ok_or_else(|| {
            ConflictError::Scoring(format!("price * quantity overflows for {}", holding.id))
        })?;
    let allowed = tolerance
        .checked_mul(holding.market_value.abs())
        .ok_or_else(|| {
            ConflictError::Scoring(format!("tolerance overflows for {}", holding.id))
        })?;
    let difference = computed
        .checked_sub(holding.market_value)
        .ok_or_else(|| {
            ConflictError::Scoring(format!("market value difference overflows for {}", holding.id))
        })?
        .abs();
    Ok(if difference <= allowed { 1.0 } else { 0.7 })
}

/// 1.0 under an hour old, 0.8 under a day, 0.6 under a week, 0.3 otherwise
/// or when unknown.
pub fn recency_factor(updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(updated_at) = updated_at else {
        return 0.3;
    };
    let age = age_of(updated_at, now);
    if age < Duration::hours(1) {
        1.0
    } else if age < Duration::hours(24) {
        0.8
    } else if age < Duration::weeks(1) {
        0.6
    } else {
        0.3
    }
}

/// Share of descriptive metadata present, capped at 1.0.
pub fn completeness_factor(metadata: &HoldingMetadata) -> f64 {
    fn present(value: &Option<String>) -> bool {
        value.as_deref().is_some_and(|v| !v.trim().is_empty())
    }

    let fields = [
        (&metadata.isin, 0.2),
        (&metadata.cusip, 0.2),
        (&metadata.name, 0.2),
        (&metadata.exchange, 0.2),
        (&metadata.account_name, 0.1),
        (&metadata.broker_id, 0.1),
    ];
    let total: f64 = fields
        .iter()
        .filter(|(value, _)| present(value))
        .map(|(_, weight)| weight)
        .sum();
    total.min(1.0)
}

fn cost_basis_factor(holding: &Holding) -> f64 {
    match holding.cost_basis {
        Some(cost) if cost >= Decimal::ZERO => 1.0,
        _ => 0.0,
    }
}

pub(crate) struct DataQualityRule;

impl DataQualityRule {
    fn quality(
        holding: &Holding,
        base_price: Decimal,
        ctx: &ScoringContext<'_>,
    ) -> Result<f64, ConflictError> {
        let settings = ctx.settings;
        let price = price_factor(
            holding,
            base_price,
            settings.price_tolerance,
            settings.max_plausible_price,
        )?;
        Ok(0.25 * price
            + 0.20 * cost_basis_factor(holding)
            + 0.15 * recency_factor(holding.updated_at(), ctx.now)
            + 0.15 * completeness_factor(&holding.metadata)
            + 0.25 * settings.reliability_for(&holding.broker_id))
    }
}

impl ConflictRule for DataQualityRule {
    fn kind(&self) -> RuleKind {
        RuleKind::DataQuality
    }

    fn weight(&self, weights: &RuleWeights) -> f64 {
        weights.data_quality
    }

    fn evaluate(
        &self,
        members: &[Holding],
        ctx: &ScoringContext<'_>,
    ) -> Result<Option<RulePick>, ConflictError> {
        if ctx.base_prices.len() != members.len() {
            return Err(ConflictError::Scoring(format!(
                "{} base prices for {} holdings",
                ctx.base_prices.len(),
                members.len()
            )));
        }
        best_by(members, |index, holding| {
            Self::quality(holding, ctx.base_prices[index], ctx).map(Some)
        })
    }

    fn reason(&self, broker: &str, score: f64) -> String {
        format!("{} has the highest data quality score ({:.2})", broker, score)
    }
}

pub(crate) struct BrokerPriorityRule;

impl ConflictRule for BrokerPriorityRule {
    fn kind(&self) -> RuleKind {
        RuleKind::BrokerPriority
    }

    fn weight(&self, weights: &RuleWeights) -> f64 {
        weights.broker_priority
    }

    fn evaluate(
        &self,
        members: &[Holding],
        ctx: &ScoringContext<'_>,
    ) -> Result<Option<RulePick>, ConflictError> {
        best_by(members, |_, holding| {
            Ok(Some(ctx.settings.reliability_for(&holding.broker_id)))
        })
    }

    fn reason(&self, broker: &str, score: f64) -> String {
        format!("{} is the most reliable broker ({:.2})", broker, score)
    }
}

pub(crate) struct TimestampRule;

impl ConflictRule for TimestampRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Timestamp
    }

    fn weight(&self, weights: &RuleWeights) -> f64 {
        weights.timestamp
    }

    fn evaluate(
        &self,
        members: &[Holding],
        ctx: &ScoringContext<'_>,
    ) -> Result<Option<RulePick>, ConflictError> {
        let mut latest: Option<(usize, DateTime<Utc>)> = None;
        for (index, holding) in members.iter().enumerate() {
            if let Some(updated_at) = holding.updated_at() {
                if latest.map_or(true, |(_, best)| updated_at > best) {
                    latest = Some((index, updated_at));
                }
            }
        }
        Ok(latest.map(|(index, updated_at)| RulePick {
            index,
            score: recency_factor(Some(updated_at), ctx.now),
        }))
    }

    fn reason(&self, broker: &str, _score: f64) -> String {
        format!("{} reported the most recent update", broker)
    }
}

pub(crate) struct ManualRule;

impl ConflictRule for ManualRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Manual
    }

    fn weight(&self, weights: &RuleWeights) -> f64 {
        weights.manual
    }

    fn evaluate(
        &self,
        members: &[Holding],
        ctx: &ScoringContext<'_>,
    ) -> Result<Option<RulePick>, ConflictError> {
        let Some(lookup) = ctx.preferences else {
            return Ok(None);
        };
        let preferred = lookup
            .preferred_brokers(ctx.symbol)
            .map_err(|e| ConflictError::Scoring(format!("broker preference lookup: {}", e)))?;
        let Some(preferred) = preferred else {
            return Ok(None);
        };

        Ok(preferred.iter().find_map(|broker| {
            members
                .iter()
                .position(|h| h.broker_key() == *broker)
                .map(|index| RulePick { index, score: 1.0 })
        }))
    }

    fn reason(&self, broker: &str, _score: f64) -> String {
        format!("{} is the preferred broker for this security", broker)
    }
}

/// First member, flat score equal to the rule's weight.
pub(crate) struct FallbackRule;

impl ConflictRule for FallbackRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Fallback
    }

    fn weight(&self, weights: &RuleWeights) -> f64 {
        weights.fallback
    }

    fn evaluate(
        &self,
        members: &[Holding],
        ctx: &ScoringContext<'_>,
    ) -> Result<Option<RulePick>, ConflictError> {
        Ok((!members.is_empty()).then(|| RulePick {
            index: 0,
            score: ctx.settings.weights.fallback,
        }))
    }

    fn weighted_score(&self, score: f64, _weight: f64) -> f64 {
        score
    }

    fn reason(&self, broker: &str, _score: f64) -> String {
        format!("No rule was decisive; defaulting to {}", broker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::holdings::AssetClass;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn holding() -> Holding {
        Holding {
            id: "h1".to_string(),
            symbol: "EQNR".to_string(),
            quantity: dec!(100),
            market_price: dec!(300),
            market_value: dec!(30000),
            cost_basis: Some(dec!(25000)),
            currency: "NOK".to_string(),
            asset_class: AssetClass::Equity,
            broker_id: "nordnet".to_string(),
            account_id: "acc".to_string(),
            last_updated: None,
            metadata: HoldingMetadata::default(),
        }
    }

    #[test]
    fn test_price_factor() {
        let h = holding();
        let max = dec!(1000000);
        assert_eq!(price_factor(&h, dec!(28), dec!(0.01), max).unwrap(), 1.0);

        let mut off = holding();
        off.market_value = dec!(31000);
        assert_eq!(price_factor(&off, dec!(28), dec!(0.01), max).unwrap(), 0.7);

        let mut zero = holding();
        zero.market_price = Decimal::ZERO;
        assert_eq!(price_factor(&zero, Decimal::ZERO, dec!(0.01), max).unwrap(), 0.0);

        assert_eq!(price_factor(&h, dec!(2000000), dec!(0.01), max).unwrap(), 0.0);
    }

    #[test]
    fn test_price_factor_overflow_is_an_error() {
        let mut h = holding();
        h.quantity = Decimal::MAX;
        h.market_price = dec!(2);
        assert!(matches!(
            price_factor(&h, dec!(2), dec!(0.01), dec!(1000000)),
            Err(ConflictError::Scoring(_))
        ));
    }

    #[test]
    fn test_recency_buckets() {
        let now = Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap();
        assert_eq!(recency_factor(Some(now - Duration::minutes(10)), now), 1.0);
        assert_eq!(recency_factor(Some(now - Duration::hours(5)), now), 0.8);
        assert_eq!(recency_factor(Some(now - Duration::days(3)), now), 0.6);
        assert_eq!(recency_factor(Some(now - Duration::days(30)), now), 0.3);
        assert_eq!(recency_factor(None, now), 0.3);
        // Clock skew: a future timestamp counts as fresh.
        assert_eq!(recency_factor(Some(now + Duration::minutes(5)), now), 1.0);
    }

    #[test]
    fn test_completeness_is_capped() {
        let full = HoldingMetadata {
            isin: Some("NO0010096985".to_string()),
            cusip: Some("29446M102".to_string()),
            sedol: None,
            name: Some("Equinor ASA".to_string()),
            exchange: Some("XOSL".to_string()),
            account_name: Some("ASK".to_string()),
            broker_id: Some("nordnet-1".to_string()),
            last_updated: None,
        };
        assert!((completeness_factor(&full) - 1.0).abs() < 1e-9);

        let partial = HoldingMetadata {
            isin: Some("NO0010096985".to_string()),
            account_name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!((completeness_factor(&partial) - 0.2).abs() < 1e-9);
        assert_eq!(completeness_factor(&HoldingMetadata::default()), 0.0);
    }
}
