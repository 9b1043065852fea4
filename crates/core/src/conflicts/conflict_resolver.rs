use futures::future::join_all;
use log::{debug, error};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::conflicts_errors::ConflictError;
use super::conflicts_model::{AppliedRule, ConflictResolutionResult, RuleKind};
use super::conflicts_traits::BrokerPreferenceLookup;
use super::rules::{default_rules, ConflictRule, RulePick, ScoringContext};
use crate::fx::FxServiceTrait;
use crate::identifiers::normalize_symbol;
use crate::portfolio::holdings::Holding;
use crate::settings::ConflictResolutionSettings;
use crate::utils::{Clock, SystemClock};

/// Chooses the authoritative holding among duplicates.
///
/// Every rule scores the group independently; a rule's weighted score is its
/// raw score times its weight, and the single highest weighted score wins
/// (earlier rules win ties). Scoring failures never reach the caller: the
/// most reliable broker is picked instead, at reduced confidence.
pub struct ConflictResolver {
    settings: ConflictResolutionSettings,
    base_currency: String,
    fx: Arc<dyn FxServiceTrait>,
    preferences: Option<Arc<dyn BrokerPreferenceLookup>>,
    clock: Arc<dyn Clock>,
    rules: Vec<Box<dyn ConflictRule>>,
}

/// Winning rule while folding over the cascade.
struct Leader {
    position: usize,
    pick: RulePick,
    weighted: f64,
}

impl ConflictResolver {
    pub fn new(
        settings: ConflictResolutionSettings,
        base_currency: &str,
        fx: Arc<dyn FxServiceTrait>,
    ) -> Self {
        Self {
            settings,
            base_currency: base_currency.trim().to_uppercase(),
            fx,
            preferences: None,
            clock: Arc::new(SystemClock),
            rules: default_rules(),
        }
    }

    pub fn with_broker_preferences(mut self, preferences: Arc<dyn BrokerPreferenceLookup>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &ConflictResolutionSettings {
        &self.settings
    }

    /// Resolves one group of duplicates.
    ///
    /// The only error is an empty group.
    pub async fn resolve_conflicts(
        &self,
        duplicates: &[Holding],
    ) -> Result<ConflictResolutionResult, ConflictError> {
        if duplicates.is_empty() {
            return Err(ConflictError::EmptyGroup);
        }

        let symbol = normalize_symbol(&duplicates[0].symbol);
        let scored = match self.base_prices(duplicates).await {
            Ok(base_prices) => {
                let ctx = ScoringContext {
                    settings: &self.settings,
                    base_prices: &base_prices,
                    now: self.clock.now(),
                    symbol: &symbol,
                    preferences: self.preferences.as_deref(),
                };
                self.score(duplicates, &ctx)
            }
            Err(e) => Err(e),
        };

        match scored {
            Ok(result) => Ok(result),
            Err(e) => {
                error!(
                    "Conflict scoring failed for {} ({} holdings): {}. Falling back to broker priority.",
                    symbol,
                    duplicates.len(),
                    e
                );
                Ok(self.broker_priority_fallback(duplicates, &e))
            }
        }
    }

    /// Unit prices in the base currency. A price whose conversion overflows
    /// is a scoring error.
    async fn base_prices(&self, duplicates: &[Holding]) -> Result<Vec<Decimal>, ConflictError> {
        let conversions = duplicates.iter().map(|holding| {
            self.fx
                .convert_amount(holding.market_price, &holding.currency, &self.base_currency)
        });
        join_all(conversions)
            .await
            .into_iter()
            .zip(duplicates)
            .map(|(conversion, holding)| {
                if conversion.overflowed {
                    Err(ConflictError::Scoring(format!(
                        "price {} {} of {} overflows in {}",
                        holding.market_price,
                        holding.currency,
                        holding.broker_id,
                        self.base_currency
                    )))
                } else {
                    Ok(conversion.amount)
                }
            })
            .collect()
    }

    fn score(
        &self,
        duplicates: &[Holding],
        ctx: &ScoringContext<'_>,
    ) -> Result<ConflictResolutionResult, ConflictError> {
        let weights = &self.settings.weights;
        let (mut applied_rules, leader) = self.rules.iter().try_fold(
            (Vec::with_capacity(self.rules.len()), None::<Leader>),
            |(mut applied, leader), rule| -> Result<_, ConflictError> {
                let Some(pick) = rule.evaluate(duplicates, ctx)? else {
                    applied.push(AppliedRule::skipped(rule.kind()));
                    return Ok((applied, leader));
                };
                let weighted = rule.weighted_score(pick.score, rule.weight(weights));
                applied.push(AppliedRule {
                    rule: rule.kind(),
                    applied: true,
                    selected_broker: Some(duplicates[pick.index].broker_id.clone()),
                    score: pick.score,
                    weighted_score: weighted,
                    won: false,
                });
                let leader = match leader {
                    Some(current) if current.weighted >= weighted => Some(current),
                    _ => Some(Leader {
                        position: applied.len() - 1,
                        pick,
                        weighted,
                    }),
                };
                Ok((applied, leader))
            },
        )?;

        let leader = leader.ok_or_else(|| {
            ConflictError::Scoring("no rule produced a candidate".to_string())
        })?;
        applied_rules[leader.position].won = true;
        let rule = &self.rules[leader.position];
        let winner = &duplicates[leader.pick.index];

        debug!(
            "Rule {} selected {} for {} (score {:.3}, weighted {:.3})",
            rule.kind().as_str(),
            winner.broker_id,
            ctx.symbol,
            leader.pick.score,
            leader.weighted
        );

        Ok(Self::build_result(
            duplicates,
            leader.pick.index,
            rule.reason(&winner.broker_id, leader.pick.score),
            leader.pick.score,
            applied_rules,
        ))
    }

    fn broker_priority_fallback(
        &self,
        duplicates: &[Holding],
        cause: &ConflictError,
    ) -> ConflictResolutionResult {
        let mut best = 0;
        let mut best_reliability = self.settings.reliability_for(&duplicates[0].broker_id);
        for (index, holding) in duplicates.iter().enumerate().skip(1) {
            let reliability = self.settings.reliability_for(&holding.broker_id);
            if reliability > best_reliability {
                best = index;
                best_reliability = reliability;
            }
        }

        let broker = duplicates[best].broker_id.clone();
        let applied = AppliedRule {
            rule: RuleKind::BrokerPriority,
            applied: true,
            selected_broker: Some(broker.clone()),
            score: best_reliability,
            weighted_score: best_reliability * self.settings.weights.broker_priority,
            won: true,
        };
        Self::build_result(
            duplicates,
            best,
            format!(
                "Scoring failed ({}); selected {} by broker priority",
                cause, broker
            ),
            self.settings.scoring_failure_confidence,
            vec![applied],
        )
    }

    fn build_result(
        duplicates: &[Holding],
        winner: usize,
        reason: String,
        confidence: f64,
        applied_rules: Vec<AppliedRule>,
    ) -> ConflictResolutionResult {
        let preferred = &duplicates[winner];
        ConflictResolutionResult {
            preferred_holding: preferred.clone(),
            preferred_source: preferred.broker_id.clone(),
            reason,
            confidence: confidence.clamp(0.0, 1.0),
            alternatives: duplicates
                .iter()
                .enumerate()
                .filter(|(index, _)| *index != winner)
                .map(|(_, holding)| holding.clone())
                .collect(),
            applied_rules,
        }
    }
}
