use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::constants::{brokers, DEFAULT_BASE_CURRENCY};
use crate::errors::{Error, Result};
use crate::fx::{default_fallback_rates, FallbackRateEntry};

/// Top-level configuration of a reconciliation pass.
///
/// Every field has a default, so a partial JSON document (or none at all)
/// yields a usable configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconciliationSettings {
    pub base_currency: String,
    pub duplicates: DuplicateDetectionSettings,
    pub conflicts: ConflictResolutionSettings,
    pub fx: FxSettings,
}

impl Default for ReconciliationSettings {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            duplicates: DuplicateDetectionSettings::default(),
            conflicts: ConflictResolutionSettings::default(),
            fx: FxSettings::default(),
        }
    }
}

impl ReconciliationSettings {
    /// Parses settings from JSON and validates them.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigIO(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.base_currency.trim();
        if base.len() != 3 || !base.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidConfigValue(format!(
                "baseCurrency must be a 3-letter ISO code, got '{}'",
                self.base_currency
            )));
        }
        self.duplicates.validate()?;
        self.conflicts.validate()?;
        self.fx.validate()
    }
}

/// Thresholds of the duplicate-detection cascade.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DuplicateDetectionSettings {
    pub isin_confidence: f64,
    pub cusip_confidence: f64,
    pub symbol_confidence: f64,
    pub fuzzy_confidence: f64,
    /// Groups below this confidence are discarded.
    pub min_confidence: f64,
    /// Minimum `1 - distance / max_len` for two names to be considered equal.
    pub name_similarity_threshold: f64,
    /// Largest number of distinct currencies a group may span (dual listings).
    pub max_currencies_per_group: usize,
    /// Let ISIN/CUSIP passes group several holdings of the same broker.
    /// Symbol and fuzzy passes never do.
    pub allow_same_broker_identifier_matches: bool,
}

impl Default for DuplicateDetectionSettings {
    fn default() -> Self {
        Self {
            isin_confidence: 0.95,
            cusip_confidence: 0.90,
            symbol_confidence: 0.80,
            fuzzy_confidence: 0.60,
            min_confidence: 0.60,
            name_similarity_threshold: 0.85,
            max_currencies_per_group: 2,
            allow_same_broker_identifier_matches: false,
        }
    }
}

impl DuplicateDetectionSettings {
    fn validate(&self) -> Result<()> {
        let unit_values = [
            ("isinConfidence", self.isin_confidence),
            ("cusipConfidence", self.cusip_confidence),
            ("symbolConfidence", self.symbol_confidence),
            ("fuzzyConfidence", self.fuzzy_confidence),
            ("minConfidence", self.min_confidence),
            ("nameSimilarityThreshold", self.name_similarity_threshold),
        ];
        for (name, value) in unit_values {
            ensure_unit_interval(name, value)?;
        }
        if self.max_currencies_per_group == 0 {
            return Err(Error::InvalidConfigValue(
                "maxCurrenciesPerGroup must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Weights of the conflict-resolution rules, in cascade order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleWeights {
    pub data_quality: f64,
    pub broker_priority: f64,
    pub timestamp: f64,
    pub manual: f64,
    pub fallback: f64,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            data_quality: 0.4,
            broker_priority: 0.3,
            timestamp: 0.2,
            manual: 0.1,
            fallback: 0.05,
        }
    }
}

/// Scoring policy used to pick the authoritative holding of a duplicate group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConflictResolutionSettings {
    pub weights: RuleWeights,
    /// Broker id (lowercase) -> reliability in [0, 1]. Keys are lower-cased
    /// on load.
    #[serde(deserialize_with = "deserialize_reliability")]
    pub broker_reliability: HashMap<String, f64>,
    /// Reliability of brokers missing from `broker_reliability`.
    pub default_broker_reliability: f64,
    /// Relative tolerance between `price * quantity` and the reported market value.
    pub price_tolerance: Decimal,
    /// Unit prices above this, in the base currency, are treated as corrupt.
    pub max_plausible_price: Decimal,
    /// Confidence reported when scoring fails and broker order decides.
    pub scoring_failure_confidence: f64,
}

impl Default for ConflictResolutionSettings {
    fn default() -> Self {
        let broker_reliability = [
            (brokers::INTERACTIVE_BROKERS, 0.95),
            (brokers::SCHWAB, 0.90),
            (brokers::PLAID, 0.85),
            (brokers::NORDNET, 0.80),
        ]
        .into_iter()
        .map(|(broker, score)| (broker.to_string(), score))
        .collect();

        Self {
            weights: RuleWeights::default(),
            broker_reliability,
            default_broker_reliability: 0.5,
            price_tolerance: dec!(0.01),
            max_plausible_price: dec!(1000000),
            scoring_failure_confidence: 0.5,
        }
    }
}

impl ConflictResolutionSettings {
    /// Reliability of a broker; lookups are case-insensitive.
    pub fn reliability_for(&self, broker_id: &str) -> f64 {
        let key = normalize_broker_key(broker_id);
        self.broker_reliability
            .get(&key)
            .copied()
            .unwrap_or(self.default_broker_reliability)
    }

    fn validate(&self) -> Result<()> {
        let weights = [
            ("weights.dataQuality", self.weights.data_quality),
            ("weights.brokerPriority", self.weights.broker_priority),
            ("weights.timestamp", self.weights.timestamp),
            ("weights.manual", self.weights.manual),
            ("weights.fallback", self.weights.fallback),
        ];
        for (name, value) in weights {
            ensure_unit_interval(name, value)?;
        }
        for (broker, score) in &self.broker_reliability {
            if *broker != normalize_broker_key(broker) {
                return Err(Error::InvalidConfigValue(format!(
                    "brokerReliability key '{}' must be trimmed lowercase",
                    broker
                )));
            }
            ensure_unit_interval(&format!("brokerReliability.{}", broker), *score)?;
        }
        ensure_unit_interval("defaultBrokerReliability", self.default_broker_reliability)?;
        ensure_unit_interval("scoringFailureConfidence", self.scoring_failure_confidence)?;
        if self.price_tolerance < Decimal::ZERO {
            return Err(Error::InvalidConfigValue(
                "priceTolerance must not be negative".to_string(),
            ));
        }
        if self.max_plausible_price <= Decimal::ZERO {
            return Err(Error::InvalidConfigValue(
                "maxPlausiblePrice must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// One year.
pub const MAX_CACHE_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Exchange-rate resolution settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FxSettings {
    /// Lifetime of cached rates, in seconds.
    pub cache_ttl_secs: i64,
    /// Upper bound on a single provider call, in seconds.
    pub request_timeout_secs: u64,
    /// Static table consulted when every live source fails.
    pub fallback_rates: Vec<FallbackRateEntry>,
}

impl Default for FxSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 3600,
            request_timeout_secs: 10,
            fallback_rates: default_fallback_rates(),
        }
    }
}

impl FxSettings {
    /// Clamped to `[0, MAX_CACHE_TTL_SECS]` for settings that skipped validation.
    pub fn cache_ttl(&self) -> Duration {
        Duration::seconds(self.cache_ttl_secs.clamp(0, MAX_CACHE_TTL_SECS))
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.cache_ttl_secs <= 0 || self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(Error::InvalidConfigValue(format!(
                "fx.cacheTtlSecs must be within [1, {}], got {}",
                MAX_CACHE_TTL_SECS, self.cache_ttl_secs
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidConfigValue(
                "fx.requestTimeoutSecs must be positive".to_string(),
            ));
        }
        if let Some(entry) = self.fallback_rates.iter().find(|e| e.rate <= Decimal::ZERO) {
            return Err(Error::InvalidConfigValue(format!(
                "fx.fallbackRates {}->{} must be positive",
                entry.from, entry.to
            )));
        }
        Ok(())
    }
}

fn normalize_broker_key(broker: &str) -> String {
    broker.trim().to_lowercase()
}

fn deserialize_reliability<'de, D>(
    deserializer: D,
) -> std::result::Result<HashMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, f64>::deserialize(deserializer)?;
    let mut normalized = HashMap::with_capacity(raw.len());
    for (broker, score) in raw {
        let key = normalize_broker_key(&broker);
        if normalized.insert(key.clone(), score).is_some() {
            return Err(serde::de::Error::custom(format!(
                "brokerReliability lists '{}' more than once",
                key
            )));
        }
    }
    Ok(normalized)
}

fn ensure_unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfigValue(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}
