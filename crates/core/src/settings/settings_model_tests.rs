use super::*;
use crate::errors::Error;
use rust_decimal_macros::dec;

#[test]
fn test_defaults_match_documented_policy() {
    let settings = ReconciliationSettings::default();

    assert_eq!(settings.base_currency, "USD");
    assert_eq!(settings.duplicates.isin_confidence, 0.95);
    assert_eq!(settings.duplicates.max_currencies_per_group, 2);
    assert_eq!(settings.conflicts.weights.data_quality, 0.4);
    assert_eq!(settings.conflicts.weights.fallback, 0.05);
    assert_eq!(settings.fx.cache_ttl_secs, 3600);
    assert!(settings.validate().is_ok());
}

#[test]
fn test_partial_json_keeps_defaults() {
    let json = r#"{
        "baseCurrency": "NOK",
        "duplicates": { "maxCurrenciesPerGroup": 1 },
        "conflicts": { "brokerReliability": { "nordnet": 0.99 } }
    }"#;

    let settings = ReconciliationSettings::from_json_str(json).unwrap();

    assert_eq!(settings.base_currency, "NOK");
    assert_eq!(settings.duplicates.max_currencies_per_group, 1);
    assert_eq!(settings.duplicates.isin_confidence, 0.95);
    assert_eq!(settings.conflicts.reliability_for("Nordnet"), 0.99);
    // Replaced map: brokers not listed fall back to the default reliability.
    assert_eq!(settings.conflicts.reliability_for("ibkr"), 0.5);
    assert_eq!(settings.conflicts.price_tolerance, dec!(0.01));
}

#[test]
fn test_rejects_out_of_range_weight() {
    let json = r#"{ "conflicts": { "weights": { "dataQuality": 1.5 } } }"#;
    assert!(ReconciliationSettings::from_json_str(json).is_err());
}

#[test]
fn test_rejects_bad_base_currency() {
    let json = r#"{ "baseCurrency": "EURO" }"#;
    assert!(ReconciliationSettings::from_json_str(json).is_err());
}

#[test]
fn test_rejects_non_positive_fallback_rate() {
    let json = r#"{ "fx": { "fallbackRates": [ { "from": "USD", "to": "NOK", "rate": 0 } ] } }"#;
    assert!(ReconciliationSettings::from_json_str(json).is_err());
}

#[test]
fn test_reliability_lookup_is_case_insensitive() {
    let conflicts = ConflictResolutionSettings::default();
    assert_eq!(conflicts.reliability_for("IBKR"), 0.95);
    assert_eq!(conflicts.reliability_for(" schwab "), 0.90);
    assert_eq!(conflicts.reliability_for("unknown-broker"), 0.5);
}

#[test]
fn test_rejects_cache_ttl_beyond_a_year() {
    let json = r#"{ "fx": { "cacheTtlSecs": 9223372036854775807 } }"#;
    let err = ReconciliationSettings::from_json_str(json).unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue(_)));

    let at_bound = format!(r#"{{ "fx": {{ "cacheTtlSecs": {} }} }}"#, MAX_CACHE_TTL_SECS);
    assert!(ReconciliationSettings::from_json_str(&at_bound).is_ok());
}

#[test]
fn test_unvalidated_cache_ttl_is_clamped() {
    let fx = FxSettings {
        cache_ttl_secs: i64::MAX,
        ..FxSettings::default()
    };
    assert_eq!(fx.cache_ttl(), chrono::Duration::seconds(MAX_CACHE_TTL_SECS));
}

#[test]
fn test_broker_reliability_keys_are_lowercased_on_load() {
    let json = r#"{ "conflicts": { "brokerReliability": { "IBKR": 0.99, " Schwab ": 0.7 } } }"#;

    let settings = ReconciliationSettings::from_json_str(json).unwrap();

    assert_eq!(settings.conflicts.reliability_for("ibkr"), 0.99);
    assert_eq!(settings.conflicts.reliability_for("SCHWAB"), 0.7);
    assert!(settings.conflicts.broker_reliability.contains_key("ibkr"));
}

#[test]
fn test_rejects_broker_listed_twice_after_lowercasing() {
    let json = r#"{ "conflicts": { "brokerReliability": { "IBKR": 0.99, "ibkr": 0.5 } } }"#;
    assert!(ReconciliationSettings::from_json_str(json).is_err());
}

#[test]
fn test_rejects_uppercase_reliability_key_built_in_code() {
    let mut settings = ReconciliationSettings::default();
    settings.conflicts.broker_reliability.insert("IBKR".to_string(), 0.99);

    let err = settings.validate().unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue(_)));
}
