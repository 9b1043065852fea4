//! Property-based integration tests for the reconciliation engine.
//!
//! Holdings are drawn from small pools of symbols, brokers and identifiers so
//! that random inputs contain plenty of real duplicates.

use async_trait::async_trait;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tallyfolio_core::conflicts::ConflictResolver;
use tallyfolio_core::duplicates::{unique_indices, DuplicateDetector};
use tallyfolio_core::fx::{
    CurrencyConversionService, FxServiceTrait, NoOpExchangeRateCacheStore, RateSource,
};
use tallyfolio_core::identifiers::{SecurityIdentifierResolver, SecurityIdentifiers};
use tallyfolio_core::settings::ReconciliationSettings;
use tallyfolio_core::{AssetClass, Holding, HoldingMetadata};
use tallyfolio_market_data::{ExchangeRateProvider, MarketDataError, ProviderRate};

// =============================================================================
// Generators
// =============================================================================

fn arb_symbol() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["AAPL", "AAPL.O", "MSFT", "EQNR", "EQNR.OL", "NOVO-B.CO", ""])
        .prop_map(str::to_string)
}

fn arb_broker() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["ibkr", "schwab", "plaid", "nordnet", "IBKR"]).prop_map(str::to_string)
}

fn arb_currency() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["USD", "NOK", "EUR", "DKK"]).prop_map(str::to_string)
}

/// A currency code and a differently spelled variant of it: case changes and
/// surrounding whitespace. Codes need not be real ISO codes.
fn arb_code_spellings() -> impl Strategy<Value = (String, String)> {
    ("[A-Za-z]{1,6}", any::<bool>(), "[ \t]{0,2}", "[ \t]{0,2}").prop_map(
        |(code, lower, left, right)| {
            let variant = if lower {
                code.to_lowercase()
            } else {
                code.to_uppercase()
            };
            (code, format!("{}{}{}", left, variant, right))
        },
    )
}

fn arb_amount() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        (any::<i64>(), 0u32..=28).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale)),
        Just(Decimal::MAX),
        Just(Decimal::MIN),
        Just(Decimal::ZERO),
    ]
}

fn arb_asset_class() -> impl Strategy<Value = AssetClass> {
    prop_oneof![Just(AssetClass::Equity), Just(AssetClass::Etf)]
}

fn arb_metadata() -> impl Strategy<Value = HoldingMetadata> {
    (
        proptest::option::of(prop::sample::select(vec!["US0378331005", "NO0010096985"])),
        proptest::option::of(prop::sample::select(vec!["037833100", "594918104"])),
        proptest::option::of(prop::sample::select(vec![
            "Apple Inc.",
            "Apple",
            "Microsoft Corp",
            "Equinor ASA",
            "Equinor",
        ])),
    )
        .prop_map(|(isin, cusip, name)| HoldingMetadata {
            isin: isin.map(str::to_string),
            cusip: cusip.map(str::to_string),
            name: name.map(str::to_string),
            ..Default::default()
        })
}

fn arb_holding() -> impl Strategy<Value = Holding> {
    (
        arb_symbol(),
        arb_broker(),
        arb_currency(),
        arb_asset_class(),
        arb_metadata(),
        1u32..1000,
        1u32..500,
    )
        .prop_map(|(symbol, broker, currency, asset_class, metadata, qty, price)| {
            let quantity = Decimal::from(qty);
            let market_price = Decimal::from(price);
            Holding {
                id: String::new(),
                symbol,
                quantity,
                market_price,
                market_value: quantity * market_price,
                cost_basis: None,
                currency,
                asset_class,
                account_id: format!("{}-acc", broker),
                broker_id: broker,
                last_updated: None,
                metadata,
            }
        })
}

fn arb_holdings(max_count: usize) -> impl Strategy<Value = Vec<Holding>> {
    proptest::collection::vec(arb_holding(), 0..=max_count).prop_map(|mut holdings| {
        for (i, h) in holdings.iter_mut().enumerate() {
            h.id = format!("h{}", i);
        }
        holdings
    })
}

/// Provider that counts calls and never answers.
#[derive(Default)]
struct CountingProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl ExchangeRateProvider for CountingProvider {
    fn id(&self) -> &'static str {
        "COUNTING"
    }

    async fn get_exchange_rate(
        &self,
        from: &str,
        to: &str,
    ) -> Result<ProviderRate, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(MarketDataError::UnsupportedPair {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

fn detector() -> DuplicateDetector {
    DuplicateDetector::new(
        SecurityIdentifierResolver::without_lookup(),
        ReconciliationSettings::default().duplicates,
    )
}

fn identifiers(holdings: &[Holding]) -> Vec<SecurityIdentifiers> {
    holdings
        .iter()
        .map(SecurityIdentifierResolver::from_metadata)
        .collect()
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every holding is either in exactly one group or unique.
    #[test]
    fn prop_groups_and_uniques_partition_the_input(holdings in arb_holdings(25)) {
        let groups = detector().detect_with_identifiers(&holdings, &identifiers(&holdings));

        let mut covered: Vec<usize> = groups
            .iter()
            .flat_map(|g| g.member_indices.iter().copied())
            .collect();
        let grouped: HashSet<usize> = covered.iter().copied().collect();
        prop_assert_eq!(grouped.len(), covered.len(), "a holding appears in two groups");

        covered.extend(unique_indices(holdings.len(), &groups));
        covered.sort_unstable();
        prop_assert_eq!(covered, (0..holdings.len()).collect::<Vec<_>>());
    }

    /// Running detection twice over the same input yields the same groups.
    #[test]
    fn prop_detection_is_idempotent(holdings in arb_holdings(25)) {
        let ids = identifiers(&holdings);
        let first = detector().detect_with_identifiers(&holdings, &ids);
        let second = detector().detect_with_identifiers(&holdings, &ids);
        prop_assert_eq!(first, second);
    }

    /// Groups satisfy the membership invariants and come sorted by confidence.
    #[test]
    fn prop_groups_respect_invariants(holdings in arb_holdings(25)) {
        let groups = detector().detect_with_identifiers(&holdings, &identifiers(&holdings));

        for group in &groups {
            prop_assert!(group.members.len() >= 2);
            prop_assert!(group.confidence >= 0.6);

            let brokers: HashSet<String> = group.members.iter().map(|h| h.broker_key()).collect();
            prop_assert_eq!(brokers.len(), group.members.len(), "same-broker members");

            let currencies: HashSet<String> = group.members.iter().map(|h| h.currency_code()).collect();
            prop_assert!(currencies.len() <= 2);

            let asset_class = group.members[0].asset_class;
            prop_assert!(group.members.iter().all(|h| h.asset_class == asset_class));
            prop_assert!(group.members.iter().all(|h| h.has_symbol()));
        }
        for pair in groups.windows(2) {
            prop_assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    /// Conflict resolution always prefers a member of its input.
    #[test]
    fn prop_preferred_holding_is_a_member(
        group in proptest::collection::vec(arb_holding(), 1..6)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let settings = ReconciliationSettings::default();
        let fx = CurrencyConversionService::new(Arc::new(NoOpExchangeRateCacheStore), &settings.fx)
            .unwrap();
        let resolver = ConflictResolver::new(settings.conflicts, &settings.base_currency, Arc::new(fx));

        let result = runtime
            .block_on(resolver.resolve_conflicts(&group))
            .unwrap();

        prop_assert!(group.contains(&result.preferred_holding));
        prop_assert_eq!(result.alternatives.len(), group.len() - 1);
        prop_assert!((0.0..=1.0).contains(&result.confidence));
    }

    /// Converting into the same currency, however it is spelled, returns the
    /// amount unchanged without consulting a provider or the cache.
    #[test]
    fn prop_same_currency_conversion_is_identity(
        (from, to) in arb_code_spellings(),
        amount in arb_amount()
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let provider = Arc::new(CountingProvider::default());
        let settings = ReconciliationSettings::default();
        let fx = CurrencyConversionService::new(Arc::new(NoOpExchangeRateCacheStore), &settings.fx)
            .unwrap()
            .with_primary_provider(provider.clone())
            .with_secondary_provider(provider.clone());

        let result = runtime.block_on(fx.convert_amount(amount, &from, &to));

        prop_assert_eq!(result.amount, amount);
        prop_assert_eq!(result.original_amount, amount);
        prop_assert_eq!(result.rate, Decimal::ONE);
        prop_assert_eq!(result.source, RateSource::Identity);
        prop_assert!(!result.overflowed);
        prop_assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        prop_assert!(fx.memory_cache().is_empty());
    }
}
