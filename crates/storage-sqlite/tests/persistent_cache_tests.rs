//! The conversion service and identifier resolver running against a real
//! SQLite database.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

use tallyfolio_core::fx::{CurrencyConversionService, FxServiceTrait, RateSource};
use tallyfolio_core::identifiers::{SecurityIdentifierResolver, SecurityReference};
use tallyfolio_core::settings::FxSettings;
use tallyfolio_core::utils::ManualClock;
use tallyfolio_core::{AssetClass, Holding, HoldingMetadata};
use tallyfolio_market_data::{ExchangeRateProvider, MarketDataError, ProviderRate};
use tallyfolio_storage_sqlite::{
    create_pool, run_migrations, spawn_writer, ExchangeRateCacheRepository,
    SecurityReferenceRepository,
};

struct FixedProvider;

#[async_trait]
impl ExchangeRateProvider for FixedProvider {
    fn id(&self) -> &'static str {
        "FIXED"
    }

    async fn get_exchange_rate(
        &self,
        from: &str,
        to: &str,
    ) -> Result<ProviderRate, MarketDataError> {
        Ok(ProviderRate::new(from, to, dec!(11.25), self.id()))
    }
}

struct Storage {
    rates: Arc<ExchangeRateCacheRepository>,
    references: Arc<SecurityReferenceRepository>,
    _temp_dir: TempDir,
}

fn storage() -> Storage {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("tallyfolio.db");
    let pool = create_pool(&db_path.to_string_lossy()).unwrap();
    run_migrations(&pool).unwrap();
    let writer = spawn_writer((*pool).clone());
    Storage {
        rates: Arc::new(ExchangeRateCacheRepository::new(pool.clone(), writer.clone())),
        references: Arc::new(SecurityReferenceRepository::new(pool, writer)),
        _temp_dir: temp_dir,
    }
}

#[tokio::test]
async fn test_fetched_rate_survives_a_restart_until_cleanup() {
    let storage = storage();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 7, 1, 10, 0, 0).unwrap(),
    ));
    let settings = FxSettings::default();

    let online = CurrencyConversionService::new(storage.rates.clone(), &settings)
        .unwrap()
        .with_primary_provider(Arc::new(FixedProvider))
        .with_clock(clock.clone());
    let fetched = online.get_exchange_rate("USD", "NOK").await;
    assert_eq!(fetched.source, RateSource::PrimaryApi);

    // A fresh service has an empty memory cache and no providers.
    let offline = CurrencyConversionService::new(storage.rates.clone(), &settings)
        .unwrap()
        .with_clock(clock.clone());
    let cached = offline.get_exchange_rate("USD", "NOK").await;
    assert_eq!(cached.source, RateSource::Cached);
    assert_eq!(cached.rate, dec!(11.25));

    clock.advance(Duration::hours(2));
    assert_eq!(offline.cleanup_expired_rates().await.unwrap(), 1);
    assert_eq!(storage.rates.count().unwrap(), 0);

    let fallback = offline.get_exchange_rate("USD", "NOK").await;
    assert_eq!(fallback.source, RateSource::Fallback);
    assert_eq!(fallback.rate, dec!(10.6));
}

#[tokio::test]
async fn test_resolver_enriches_holdings_from_reference_table() {
    let storage = storage();
    storage
        .references
        .upsert_references(vec![SecurityReference {
            symbol: "EQNR".to_string(),
            isin: Some("NO0010096985".to_string()),
            name: Some("Equinor ASA".to_string()),
            ..Default::default()
        }])
        .await
        .unwrap();
    let resolver = SecurityIdentifierResolver::new(storage.references.clone());

    let holding = Holding {
        id: "h1".to_string(),
        symbol: "EQNR.OL".to_string(),
        quantity: dec!(10),
        market_price: dec!(300),
        market_value: dec!(3000),
        cost_basis: None,
        currency: "NOK".to_string(),
        asset_class: AssetClass::Equity,
        broker_id: "nordnet".to_string(),
        account_id: "nordnet-acc".to_string(),
        last_updated: None,
        metadata: HoldingMetadata::default(),
    };

    let identifiers = resolver.resolve(&holding).await;

    assert_eq!(identifiers.normalized_symbol, "EQNR");
    assert_eq!(identifiers.isin.as_deref(), Some("NO0010096985"));
    assert_eq!(identifiers.normalized_name.as_deref(), Some("equinor"));
}
