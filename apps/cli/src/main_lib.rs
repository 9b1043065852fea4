use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use tallyfolio_core::conflicts::{ConflictResolver, StaticBrokerPreferences};
use tallyfolio_core::duplicates::DuplicateDetector;
use tallyfolio_core::fx::{CurrencyConversionService, FxServiceTrait};
use tallyfolio_core::identifiers::SecurityIdentifierResolver;
use tallyfolio_core::settings::ReconciliationSettings;
use tallyfolio_core::{PortfolioAggregationService, PortfolioAggregationServiceTrait};
use tallyfolio_market_data::{ExchangeRateApiProvider, FrankfurterProvider};
use tallyfolio_storage_sqlite::db::{self, spawn_writer};
use tallyfolio_storage_sqlite::{ExchangeRateCacheRepository, SecurityReferenceRepository};

pub struct AppState {
    pub settings: ReconciliationSettings,
    pub fx_service: Arc<dyn FxServiceTrait>,
    pub aggregation_service: Arc<dyn PortfolioAggregationServiceTrait>,
    pub security_references: Arc<SecurityReferenceRepository>,
}

/// Installs the global subscriber. `log` records from the library crates are
/// forwarded to it.
pub fn init_tracing() {
    let log_format =
        std::env::var("TALLYFOLIO_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout carries the command's JSON output.
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());

    let rate_cache = Arc::new(ExchangeRateCacheRepository::new(pool.clone(), writer.clone()));
    let security_references = Arc::new(SecurityReferenceRepository::new(pool, writer));

    let settings = config.settings.clone();

    let mut fx = CurrencyConversionService::new(rate_cache, &settings.fx)?;
    match &config.exchange_rate_api_key {
        Some(api_key) => {
            fx = fx.with_primary_provider(Arc::new(ExchangeRateApiProvider::new(api_key.clone())));
        }
        None => tracing::info!("No ExchangeRate-API key configured; using Frankfurter only"),
    }
    let frankfurter = match &config.frankfurter_url {
        Some(url) => FrankfurterProvider::with_base_url(url.clone()),
        None => FrankfurterProvider::new(),
    };
    let fx = fx.with_secondary_provider(Arc::new(frankfurter));
    let fx_service: Arc<dyn FxServiceTrait> = Arc::new(fx);

    let detector = DuplicateDetector::new(
        SecurityIdentifierResolver::new(security_references.clone()),
        settings.duplicates.clone(),
    );
    let mut resolver = ConflictResolver::new(
        settings.conflicts.clone(),
        &settings.base_currency,
        fx_service.clone(),
    );
    if !config.broker_preference.is_empty() {
        resolver = resolver.with_broker_preferences(Arc::new(
            StaticBrokerPreferences::new().with_default_order(config.broker_preference.as_slice()),
        ));
    }
    let aggregation_service = Arc::new(PortfolioAggregationService::new(
        detector,
        Arc::new(resolver),
        fx_service.clone(),
    ));

    Ok(AppState {
        settings,
        fx_service,
        aggregation_service,
        security_references,
    })
}
