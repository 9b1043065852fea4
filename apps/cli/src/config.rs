use std::path::PathBuf;

use tallyfolio_core::settings::ReconciliationSettings;

/// Runtime configuration, read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub settings: ReconciliationSettings,
    pub exchange_rate_api_key: Option<String>,
    pub frankfurter_url: Option<String>,
    /// Broker ids tried in order by the manual-preference rule.
    pub broker_preference: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();

        let db_path =
            std::env::var("TALLYFOLIO_DB_PATH").unwrap_or_else(|_| "./db/tallyfolio.db".to_string());

        let mut settings = match non_empty_var("TALLYFOLIO_SETTINGS_FILE") {
            Some(path) => ReconciliationSettings::load_from_file(&PathBuf::from(path))?,
            None => ReconciliationSettings::default(),
        };
        if let Some(base_currency) = non_empty_var("TALLYFOLIO_BASE_CURRENCY") {
            settings.base_currency = base_currency.trim().to_uppercase();
        }
        settings.validate()?;

        let broker_preference = non_empty_var("TALLYFOLIO_BROKER_PREFERENCE")
            .map(|list| parse_list(&list))
            .unwrap_or_default();

        Ok(Self {
            db_path,
            settings,
            exchange_rate_api_key: non_empty_var("TALLYFOLIO_EXCHANGE_RATE_API_KEY"),
            frankfurter_url: non_empty_var("TALLYFOLIO_FRANKFURTER_URL"),
            broker_preference,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
