use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Broad classification of the instrument behind a holding.
///
/// Two holdings can only be duplicates of each other when they share an
/// asset class.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetClass {
    #[default]
    Equity,
    Etf,
    MutualFund,
    Bond,
    Option,
    Crypto,
    Cash,
    Other,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Equity => "EQUITY",
            AssetClass::Etf => "ETF",
            AssetClass::MutualFund => "MUTUAL_FUND",
            AssetClass::Bond => "BOND",
            AssetClass::Option => "OPTION",
            AssetClass::Crypto => "CRYPTO",
            AssetClass::Cash => "CASH",
            AssetClass::Other => "OTHER",
        }
    }
}

/// Optional descriptive fields a broker may attach to a holding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct HoldingMetadata {
    pub isin: Option<String>,
    pub cusip: Option<String>,
    pub sedol: Option<String>,
    /// Security display name as the broker reports it.
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub account_name: Option<String>,
    /// Broker's own identifier for the connection, when it differs from `Holding::broker_id`.
    pub broker_id: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// A broker-reported position in one security within one account.
///
/// Holdings arrive already normalized from the broker integrations and are
/// never mutated by the reconciliation core.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    /// Ticker as reported by the broker; may carry an exchange suffix. Empty when unknown.
    #[serde(default)]
    pub symbol: String,
    pub quantity: Decimal,
    pub market_price: Decimal,
    pub market_value: Decimal,
    #[serde(default)]
    pub cost_basis: Option<Decimal>,
    pub currency: String,
    #[serde(default)]
    pub asset_class: AssetClass,
    pub broker_id: String,
    pub account_id: String,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: HoldingMetadata,
}

impl Holding {
    pub fn has_symbol(&self) -> bool {
        !self.symbol.trim().is_empty()
    }

    /// Latest known update time, preferring the top-level field over metadata.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_updated.or(self.metadata.last_updated)
    }

    /// Broker id in its canonical (trimmed, lowercase) form.
    pub fn broker_key(&self) -> String {
        self.broker_id.trim().to_lowercase()
    }

    /// Currency code in its canonical (trimmed, uppercase) form.
    pub fn currency_code(&self) -> String {
        self.currency.trim().to_uppercase()
    }
}
