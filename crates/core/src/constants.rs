/// Default base currency for aggregated values
pub const DEFAULT_BASE_CURRENCY: &str = "USD";

/// Currency used as the pivot when triangulating fallback rates
pub const TRIANGULATION_CURRENCY: &str = "USD";

/// Decimal precision for converted amounts
pub const DECIMAL_PRECISION: u32 = 6;

/// Broker identifiers of the built-in integrations
pub mod brokers {
    pub const INTERACTIVE_BROKERS: &str = "ibkr";
    pub const SCHWAB: &str = "schwab";
    pub const PLAID: &str = "plaid";
    pub const NORDNET: &str = "nordnet";
}
