use std::collections::HashMap;

use crate::errors::Result;
use crate::identifiers::normalize_symbol;

/// Source of user-configured broker preferences, consulted by the manual rule.
pub trait BrokerPreferenceLookup: Send + Sync {
    /// Broker ids to prefer for a normalized symbol, most preferred first.
    /// `None` when nothing is configured.
    fn preferred_brokers(&self, symbol: &str) -> Result<Option<Vec<String>>>;
}

/// In-memory preferences, per symbol with an optional catch-all order.
#[derive(Debug, Clone, Default)]
pub struct StaticBrokerPreferences {
    by_symbol: HashMap<String, Vec<String>>,
    default_order: Option<Vec<String>>,
}

impl StaticBrokerPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol<S: AsRef<str>>(mut self, symbol: &str, brokers: &[S]) -> Self {
        self.by_symbol
            .insert(normalize_symbol(symbol), normalize_brokers(brokers));
        self
    }

    pub fn with_default_order<S: AsRef<str>>(mut self, brokers: &[S]) -> Self {
        self.default_order = Some(normalize_brokers(brokers));
        self
    }
}

fn normalize_brokers<S: AsRef<str>>(brokers: &[S]) -> Vec<String> {
    brokers
        .iter()
        .map(|b| b.as_ref().trim().to_lowercase())
        .collect()
}

impl BrokerPreferenceLookup for StaticBrokerPreferences {
    fn preferred_brokers(&self, symbol: &str) -> Result<Option<Vec<String>>> {
        Ok(self
            .by_symbol
            .get(&normalize_symbol(symbol))
            .or(self.default_order.as_ref())
            .cloned())
    }
}
