use serde::{Deserialize, Serialize};

/// Canonical identifiers of a holding's security.
///
/// Derived once per holding and pass; never persisted. `normalized_symbol`
/// is always present and depends only on `symbol`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecurityIdentifiers {
    pub symbol: String,
    pub normalized_symbol: String,
    pub isin: Option<String>,
    pub cusip: Option<String>,
    pub sedol: Option<String>,
    pub name: Option<String>,
    pub normalized_name: Option<String>,
    pub exchange: Option<String>,
}

impl SecurityIdentifiers {
    /// Fills every empty field from `other`, keeping the values already set.
    pub fn merge_missing(&mut self, other: &SecurityIdentifiers) {
        fill(&mut self.isin, &other.isin);
        fill(&mut self.cusip, &other.cusip);
        fill(&mut self.sedol, &other.sedol);
        fill(&mut self.name, &other.name);
        fill(&mut self.normalized_name, &other.normalized_name);
        fill(&mut self.exchange, &other.exchange);
    }

    /// True when at least one reference-data field is still unknown.
    pub fn lacks_reference_data(&self) -> bool {
        self.isin.is_none()
            || self.cusip.is_none()
            || self.sedol.is_none()
            || self.name.is_none()
            || self.exchange.is_none()
    }
}

fn fill(target: &mut Option<String>, source: &Option<String>) {
    if target.is_none() {
        target.clone_from(source);
    }
}

/// Reference data for a security, as held by the security reference store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SecurityReference {
    pub symbol: String,
    pub isin: Option<String>,
    pub cusip: Option<String>,
    pub sedol: Option<String>,
    pub name: Option<String>,
    pub exchange: Option<String>,
}
