use futures::future::join_all;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::identifiers_model::{SecurityIdentifiers, SecurityReference};
use super::identifiers_traits::{NoOpSecurityReferenceLookup, SecurityReferenceLookup};
use super::normalization::{normalize_code, normalize_name, normalize_symbol};
use crate::portfolio::holdings::Holding;

/// Turns holdings into canonical [`SecurityIdentifiers`].
///
/// Metadata carried by the holding always wins; the reference store only fills
/// gaps. A failing or missing reference store never makes resolution fail.
#[derive(Clone)]
pub struct SecurityIdentifierResolver {
    lookup: Arc<dyn SecurityReferenceLookup>,
}

impl Default for SecurityIdentifierResolver {
    fn default() -> Self {
        Self::without_lookup()
    }
}

impl SecurityIdentifierResolver {
    pub fn new(lookup: Arc<dyn SecurityReferenceLookup>) -> Self {
        Self { lookup }
    }

    /// A resolver that relies on holding metadata alone.
    pub fn without_lookup() -> Self {
        Self::new(Arc::new(NoOpSecurityReferenceLookup))
    }

    /// Identifiers derivable from the holding itself, without any lookup.
    pub fn from_metadata(holding: &Holding) -> SecurityIdentifiers {
        let metadata = &holding.metadata;
        let name = metadata
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        SecurityIdentifiers {
            symbol: holding.symbol.trim().to_string(),
            normalized_symbol: normalize_symbol(&holding.symbol),
            isin: metadata.isin.as_deref().and_then(normalize_code),
            cusip: metadata.cusip.as_deref().and_then(normalize_code),
            sedol: metadata.sedol.as_deref().and_then(normalize_code),
            normalized_name: name.as_deref().and_then(normalize_name),
            name,
            exchange: metadata
                .exchange
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_uppercase),
        }
    }

    /// Resolves one holding, consulting the reference store for missing fields.
    pub async fn resolve(&self, holding: &Holding) -> SecurityIdentifiers {
        let mut identifiers = Self::from_metadata(holding);
        if identifiers.normalized_symbol.is_empty() || !identifiers.lacks_reference_data() {
            return identifiers;
        }

        if let Some(reference) = self.lookup_reference(&identifiers.normalized_symbol).await {
            identifiers.merge_missing(&reference);
        }
        identifiers
    }

    /// Resolves a whole batch, issuing one concurrent lookup per distinct
    /// normalized symbol. The output is index-aligned with `holdings`.
    pub async fn resolve_all(&self, holdings: &[Holding]) -> Vec<SecurityIdentifiers> {
        let mut resolved: Vec<SecurityIdentifiers> =
            holdings.iter().map(Self::from_metadata).collect();

        let mut seen = HashSet::new();
        let symbols: Vec<String> = resolved
            .iter()
            .filter(|ids| !ids.normalized_symbol.is_empty() && ids.lacks_reference_data())
            .map(|ids| ids.normalized_symbol.clone())
            .filter(|symbol| seen.insert(symbol.clone()))
            .collect();

        if symbols.is_empty() {
            return resolved;
        }

        debug!("Looking up reference data for {} symbols", symbols.len());
        let references = join_all(symbols.iter().map(|s| self.lookup_reference(s))).await;
        let by_symbol: HashMap<&str, SecurityIdentifiers> = symbols
            .iter()
            .map(String::as_str)
            .zip(references)
            .filter_map(|(symbol, reference)| reference.map(|r| (symbol, r)))
            .collect();

        for identifiers in resolved.iter_mut() {
            if let Some(reference) = by_symbol.get(identifiers.normalized_symbol.as_str()) {
                identifiers.merge_missing(reference);
            }
        }
        resolved
    }

    async fn lookup_reference(&self, normalized_symbol: &str) -> Option<SecurityIdentifiers> {
        match self.lookup.lookup_security(normalized_symbol).await {
            Ok(Some(reference)) => Some(Self::from_reference(&reference)),
            Ok(None) => {
                debug!("No reference data for symbol {}", normalized_symbol);
                None
            }
            Err(e) => {
                warn!(
                    "Security reference lookup failed for {}: {}. Using holding metadata only.",
                    normalized_symbol, e
                );
                None
            }
        }
    }

    fn from_reference(reference: &SecurityReference) -> SecurityIdentifiers {
        SecurityIdentifiers {
            symbol: reference.symbol.clone(),
            normalized_symbol: normalize_symbol(&reference.symbol),
            isin: reference.isin.as_deref().and_then(normalize_code),
            cusip: reference.cusip.as_deref().and_then(normalize_code),
            sedol: reference.sedol.as_deref().and_then(normalize_code),
            name: reference.name.clone(),
            normalized_name: reference.name.as_deref().and_then(normalize_name),
            exchange: reference.exchange.as_deref().map(str::to_uppercase),
        }
    }
}
