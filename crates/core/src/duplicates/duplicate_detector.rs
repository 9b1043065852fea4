use log::{debug, info, warn};
use std::collections::{HashMap, HashSet, VecDeque};

use super::duplicates_model::{DuplicateGroup, MatchType};
use super::similarity::name_similarity;
use crate::identifiers::{SecurityIdentifierResolver, SecurityIdentifiers};
use crate::portfolio::holdings::Holding;
use crate::settings::DuplicateDetectionSettings;

/// Groups holdings that represent the same security across brokers.
///
/// Detection is a cascade of passes, strongest evidence first:
///
/// 1. exact ISIN
/// 2. exact CUSIP
/// 3. normalized symbol
/// 4. fuzzy normalized name (Levenshtein)
///
/// A holding claimed by one pass is invisible to the later ones. The output
/// depends only on the input order and the settings, so running detection
/// twice over the same slice yields the same groups.
#[derive(Clone)]
pub struct DuplicateDetector {
    resolver: SecurityIdentifierResolver,
    settings: DuplicateDetectionSettings,
}

impl DuplicateDetector {
    pub fn new(resolver: SecurityIdentifierResolver, settings: DuplicateDetectionSettings) -> Self {
        Self { resolver, settings }
    }

    pub fn settings(&self) -> &DuplicateDetectionSettings {
        &self.settings
    }

    pub fn resolver(&self) -> &SecurityIdentifierResolver {
        &self.resolver
    }

    /// Resolves identifiers for every holding, then runs the cascade.
    pub async fn detect_duplicates(&self, holdings: &[Holding]) -> Vec<DuplicateGroup> {
        let identifiers = self.resolver.resolve_all(holdings).await;
        self.detect_with_identifiers(holdings, &identifiers)
    }

    /// Runs the cascade over already-resolved identifiers.
    ///
    /// `identifiers[i]` must describe `holdings[i]`. Groups are returned by
    /// descending confidence; ties keep detection order.
    pub fn detect_with_identifiers(
        &self,
        holdings: &[Holding],
        identifiers: &[SecurityIdentifiers],
    ) -> Vec<DuplicateGroup> {
        if holdings.len() != identifiers.len() {
            warn!(
                "Identifier count {} does not match holding count {}; extra entries are ignored",
                identifiers.len(),
                holdings.len()
            );
        }
        let len = holdings.len().min(identifiers.len());
        let mut cascade = Cascade::new(&holdings[..len], &identifiers[..len], &self.settings);

        cascade.identifier_pass(MatchType::Isin, isin_key, self.settings.isin_confidence);
        cascade.identifier_pass(MatchType::Cusip, cusip_key, self.settings.cusip_confidence);
        cascade.symbol_pass();
        cascade.fuzzy_pass();

        let mut groups = cascade.groups;
        groups.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        info!(
            "Detected {} duplicate groups among {} holdings",
            groups.len(),
            len
        );
        groups
    }
}

/// Input positions not covered by any group, ascending.
pub fn unique_indices(len: usize, groups: &[DuplicateGroup]) -> Vec<usize> {
    let mut grouped = vec![false; len];
    for index in groups.iter().flat_map(|g| g.member_indices.iter()) {
        if let Some(slot) = grouped.get_mut(*index) {
            *slot = true;
        }
    }
    (0..len).filter(|i| !grouped[*i]).collect()
}

fn isin_key(ids: &SecurityIdentifiers) -> Option<&str> {
    ids.isin.as_deref()
}

fn cusip_key(ids: &SecurityIdentifiers) -> Option<&str> {
    ids.cusip.as_deref()
}

fn symbol_key(ids: &SecurityIdentifiers) -> Option<&str> {
    Some(ids.normalized_symbol.as_str())
}

/// Mutable state of one detection run.
struct Cascade<'a> {
    holdings: &'a [Holding],
    identifiers: &'a [SecurityIdentifiers],
    settings: &'a DuplicateDetectionSettings,
    /// Grouped, or settled as unique by a failed symbol match.
    claimed: Vec<bool>,
    groups: Vec<DuplicateGroup>,
}

impl<'a> Cascade<'a> {
    fn new(
        holdings: &'a [Holding],
        identifiers: &'a [SecurityIdentifiers],
        settings: &'a DuplicateDetectionSettings,
    ) -> Self {
        Self {
            holdings,
            identifiers,
            settings,
            claimed: vec![false; holdings.len()],
            groups: Vec::new(),
        }
    }

    /// Holdings still available to the current pass. Symbol-less holdings
    /// never take part in matching.
    fn open(&self) -> Vec<usize> {
        (0..self.holdings.len())
            .filter(|&i| !self.claimed[i] && self.holdings[i].has_symbol())
            .collect()
    }

    fn pass_enabled(&self, match_type: MatchType, confidence: f64) -> bool {
        if confidence < self.settings.min_confidence {
            debug!(
                "Skipping {} pass: confidence {} is below the minimum {}",
                match_type.as_str(),
                confidence,
                self.settings.min_confidence
            );
            return false;
        }
        true
    }

    /// Buckets open holdings by a non-empty key, in first-seen order.
    fn bucket_by(&self, key: fn(&SecurityIdentifiers) -> Option<&str>) -> Vec<Vec<usize>> {
        let identifiers = self.identifiers;
        let mut positions: HashMap<&'a str, usize> = HashMap::new();
        let mut buckets: Vec<Vec<usize>> = Vec::new();

        for i in self.open() {
            let Some(value) = key(&identifiers[i]).filter(|v| !v.is_empty()) else {
                continue;
            };
            match positions.get(value) {
                Some(&position) => buckets[position].push(i),
                None => {
                    positions.insert(value, buckets.len());
                    buckets.push(vec![i]);
                }
            }
        }
        buckets
    }

    /// Keeps the first holding of each broker.
    fn first_per_broker(&self, indices: &[usize]) -> Vec<usize> {
        let mut seen = HashSet::new();
        indices
            .iter()
            .copied()
            .filter(|&i| seen.insert(self.holdings[i].broker_key()))
            .collect()
    }

    fn is_valid_group(&self, indices: &[usize]) -> bool {
        let Some(&first) = indices.first() else {
            return false;
        };
        let asset_class = self.holdings[first].asset_class;
        if indices
            .iter()
            .any(|&i| self.holdings[i].asset_class != asset_class)
        {
            return false;
        }

        let currencies: HashSet<String> = indices
            .iter()
            .map(|&i| self.holdings[i].currency_code())
            .collect();
        if currencies.len() > self.settings.max_currencies_per_group {
            return false;
        }

        let brokers: HashSet<String> = indices
            .iter()
            .map(|&i| self.holdings[i].broker_key())
            .collect();
        brokers.len() >= 2
    }

    fn claim(&mut self, indices: Vec<usize>, match_type: MatchType, confidence: f64) {
        for &i in &indices {
            self.claimed[i] = true;
        }

        let mut identifiers = self.identifiers[indices[0]].clone();
        for &i in &indices[1..] {
            identifiers.merge_missing(&self.identifiers[i]);
        }

        debug!(
            "{} match {} across brokers {:?}",
            match_type.as_str(),
            identifiers.normalized_symbol,
            indices
                .iter()
                .map(|&i| self.holdings[i].broker_id.as_str())
                .collect::<Vec<_>>()
        );

        self.groups.push(DuplicateGroup {
            members: indices.iter().map(|&i| self.holdings[i].clone()).collect(),
            member_indices: indices,
            primary_symbol: identifiers.normalized_symbol.clone(),
            match_type,
            confidence,
            identifiers,
        });
    }

    /// ISIN and CUSIP passes. Rejected buckets stay open for later passes.
    fn identifier_pass(
        &mut self,
        match_type: MatchType,
        key: fn(&SecurityIdentifiers) -> Option<&str>,
        confidence: f64,
    ) {
        if !self.pass_enabled(match_type, confidence) {
            return;
        }
        for bucket in self.bucket_by(key) {
            if bucket.len() < 2 {
                continue;
            }
            let candidates = if self.settings.allow_same_broker_identifier_matches {
                bucket
            } else {
                self.first_per_broker(&bucket)
            };
            if candidates.len() >= 2 && self.is_valid_group(&candidates) {
                self.claim(candidates, match_type, confidence);
            }
        }
    }

    /// Normalized-symbol pass. A rejected bucket is settled: its holdings are
    /// reported as unique and skip the fuzzy pass.
    fn symbol_pass(&mut self) {
        let confidence = self.settings.symbol_confidence;
        if !self.pass_enabled(MatchType::Symbol, confidence) {
            return;
        }
        for bucket in self.bucket_by(symbol_key) {
            if bucket.len() < 2 {
                continue;
            }
            let candidates = self.first_per_broker(&bucket);
            if candidates.len() >= 2 && self.is_valid_group(&candidates) {
                self.claim(candidates, MatchType::Symbol, confidence);
            } else {
                debug!(
                    "Rejected symbol match {} ({} holdings)",
                    self.identifiers[bucket[0]].normalized_symbol,
                    bucket.len()
                );
                for i in bucket {
                    self.claimed[i] = true;
                }
            }
        }
    }

    /// Fuzzy name pass. Similar names are merged transitively.
    fn fuzzy_pass(&mut self) {
        let confidence = self.settings.fuzzy_confidence;
        if !self.pass_enabled(MatchType::Fuzzy, confidence) {
            return;
        }

        let identifiers = self.identifiers;
        let named: Vec<(usize, &'a str)> = self
            .open()
            .into_iter()
            .filter_map(|i| identifiers[i].normalized_name.as_deref().map(|n| (i, n)))
            .collect();

        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); named.len()];
        for a in 0..named.len() {
            for b in (a + 1)..named.len() {
                if name_similarity(named[a].1, named[b].1) >= self.settings.name_similarity_threshold
                {
                    adjacency[a].push(b);
                    adjacency[b].push(a);
                }
            }
        }

        let mut visited = vec![false; named.len()];
        let mut components: Vec<Vec<usize>> = Vec::new();
        for start in 0..named.len() {
            if visited[start] || adjacency[start].is_empty() {
                continue;
            }
            visited[start] = true;
            let mut queue = VecDeque::from([start]);
            let mut component = Vec::new();
            while let Some(node) = queue.pop_front() {
                component.push(named[node].0);
                for &next in &adjacency[node] {
                    if !visited[next] {
                        visited[next] = true;
                        queue.push_back(next);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }

        for component in components {
            let candidates = self.first_per_broker(&component);
            if candidates.len() >= 2 && self.is_valid_group(&candidates) {
                self.claim(candidates, MatchType::Fuzzy, confidence);
            }
        }
    }
}
