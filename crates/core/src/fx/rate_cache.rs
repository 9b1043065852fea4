use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use super::fx_model::ExchangeRate;

type PairKey = (String, String);

/// In-process cache of fetched rates, keyed by ordered currency pair.
///
/// Expired entries are evicted lazily on lookup or by [`RateCache::purge_expired`].
#[derive(Debug, Default)]
pub struct RateCache {
    entries: Mutex<HashMap<PairKey, ExchangeRate>>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PairKey, ExchangeRate>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Returns a live entry; an expired one is removed and reported as a miss.
    pub fn get(&self, from: &str, to: &str, now: DateTime<Utc>) -> Option<ExchangeRate> {
        let key = (from.to_string(), to.to_string());
        let mut entries = self.lock();
        match entries.get(&key) {
            Some(rate) if !rate.is_expired_at(now) => Some(rate.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, rate: ExchangeRate) {
        let key = (rate.from.clone(), rate.to.clone());
        self.lock().insert(key, rate);
    }

    /// Drops the given pairs, whatever their expiry.
    pub fn purge(&self, pairs: &[PairKey]) {
        let mut entries = self.lock();
        for pair in pairs {
            entries.remove(pair);
        }
    }

    /// Drops every entry expired at `now`; returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, rate| !rate.is_expired_at(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
