use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use super::fx_errors::FxError;
use super::fx_model::FallbackRateEntry;
use crate::constants::TRIANGULATION_CURRENCY;

/// How a fallback rate was derived from the static table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    Direct,
    Inverse,
    /// Through the triangulation currency (USD).
    Triangulated,
    /// No path at all; 1.0 assumed.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackRate {
    pub rate: Decimal,
    pub kind: FallbackKind,
}

/// Built-in table, quoted against USD.
pub fn default_fallback_rates() -> Vec<FallbackRateEntry> {
    [
        ("EUR", dec!(0.92)),
        ("GBP", dec!(0.79)),
        ("NOK", dec!(10.6)),
        ("SEK", dec!(10.4)),
        ("DKK", dec!(6.9)),
        ("CAD", dec!(1.36)),
        ("CHF", dec!(0.88)),
        ("JPY", dec!(150)),
        ("AUD", dec!(1.52)),
    ]
    .into_iter()
    .map(|(to, rate)| FallbackRateEntry::new(TRIANGULATION_CURRENCY, to, rate))
    .collect()
}

/// Static last-resort rate table.
///
/// Rates are stored per ordered pair. A lookup tries the direct pair, then the
/// inverse of the reverse pair, then a two-leg path through USD where each leg
/// may itself be direct or inverse.
#[derive(Debug, Clone, Default)]
pub struct FallbackRates {
    rates: HashMap<(String, String), Decimal>,
}

impl FallbackRates {
    pub fn new(entries: &[FallbackRateEntry]) -> Result<Self, FxError> {
        let mut rates = HashMap::with_capacity(entries.len());
        for entry in entries {
            if entry.rate <= Decimal::ZERO {
                return Err(FxError::InvalidRate(format!(
                    "fallback rate {}->{} must be positive, got {}",
                    entry.from, entry.to, entry.rate
                )));
            }
            let key = (entry.from.trim().to_uppercase(), entry.to.trim().to_uppercase());
            rates.insert(key, entry.rate);
        }
        Ok(Self { rates })
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Looks up `from -> to`; always yields a rate.
    pub fn lookup(&self, from: &str, to: &str) -> FallbackRate {
        if from == to {
            return FallbackRate {
                rate: Decimal::ONE,
                kind: FallbackKind::Direct,
            };
        }
        if let Some(rate) = self.direct(from, to) {
            return FallbackRate {
                rate,
                kind: FallbackKind::Direct,
            };
        }
        if let Some(rate) = self.inverse(from, to) {
            return FallbackRate {
                rate,
                kind: FallbackKind::Inverse,
            };
        }
        if let Some(rate) = self.triangulated(from, to) {
            return FallbackRate {
                rate,
                kind: FallbackKind::Triangulated,
            };
        }
        FallbackRate {
            rate: Decimal::ONE,
            kind: FallbackKind::Default,
        }
    }

    fn direct(&self, from: &str, to: &str) -> Option<Decimal> {
        self.rates.get(&(from.to_string(), to.to_string())).copied()
    }

    fn inverse(&self, from: &str, to: &str) -> Option<Decimal> {
        self.direct(to, from).map(|rate| Decimal::ONE / rate)
    }

    fn leg(&self, from: &str, to: &str) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }
        self.direct(from, to).or_else(|| self.inverse(from, to))
    }

    fn triangulated(&self, from: &str, to: &str) -> Option<Decimal> {
        let via = TRIANGULATION_CURRENCY;
        if from == via || to == via {
            return None;
        }
        let first = self.leg(from, via)?;
        let second = self.leg(via, to)?;
        first.checked_mul(second)
    }
}
