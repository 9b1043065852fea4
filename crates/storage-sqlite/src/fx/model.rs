//! Database model for cached exchange rates.

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::StorageError;
use tallyfolio_core::fx::{ExchangeRate, RateSource};

/// One cached rate. Timestamps are fixed-width RFC 3339 text so that string
/// comparison in SQL orders them chronologically.
#[derive(Queryable, Selectable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::exchange_rate_cache)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExchangeRateCacheDB {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: String,
    pub source: String,
    pub timestamp: String,
    pub expires_at: String,
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::CorruptRow(format!("{} '{}': {}", column, value, e)))
}

impl From<&ExchangeRate> for ExchangeRateCacheDB {
    fn from(rate: &ExchangeRate) -> Self {
        Self {
            from_currency: rate.from.clone(),
            to_currency: rate.to.clone(),
            rate: rate.rate.to_string(),
            source: rate.source.as_str().to_string(),
            timestamp: format_timestamp(rate.timestamp),
            expires_at: format_timestamp(rate.expires_at),
        }
    }
}

impl TryFrom<ExchangeRateCacheDB> for ExchangeRate {
    type Error = StorageError;

    fn try_from(db: ExchangeRateCacheDB) -> Result<Self, Self::Error> {
        let rate = Decimal::from_str(&db.rate)
            .map_err(|e| StorageError::CorruptRow(format!("rate '{}': {}", db.rate, e)))?;
        let source = RateSource::from_str(&db.source)
            .map_err(|e| StorageError::CorruptRow(e.to_string()))?;
        Ok(ExchangeRate {
            timestamp: parse_timestamp("timestamp", &db.timestamp)?,
            expires_at: parse_timestamp("expires_at", &db.expires_at)?,
            from: db.from_currency,
            to: db.to_currency,
            rate,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    #[test]
    fn test_row_keeps_full_precision_and_source() {
        let t0 = Utc.with_ymd_and_hms(2026, 2, 3, 8, 15, 0).unwrap();
        let rate = ExchangeRate::new(
            "SEK",
            "NOK",
            dec!(0.94444444444),
            RateSource::SecondaryApi,
            t0,
            Duration::hours(1),
        );

        let row = ExchangeRateCacheDB::from(&rate);
        assert_eq!(row.source, "secondary-api");
        assert_eq!(row.expires_at, "2026-02-03T09:15:00.000000Z");

        let back = ExchangeRate::try_from(row).unwrap();
        assert_eq!(back, rate);
    }

    #[test]
    fn test_corrupt_rate_is_rejected() {
        let row = ExchangeRateCacheDB {
            from_currency: "USD".to_string(),
            to_currency: "EUR".to_string(),
            rate: "not-a-number".to_string(),
            source: "primary-api".to_string(),
            timestamp: "2026-02-03T08:15:00.000000Z".to_string(),
            expires_at: "2026-02-03T09:15:00.000000Z".to_string(),
        };

        assert!(matches!(
            ExchangeRate::try_from(row),
            Err(StorageError::CorruptRow(_))
        ));
    }
}
