use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use super::model::{format_timestamp, ExchangeRateCacheDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::exchange_rate_cache;
use tallyfolio_core::fx::{ExchangeRate, ExchangeRateCacheStore};
use tallyfolio_core::Result;

/// Persistent rate cache keyed by the ordered currency pair.
#[derive(Clone)]
pub struct ExchangeRateCacheRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ExchangeRateCacheRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    pub fn count(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        exchange_rate_cache::table
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()
    }
}

#[async_trait]
impl ExchangeRateCacheStore for ExchangeRateCacheRepository {
    fn get_rate(&self, from: &str, to: &str) -> Result<Option<ExchangeRate>> {
        let mut conn = get_connection(&self.pool)?;
        let row = exchange_rate_cache::table
            .find((from, to))
            .select(ExchangeRateCacheDB::as_select())
            .first::<ExchangeRateCacheDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        match row {
            Some(row) => Ok(Some(ExchangeRate::try_from(row)?)),
            None => Ok(None),
        }
    }

    async fn upsert_rate(&self, rate: ExchangeRate) -> Result<()> {
        let row = ExchangeRateCacheDB::from(&rate);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::replace_into(exchange_rate_cache::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<Vec<(String, String)>> {
        let cutoff = format_timestamp(now);
        let deleted = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Vec<(String, String)>> {
                let expired = exchange_rate_cache::table
                    .filter(exchange_rate_cache::expires_at.le(cutoff.as_str()))
                    .select((
                        exchange_rate_cache::from_currency,
                        exchange_rate_cache::to_currency,
                    ))
                    .load::<(String, String)>(conn)
                    .map_err(StorageError::from)?;

                diesel::delete(
                    exchange_rate_cache::table
                        .filter(exchange_rate_cache::expires_at.le(cutoff.as_str())),
                )
                .execute(conn)
                .map_err(StorageError::from)?;

                Ok(expired)
            })
            .await?;

        debug!("Deleted {} expired cached rates", deleted.len());
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use tallyfolio_core::fx::RateSource;
    use tempfile::{tempdir, TempDir};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap()
    }

    async fn create_test_repository() -> (ExchangeRateCacheRepository, TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).unwrap();
        run_migrations(&pool).unwrap();
        let writer = spawn_writer((*pool).clone());
        (ExchangeRateCacheRepository::new(pool, writer), temp_dir)
    }

    fn rate(from: &str, to: &str, value: rust_decimal::Decimal, ttl: Duration) -> ExchangeRate {
        ExchangeRate::new(from, to, value, RateSource::PrimaryApi, t0(), ttl)
    }

    #[tokio::test]
    async fn test_upsert_and_read_back() {
        let (repo, _temp_dir) = create_test_repository().await;
        let stored = rate("USD", "NOK", dec!(10.6), Duration::hours(1));

        repo.upsert_rate(stored.clone()).await.unwrap();

        assert_eq!(repo.get_rate("USD", "NOK").unwrap(), Some(stored));
        assert_eq!(repo.get_rate("NOK", "USD").unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_pair() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.upsert_rate(rate("USD", "NOK", dec!(10.6), Duration::hours(1)))
            .await
            .unwrap();
        repo.upsert_rate(rate("USD", "NOK", dec!(10.9), Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(repo.count().unwrap(), 1);
        let current = repo.get_rate("USD", "NOK").unwrap().unwrap();
        assert_eq!(current.rate, dec!(10.9));
    }

    #[tokio::test]
    async fn test_delete_expired_returns_deleted_pairs() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.upsert_rate(rate("USD", "NOK", dec!(10.6), Duration::minutes(30)))
            .await
            .unwrap();
        repo.upsert_rate(rate("USD", "EUR", dec!(0.92), Duration::hours(2)))
            .await
            .unwrap();

        // Expiry is inclusive: the NOK entry expires exactly at t0 + 30m.
        let deleted = repo
            .delete_expired(t0() + Duration::minutes(30))
            .await
            .unwrap();

        assert_eq!(deleted, vec![("USD".to_string(), "NOK".to_string())]);
        assert_eq!(repo.count().unwrap(), 1);
        assert!(repo.get_rate("USD", "EUR").unwrap().is_some());
    }
}
