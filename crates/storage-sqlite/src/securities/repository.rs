use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use super::model::SecurityReferenceDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::security_references;
use tallyfolio_core::errors::{Error, ValidationError};
use tallyfolio_core::identifiers::{normalize_symbol, SecurityReference, SecurityReferenceLookup};
use tallyfolio_core::Result;

pub struct SecurityReferenceRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SecurityReferenceRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    pub fn list_references(&self) -> Result<Vec<SecurityReference>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = security_references::table
            .order(security_references::symbol.asc())
            .select(SecurityReferenceDB::as_select())
            .load::<SecurityReferenceDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(SecurityReference::from).collect())
    }

    /// Inserts or replaces reference rows. Symbols are stored normalized so
    /// that "EQNR.OL" and "EQNR" share one entry.
    pub async fn upsert_references(&self, references: Vec<SecurityReference>) -> Result<usize> {
        let updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let rows = references
            .into_iter()
            .map(|reference| {
                let symbol = normalize_symbol(&reference.symbol);
                if symbol.is_empty() {
                    return Err(Error::Validation(ValidationError::MissingField(
                        "symbol".to_string(),
                    )));
                }
                Ok(SecurityReferenceDB {
                    symbol,
                    isin: reference.isin,
                    cusip: reference.cusip,
                    sedol: reference.sedol,
                    name: reference.name,
                    exchange: reference.exchange,
                    updated_at: updated_at.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut written = 0;
                for row in &rows {
                    written += diesel::replace_into(security_references::table)
                        .values(row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(written)
            })
            .await
    }
}

#[async_trait]
impl SecurityReferenceLookup for SecurityReferenceRepository {
    async fn lookup_security(&self, symbol: &str) -> Result<Option<SecurityReference>> {
        let key = normalize_symbol(symbol);
        let mut conn = get_connection(&self.pool)?;
        let row = security_references::table
            .find(key.as_str())
            .select(SecurityReferenceDB::as_select())
            .first::<SecurityReferenceDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        if row.is_none() {
            debug!("No reference data stored for {}", key);
        }
        Ok(row.map(SecurityReference::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use tempfile::{tempdir, TempDir};

    async fn create_test_repository() -> (SecurityReferenceRepository, TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).unwrap();
        run_migrations(&pool).unwrap();
        let writer = spawn_writer((*pool).clone());
        (SecurityReferenceRepository::new(pool, writer), temp_dir)
    }

    fn equinor() -> SecurityReference {
        SecurityReference {
            symbol: "EQNR.OL".to_string(),
            isin: Some("NO0010096985".to_string()),
            name: Some("Equinor ASA".to_string()),
            exchange: Some("XOSL".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_lookup_uses_normalized_symbol() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.upsert_references(vec![equinor()]).await.unwrap();

        let found = repo.lookup_security("eqnr").await.unwrap().unwrap();

        assert_eq!(found.symbol, "EQNR");
        assert_eq!(found.isin.as_deref(), Some("NO0010096985"));
        assert!(repo.lookup_security("DNB").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_lists_sorted() {
        let (repo, _temp_dir) = create_test_repository().await;
        let dnb = SecurityReference {
            symbol: "DNB".to_string(),
            ..Default::default()
        };
        repo.upsert_references(vec![equinor(), dnb]).await.unwrap();

        let mut updated = equinor();
        updated.cusip = Some("29446M102".to_string());
        repo.upsert_references(vec![updated]).await.unwrap();

        let all = repo.list_references().unwrap();
        let symbols: Vec<&str> = all.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["DNB", "EQNR"]);
        assert_eq!(all[1].cusip.as_deref(), Some("29446M102"));
    }

    #[tokio::test]
    async fn test_empty_symbol_is_rejected_before_writing() {
        let (repo, _temp_dir) = create_test_repository().await;
        let blank = SecurityReference {
            symbol: "  ".to_string(),
            ..Default::default()
        };

        let result = repo.upsert_references(vec![equinor(), blank]).await;

        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::MissingField(_)))
        ));
        assert!(repo.list_references().unwrap().is_empty());
    }
}
