//! Connection pool, PRAGMAs and embedded migrations.

use diesel::connection::{Connection, SimpleConnection};
use diesel::r2d2::{self, ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{error, info};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::StorageError;
use tallyfolio_core::errors::{DatabaseError, Error, Result};

pub mod write_actor;
pub use write_actor::{spawn_writer, WriteHandle};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

const PRAGMAS: &str = "
    PRAGMA foreign_keys = ON;
    PRAGMA busy_timeout = 30000;
    PRAGMA synchronous = NORMAL;
";

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Creates the database file (and its directory) and switches it to WAL.
pub fn init(db_path: &str) -> Result<String> {
    if let Some(db_dir) = Path::new(db_path).parent() {
        if !db_dir.as_os_str().is_empty() && !db_dir.exists() {
            fs::create_dir_all(db_dir)?;
        }
    }

    let mut conn = SqliteConnection::establish(db_path).map_err(StorageError::from)?;
    conn.batch_execute("PRAGMA journal_mode = WAL;")
        .map_err(StorageError::from)?;
    conn.batch_execute(PRAGMAS).map_err(StorageError::from)?;

    Ok(db_path.to_string())
}

pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder()
        .max_size(8)
        .min_idle(Some(1))
        .connection_timeout(Duration::from_secs(30))
        .connection_customizer(Box::new(ConnectionCustomizer))
        .build(manager)
        .map_err(|e| Error::Database(DatabaseError::PoolCreationFailed(e.to_string())))?;
    Ok(Arc::new(pool))
}

pub fn run_migrations(pool: &DbPool) -> Result<()> {
    info!("Running database migrations");
    let mut connection = get_connection(pool)?;

    let applied = connection.run_pending_migrations(MIGRATIONS).map_err(|e| {
        error!("Database migration failed: {}", e);
        Error::from(StorageError::MigrationFailed(e.to_string()))
    })?;

    if applied.is_empty() {
        info!("No pending migrations to apply.");
    } else {
        for version in &applied {
            info!("Applied migration {}", version);
        }
    }

    Ok(())
}

pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    Ok(pool.get().map_err(StorageError::from)?)
}

#[derive(Debug)]
struct ConnectionCustomizer;

impl r2d2::CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), r2d2::Error> {
        conn.batch_execute(PRAGMAS).map_err(r2d2::Error::QueryError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::RunQueryDsl;
    use tempfile::tempdir;

    #[derive(diesel::QueryableByName)]
    struct TableName {
        #[diesel(sql_type = diesel::sql_types::Text)]
        name: String,
    }

    #[test]
    fn test_init_creates_nested_directory() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("data").join("tallyfolio.db");

        let path = init(&db_path.to_string_lossy()).unwrap();

        assert!(Path::new(&path).exists());
    }

    #[test]
    fn test_migrations_create_cache_tables() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).unwrap();

        run_migrations(&pool).unwrap();
        // Second run is a no-op.
        run_migrations(&pool).unwrap();

        let mut conn = get_connection(&pool).unwrap();
        let tables: Vec<TableName> = diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '__diesel%' ORDER BY name",
        )
        .load(&mut conn)
        .unwrap();
        let names: Vec<String> = tables.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["exchange_rate_cache", "security_references"]);
    }
}
