//! Pooled SQLite connections for the topology store.
//!
//! Property rows only cascade with their pool member when foreign keys are
//! enforced, and SQLite enables that per connection. Every connection the
//! pool hands out is therefore prepared by [`SqlitePragmas`] first.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::debug;

use crate::error::{Error, Result};

/// Schema migrations shipped inside the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

pub const DEFAULT_POOL_SIZE: u32 = 5;

const MEMORY_URL: &str = ":memory:";
const BUSY_TIMEOUT_MS: u32 = 5_000;

#[derive(Debug, Clone, Copy)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        diesel::sql_query("PRAGMA foreign_keys = ON")
            .execute(conn)
            .and_then(|_| {
                diesel::sql_query(format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}")).execute(conn)
            })
            .map(|_| ())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Pool with [`DEFAULT_POOL_SIZE`] connections.
pub fn create_pool(database_url: &str) -> Result<DbPool> {
    create_pool_with_size(database_url, DEFAULT_POOL_SIZE)
}

/// Pool with up to `max_size` connections.
///
/// Each `:memory:` connection opens a private database, so an in-memory pool
/// never holds more than one.
pub fn create_pool_with_size(database_url: &str, max_size: u32) -> Result<DbPool> {
    let max_size = if database_url == MEMORY_URL { 1 } else { max_size };
    debug!(url = %database_url, max_size, "Opening SQLite pool");
    Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(SqlitePragmas))
        .build(ConnectionManager::<SqliteConnection>::new(database_url))
        .map_err(|e| Error::Connection(format!("{database_url}: {e}")))
}

/// Bring the schema up to date. Applied migrations are skipped.
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Database(e.to_string()))?;
    for version in applied {
        debug!(%version, "Applied migration");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(diesel::QueryableByName)]
    struct Name {
        #[diesel(sql_type = diesel::sql_types::Text)]
        name: String,
    }

    #[derive(diesel::QueryableByName)]
    struct Pragma {
        #[diesel(sql_type = diesel::sql_types::Integer)]
        foreign_keys: i32,
    }

    fn migrated() -> DbPool {
        let pool = create_pool(MEMORY_URL).unwrap();
        run_migrations(&pool).unwrap();
        pool
    }

    #[test]
    fn in_memory_pool_holds_one_connection() {
        let pool = create_pool_with_size(MEMORY_URL, 8).unwrap();
        assert_eq!(pool.max_size(), 1);
    }

    #[test]
    fn file_pool_honours_requested_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topology.db");
        let pool = create_pool_with_size(path.to_str().unwrap(), 3).unwrap();
        assert_eq!(pool.max_size(), 3);
    }

    #[test]
    fn migrations_create_membership_tables() {
        let pool = migrated();
        let mut conn = pool.get().unwrap();

        let tables: Vec<String> = diesel::sql_query(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name LIKE 'poolmember%' ORDER BY name",
        )
        .load::<Name>(&mut conn)
        .unwrap()
        .into_iter()
        .map(|row| row.name)
        .collect();

        assert_eq!(tables, vec!["poolmember_properties", "poolmembers"]);
    }

    #[test]
    fn migrating_twice_is_harmless() {
        let pool = migrated();
        run_migrations(&pool).unwrap();
    }

    #[test]
    fn connections_enforce_foreign_keys() {
        let pool = create_pool(MEMORY_URL).unwrap();
        let mut conn = pool.get().unwrap();

        let rows: Vec<Pragma> = diesel::sql_query("PRAGMA foreign_keys")
            .load(&mut conn)
            .unwrap();
        assert_eq!(rows[0].foreign_keys, 1);
    }
}
