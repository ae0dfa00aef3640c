//! SQLite pool for CarMatch.
//!
//! Every pooled connection runs in WAL mode with foreign keys enforced and a
//! busy timeout, so writers queue behind `BEGIN IMMEDIATE` instead of failing.
//! The schema ships inside the binary as embedded migrations.

use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::{error, info};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Pragmas applied to each new SQLite connection.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas {
    busy_timeout: Duration,
}

impl SqlitePragmas {
    fn script(&self) -> String {
        format!(
            "PRAGMA journal_mode = WAL;\n\
             PRAGMA synchronous = NORMAL;\n\
             PRAGMA foreign_keys = ON;\n\
             PRAGMA busy_timeout = {};",
            self.busy_timeout.as_millis()
        )
    }
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&self.script())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Opens the pool for `database_url`, a path to the SQLite file.
pub fn establish_connection_pool(database_url: &str) -> Result<DbPool, PoolError> {
    Pool::builder()
        .connection_customizer(Box::new(SqlitePragmas {
            busy_timeout: BUSY_TIMEOUT,
        }))
        .build(ConnectionManager::<SqliteConnection>::new(database_url))
}

/// Checks a connection out of the pool, logging when none is available.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, PoolError> {
    pool.get().inspect_err(|err| {
        let state = pool.state();
        error!(
            "No database connection available ({} of {} in use): {err}",
            state.connections.saturating_sub(state.idle_connections),
            pool.max_size()
        );
    })
}

/// Brings the schema up to date. Safe to call on every start.
pub fn run_migrations(pool: &DbPool) -> Result<(), String> {
    let mut pooled = get_connection(pool).map_err(|err| err.to_string())?;
    let conn: &mut SqliteConnection = &mut pooled;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| format!("Failed to run migrations: {err}"))?;

    match applied.len() {
        0 => info!("Database schema is up to date"),
        count => info!("Applied {count} database migration(s)"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pragma_script_sets_busy_timeout_in_millis() {
        let script = SqlitePragmas {
            busy_timeout: Duration::from_millis(1500),
        }
        .script();
        assert!(script.contains("PRAGMA foreign_keys = ON;"));
        assert!(script.contains("PRAGMA journal_mode = WAL;"));
        assert!(script.ends_with("PRAGMA busy_timeout = 1500;"));
    }
}
