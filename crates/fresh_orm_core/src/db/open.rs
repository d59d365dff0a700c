//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite databases.
//! - Configure connection pragmas required by the repository layer.
//!
//! # Invariants
//! - Returned handles have `foreign_keys=ON` unless the config opts out.
//! - Opening never creates tables; schema setup is explicit.

use super::{DbResult, Database};
use crate::config::{DbConfig, DbLocation};
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

/// Opens the database described by `config`.
///
/// # Side effects
/// - Creates the database file when it does not exist yet.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(config: &DbConfig) -> DbResult<Database> {
    let started_at = Instant::now();
    let mode = config.location.mode();
    info!("event=db_open module=db status=start mode={mode}");

    let opened = match &config.location {
        DbLocation::File(path) => Connection::open(path),
        DbLocation::Memory => Connection::open_in_memory(),
    };
    let conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&conn, config) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={} foreign_keys={}",
                mode,
                started_at.elapsed().as_millis(),
                config.foreign_keys
            );
            Ok(Database::from_connection(conn, config.location.clone()))
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Opens a private in-memory database with default settings.
pub fn open_db_in_memory() -> DbResult<Database> {
    open_db(&DbConfig::in_memory())
}

fn bootstrap_connection(conn: &Connection, config: &DbConfig) -> DbResult<()> {
    let foreign_keys = if config.foreign_keys { "ON" } else { "OFF" };
    conn.execute_batch(&format!("PRAGMA foreign_keys = {foreign_keys};"))?;
    conn.busy_timeout(config.busy_timeout)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{open_db, open_db_in_memory};
    use crate::config::{DbConfig, DbLocation};

    fn foreign_keys_enabled(db: &crate::db::Database) -> bool {
        db.with_connection(|conn| conn.query_row("PRAGMA foreign_keys;", [], |row| row.get(0)))
            .map(|value: i64| value == 1)
            .unwrap()
    }

    #[test]
    fn in_memory_handle_enforces_foreign_keys() {
        let db = open_db_in_memory().unwrap();
        assert_eq!(db.location(), &DbLocation::Memory);
        assert!(foreign_keys_enabled(&db));
    }

    #[test]
    fn foreign_keys_can_be_disabled() {
        let config = DbConfig {
            foreign_keys: false,
            ..DbConfig::in_memory()
        };
        let db = open_db(&config).unwrap();
        assert!(!foreign_keys_enabled(&db));
        db.close().unwrap();
    }
}
