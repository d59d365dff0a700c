//! SQLite storage handle and schema bootstrap entry points.
//!
//! # Responsibility
//! - Own one SQLite connection behind a single writer lock.
//! - Execute parameterized statements and return rows with column names.
//! - Create model tables with create-if-missing semantics.
//!
//! # Invariants
//! - Every write runs in its own transaction and is committed before return.
//! - Values only ever reach SQLite through parameter binding.
//! - Constraint failures surface as `DbError::ConstraintViolation`.

use crate::config::{ConfigError, DbLocation};
use log::info;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

mod open;
mod shared;
mod tables;

pub use open::{open_db, open_db_in_memory};
pub use shared::{configure_shared, reset_shared_database, shared_database};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// SQLite rejected a write because of a CHECK, NOT NULL, UNIQUE or
    /// FOREIGN KEY constraint.
    ConstraintViolation(rusqlite::Error),
    /// A previous holder of the connection lock panicked.
    LockPoisoned,
    Config(ConfigError),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::ConstraintViolation(err) => write!(f, "constraint violation: {err}"),
            Self::LockPoisoned => write!(f, "database connection lock is poisoned"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::ConstraintViolation(err) => Some(err),
            Self::LockPoisoned => None,
            Self::Config(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        if value.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
            Self::ConstraintViolation(value)
        } else {
            Self::Sqlite(value)
        }
    }
}

impl From<ConfigError> for DbError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Result set of one query: column names plus raw storage values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl QueryRows {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Outcome of one committed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    pub rows_affected: usize,
    /// `last_insert_rowid()` observed right after the statement.
    pub last_insert_id: i64,
}

/// Shared SQLite handle.
///
/// Access to the connection is serialized by a mutex, so one `Database` can be
/// used from several threads (for example through `Arc<Database>`); statements
/// still run one at a time.
pub struct Database {
    conn: Mutex<Connection>,
    location: DbLocation,
}

impl Database {
    pub(crate) fn from_connection(conn: Connection, location: DbLocation) -> Self {
        Self {
            conn: Mutex::new(conn),
            location,
        }
    }

    pub fn location(&self) -> &DbLocation {
        &self.location
    }

    /// Runs `f` with exclusive access to the raw connection.
    pub fn with_connection<R>(
        &self,
        f: impl FnOnce(&mut Connection) -> rusqlite::Result<R>,
    ) -> DbResult<R> {
        let mut conn = self.lock()?;
        Ok(f(&mut *conn)?)
    }

    /// Runs a read statement and collects every row.
    pub fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<QueryRows> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let column_count = columns.len();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut collected = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for index in 0..column_count {
                values.push(owned_value(row.get_ref(index)?)?);
            }
            collected.push(values);
        }

        Ok(QueryRows {
            columns,
            rows: collected,
        })
    }

    /// Runs one write statement in a transaction and commits it.
    pub fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<Execution> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let rows_affected = tx.execute(sql, params_from_iter(params.iter()))?;
        let last_insert_id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Execution {
            rows_affected,
            last_insert_id,
        })
    }

    /// Runs parameterless statements, e.g. pragmas or DDL.
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    /// Closes the connection, reporting any error SQLite raises on close.
    pub fn close(self) -> DbResult<()> {
        let mode = self.location.mode();
        let conn = self.conn.into_inner().map_err(|_| DbError::LockPoisoned)?;
        conn.close().map_err(|(_, err)| DbError::from(err))?;
        info!("event=db_close module=db status=ok mode={mode}");
        Ok(())
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }
}

/// Copies a borrowed column value, rejecting TEXT that is not UTF-8.
fn owned_value(value: ValueRef<'_>) -> rusqlite::Result<SqlValue> {
    Ok(match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(v) => SqlValue::Integer(v),
        ValueRef::Real(v) => SqlValue::Real(v),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(rusqlite::Error::Utf8Error)?;
            SqlValue::Text(text.to_string())
        }
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    })
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}
