//! Table creation and live-schema inspection.
//!
//! # Responsibility
//! - Create model tables atomically with create-if-missing semantics.
//! - Report the columns of an existing table.
//!
//! # Invariants
//! - `init_tables` never alters or drops an existing table.
//! - Either every statement of one `init_tables` call applies, or none does.

use super::{DbResult, Database};
use crate::schema::{create_table_sql, ModelSchema};
use log::{error, info};
use rusqlite::params;
use std::time::Instant;

impl Database {
    /// Creates the tables of `schemas` in the given order, in one
    /// transaction.
    ///
    /// SQLite only checks foreign-key targets on write, so referencing tables
    /// may be listed before the tables they reference.
    pub fn init_tables(&self, schemas: &[ModelSchema]) -> DbResult<()> {
        let started_at = Instant::now();
        let result = self.with_connection(|conn| {
            let tx = conn.transaction()?;
            for schema in schemas {
                tx.execute_batch(&create_table_sql(schema))?;
            }
            tx.commit()
        });

        match &result {
            Ok(()) => info!(
                "event=schema_init module=schema status=ok tables={} duration_ms={}",
                schemas.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=schema_init module=schema status=error tables={} duration_ms={} error={}",
                schemas.len(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// Column names of `table` in storage order, or `None` when the table
    /// does not exist.
    pub fn table_columns(&self, table: &str) -> DbResult<Option<Vec<String>>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid;")?;
            let columns = stmt
                .query_map(params![table], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(if columns.is_empty() {
                None
            } else {
                Some(columns)
            })
        })
    }
}
