//! Small ORM over embedded SQLite.
//!
//! Models are plain structs deriving [`Model`]; their fields are introspected
//! into [`schema::ModelSchema`]s, turned into `CREATE TABLE` statements and
//! persisted through the generic [`Repository`] contract.

extern crate self as fresh_orm_core;

pub mod codec;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schema;
pub mod service;

pub use codec::{CodecError, Value};
pub use config::{ConfigError, DbConfig, DbLocation};
pub use db::{
    configure_shared, open_db, open_db_in_memory, reset_shared_database, shared_database,
    Database, DbError,
};
pub use fresh_orm_derive::Model;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::{FieldValue, Model, Record, Related};
pub use repo::{Criteria, RepoError, RepoResult, Repository, SqliteRepository};
pub use schema::{introspect, FieldDescriptor, IntrospectionError, ModelSchema, TypeTag};
pub use service::ModelService;

// Re-exported for models with date and structured fields.
pub use chrono;
pub use serde_json;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
