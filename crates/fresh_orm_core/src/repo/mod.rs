//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the generic CRUD contract every model gets.
//! - Keep SQL generation and row decoding inside the persistence boundary.
//!
//! # Invariants
//! - Generated SQL contains only table names, column names and placeholders;
//!   every value is bound as a parameter.
//! - Repository APIs report a missing row as `None`, not as an error.

use crate::codec::{CodecError, Value};
use crate::db::DbError;
use crate::model::Model;
use crate::schema::IntrospectionError;
use indexmap::IndexMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod model_repo;
pub mod sql;

pub use model_repo::SqliteRepository;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for model persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// SQLite rejected the write (CHECK, NOT NULL or FOREIGN KEY).
    ConstraintViolation(rusqlite::Error),
    Codec(CodecError),
    Introspection(IntrospectionError),
    /// The request cannot be turned into a well-formed statement.
    InvalidQuery(String),
    UnknownField {
        table: String,
        field: String,
    },
    /// `update` called on a record that was never persisted.
    MissingId {
        model: &'static str,
    },
    /// Raised by callers that require a row to exist.
    NotFound {
        model: &'static str,
        id: i64,
    },
    MissingRequiredTable(String),
    MissingRequiredColumn {
        table: String,
        column: String,
    },
    InvalidData(String),
}

impl RepoError {
    /// Stable code for log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "db_error",
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::Codec(_) => "codec_error",
            Self::Introspection(_) => "introspection_error",
            Self::InvalidQuery(_) => "invalid_query",
            Self::UnknownField { .. } => "unknown_field",
            Self::MissingId { .. } => "missing_id",
            Self::NotFound { .. } => "not_found",
            Self::MissingRequiredTable(_) => "missing_table",
            Self::MissingRequiredColumn { .. } => "missing_column",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ConstraintViolation(err) => write!(f, "constraint violation: {err}"),
            Self::Codec(err) => write!(f, "{err}"),
            Self::Introspection(err) => write!(f, "{err}"),
            Self::InvalidQuery(message) => write!(f, "invalid query: {message}"),
            Self::UnknownField { table, field } => {
                write!(f, "table `{table}` has no field `{field}`")
            }
            Self::MissingId { model } => {
                write!(f, "`{model}` record has no id; create it before updating")
            }
            Self::NotFound { model, id } => write!(f, "`{model}` record not found: {id}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::ConstraintViolation(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::Introspection(err) => Some(err),
            Self::InvalidQuery(_)
            | Self::UnknownField { .. }
            | Self::MissingId { .. }
            | Self::NotFound { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::ConstraintViolation(err) => Self::ConstraintViolation(err),
            DbError::Sqlite(rusqlite::Error::Utf8Error(err)) => {
                Self::InvalidData(format!("stored text is not valid UTF-8: {err}"))
            }
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        DbError::from(value).into()
    }
}

impl From<CodecError> for RepoError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

impl From<IntrospectionError> for RepoError {
    fn from(value: IntrospectionError) -> Self {
        Self::Introspection(value)
    }
}

/// Conjunctive equality criteria for `Repository::filter`.
///
/// Entries keep insertion order, which is also the order of the generated
/// `AND` terms; setting the same field twice keeps the first position and the
/// last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    entries: IndexMap<String, Value>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `field = value`.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(field.into(), value.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut criteria = Self::new();
        for (field, value) in iter {
            criteria.insert(field, value);
        }
        criteria
    }
}

/// Generic CRUD contract for one model type.
pub trait Repository<M: Model> {
    /// Every row, in storage order.
    fn all(&self) -> RepoResult<Vec<M>>;

    /// Rows matching every criterion.
    ///
    /// # Errors
    /// - `InvalidQuery` for empty criteria.
    /// - `UnknownField` for a criterion that names no column.
    fn filter(&self, criteria: &Criteria) -> RepoResult<Vec<M>>;

    fn by_id(&self, id: i64) -> RepoResult<Option<M>>;

    /// Inserts `record` and returns it with the assigned `id`.
    fn create(&self, record: M) -> RepoResult<M>;

    /// Overwrites every non-`id` column of the row keyed by `record.id`.
    ///
    /// Updating an id with no row is a silent no-op.
    fn update(&self, record: M) -> RepoResult<M>;

    /// Deletes the row with `id`; a missing row is a no-op.
    fn delete(&self, id: i64) -> RepoResult<()>;
}
