//! Shallow references between models.
//!
//! # Invariants
//! - Only the referenced record's `id` is ever written; the record itself is
//!   never persisted through the referencing model.
//! - Reads always yield `Related::Id`; resolving the record is up to the
//!   caller.

use super::{FieldValue, Model};
use crate::codec::{CodecError, CodecResult, Value};
use crate::schema::{ModelRef, TypeTag};

/// Foreign-key field value pointing at a record of `M`.
#[derive(Debug, Clone)]
pub enum Related<M> {
    /// Bare identifier, as read back from storage.
    Id(i64),
    /// In-memory record; only its `id` is stored.
    Record(Box<M>),
}

impl<M: Model> Related<M> {
    /// Identifier of the referenced record, `None` for an unsaved record.
    pub fn target_id(&self) -> Option<i64> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Record(record) => record.id(),
        }
    }

    /// The in-memory record, when one was attached.
    pub fn record(&self) -> Option<&M> {
        match self {
            Self::Id(_) => None,
            Self::Record(record) => Some(record),
        }
    }
}

impl<M: Model> From<M> for Related<M> {
    fn from(record: M) -> Self {
        Self::Record(Box::new(record))
    }
}

impl<M: Model> From<&M> for Related<M>
where
    M: Clone,
{
    fn from(record: &M) -> Self {
        Self::Record(Box::new(record.clone()))
    }
}

/// References compare by identifier only.
impl<M: Model> PartialEq for Related<M> {
    fn eq(&self, other: &Self) -> bool {
        self.target_id() == other.target_id()
    }
}

impl<M: Model> PartialEq<i64> for Related<M> {
    fn eq(&self, other: &i64) -> bool {
        self.target_id() == Some(*other)
    }
}

impl<M: Model> FieldValue for Related<M> {
    fn type_tag() -> TypeTag {
        TypeTag::ModelReference(ModelRef {
            model: M::TYPE_NAME,
            table: M::table_name().into_owned(),
        })
    }

    fn to_value(&self) -> CodecResult<Value> {
        self.target_id()
            .map(Value::Reference)
            .ok_or(CodecError::UnsavedReference {
                field: String::new(),
                model: M::TYPE_NAME,
            })
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Reference(id) | Value::Integer(id) => Ok(Self::Id(id)),
            other => Err(CodecError::mismatch("model reference", &other)),
        }
    }
}
