//! Model schema metadata and DDL generation.
//!
//! # Responsibility
//! - Describe model fields as ordered, validated descriptors.
//! - Turn descriptors into `CREATE TABLE IF NOT EXISTS` statements.
//!
//! # Invariants
//! - Descriptor order matches field declaration order.
//! - `id` is implicit, always the first column and never a descriptor.
//! - `is_foreign_key` is true iff the tag is `TypeTag::ModelReference`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod ddl;
mod introspect;

pub use ddl::{build_create_table, column_definition, create_table_sql, foreign_key_clause};
pub use introspect::{introspect, is_valid_identifier};

/// Name of the implicit primary-key column.
pub const ID_COLUMN: &str = "id";

pub type IntrospectionResult<T> = Result<T, IntrospectionError>;

/// Shape of a structured (serialized) field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredKind {
    Map,
    List,
}

impl StructuredKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::List => "list",
        }
    }
}

/// Target of a foreign-key field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    /// Simple type name of the referenced model.
    pub model: &'static str,
    /// Table the foreign key points at.
    pub table: String,
}

/// Closed set of column value kinds understood by the codec and DDL builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    Integer,
    Float,
    Boolean,
    Text,
    Structured(StructuredKind),
    Date,
    DateTime,
    ModelReference(ModelRef),
}

impl TypeTag {
    /// Short human-readable name used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::Structured(StructuredKind::Map) => "structured map",
            Self::Structured(StructuredKind::List) => "structured list",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::ModelReference(_) => "model reference",
        }
    }
}

/// Metadata for one non-`id` model field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub type_tag: TypeTag,
    pub is_optional: bool,
    pub is_foreign_key: bool,
}

impl FieldDescriptor {
    /// Builds a descriptor; the foreign-key flag follows from `type_tag`.
    pub fn new(name: &'static str, type_tag: TypeTag, is_optional: bool) -> Self {
        let is_foreign_key = matches!(type_tag, TypeTag::ModelReference(_));
        Self {
            name,
            type_tag,
            is_optional,
            is_foreign_key,
        }
    }

    /// Referenced model, when this field is a foreign key.
    pub fn reference(&self) -> Option<&ModelRef> {
        match &self.type_tag {
            TypeTag::ModelReference(target) => Some(target),
            _ => None,
        }
    }
}

/// Validated schema of one model type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSchema {
    pub type_name: &'static str,
    pub table_name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl ModelSchema {
    /// Looks up a descriptor by field name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Column names in storage order, `id` first.
    pub fn column_names(&self) -> Vec<&str> {
        std::iter::once(ID_COLUMN)
            .chain(self.fields.iter().map(|field| field.name))
            .collect()
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.is_foreign_key)
    }
}

/// Errors raised while deriving or validating a model schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntrospectionError {
    InvalidTableName {
        model: &'static str,
        table: String,
    },
    InvalidFieldName {
        model: &'static str,
        field: String,
    },
    /// A declared field collides with the implicit primary key.
    ReservedField {
        model: &'static str,
        field: &'static str,
    },
    DuplicateField {
        model: &'static str,
        field: &'static str,
    },
}

impl Display for IntrospectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTableName { model, table } => {
                write!(f, "model `{model}` maps to invalid table name `{table}`")
            }
            Self::InvalidFieldName { model, field } => {
                write!(f, "model `{model}` declares invalid field name `{field}`")
            }
            Self::ReservedField { model, field } => write!(
                f,
                "model `{model}` declares reserved field `{field}`; `id` is implicit"
            ),
            Self::DuplicateField { model, field } => {
                write!(f, "model `{model}` declares field `{field}` more than once")
            }
        }
    }
}

impl Error for IntrospectionError {}
