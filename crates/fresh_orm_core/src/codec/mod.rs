//! Bidirectional conversion between native values and SQLite columns.
//!
//! # Responsibility
//! - Encode a native `Value` into the storage representation its field
//!   descriptor calls for.
//! - Decode a stored column back into a native `Value`.
//!
//! # Invariants
//! - Both directions dispatch on `TypeTag` exhaustively.
//! - `decode(encode(v)) == v` for every well-formed `v`, including `Null` on
//!   optional fields.
//! - References are stored and returned as bare identifiers.
//! - NaN floats and dates outside years 0000-9999 are never written.

use crate::schema::{FieldDescriptor, StructuredKind, TypeTag};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rusqlite::types::Value as SqlValue;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod value;

pub use value::Value;

/// Canonical text form of `TypeTag::Date` columns.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Canonical text form of `TypeTag::DateTime` columns; the fraction is only
/// written when non-zero.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
/// Years whose canonical text has exactly four digits.
const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

pub type CodecResult<T> = Result<T, CodecError>;

/// Conversion failures between native values and stored columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// `NULL` met on a non-optional field.
    UnexpectedNull { field: String },
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    /// Structured text parsed, but into the wrong shape.
    ShapeMismatch {
        field: String,
        expected: StructuredKind,
    },
    InvalidStructured { field: String, message: String },
    InvalidDate { field: String, value: String },
    InvalidDateTime { field: String, value: String },
    /// NaN has no REAL storage; SQLite reads it back as NULL.
    NotANumber { field: String },
    /// Stored integer does not fit the declared Rust type.
    OutOfRange {
        field: String,
        value: i64,
        target: &'static str,
    },
    /// Text-fallback field failed to parse.
    InvalidText {
        field: String,
        value: String,
        message: String,
    },
    /// Related record has not been persisted yet.
    UnsavedReference { field: String, model: &'static str },
    MissingField { field: String },
}

impl CodecError {
    /// Attaches a field name to errors raised before the field was known.
    pub fn with_field(mut self, name: &str) -> Self {
        let slot = match &mut self {
            Self::UnexpectedNull { field }
            | Self::TypeMismatch { field, .. }
            | Self::ShapeMismatch { field, .. }
            | Self::InvalidStructured { field, .. }
            | Self::InvalidDate { field, .. }
            | Self::InvalidDateTime { field, .. }
            | Self::NotANumber { field }
            | Self::OutOfRange { field, .. }
            | Self::InvalidText { field, .. }
            | Self::UnsavedReference { field, .. }
            | Self::MissingField { field } => field,
        };
        if slot.is_empty() {
            *slot = name.to_string();
        }
        self
    }

    pub(crate) fn mismatch(expected: &'static str, found: &Value) -> Self {
        Self::TypeMismatch {
            field: String::new(),
            expected,
            found: found.kind(),
        }
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedNull { field } => {
                write!(f, "field `{field}` is not optional but has no value")
            }
            Self::TypeMismatch {
                field,
                expected,
                found,
            } => write!(f, "field `{field}` expects {expected}, got {found}"),
            Self::ShapeMismatch { field, expected } => write!(
                f,
                "field `{field}` expects a structured {}",
                expected.as_str()
            ),
            Self::InvalidStructured { field, message } => {
                write!(f, "field `{field}` holds invalid structured text: {message}")
            }
            Self::InvalidDate { field, value } => {
                write!(f, "field `{field}` holds invalid date `{value}`")
            }
            Self::InvalidDateTime { field, value } => {
                write!(f, "field `{field}` holds invalid datetime `{value}`")
            }
            Self::NotANumber { field } => write!(f, "field `{field}` cannot store NaN"),
            Self::OutOfRange {
                field,
                value,
                target,
            } => write!(f, "field `{field}` value {value} does not fit {target}"),
            Self::InvalidText {
                field,
                value,
                message,
            } => write!(f, "field `{field}` cannot parse `{value}`: {message}"),
            Self::UnsavedReference { field, model } => write!(
                f,
                "field `{field}` references an unsaved `{model}` record"
            ),
            Self::MissingField { field } => write!(f, "record has no value for field `{field}`"),
        }
    }
}

impl Error for CodecError {}

/// Encodes a native value into its column representation.
///
/// # Errors
/// - `UnexpectedNull` when `value` is `Null` on a non-optional field.
/// - `TypeMismatch` when `value` does not fit the field's tag.
/// - `ShapeMismatch` when a structured value has the wrong shape.
/// - `NotANumber` for NaN floats.
/// - `InvalidDate` / `InvalidDateTime` for years outside 0000-9999.
pub fn encode(value: &Value, field: &FieldDescriptor) -> CodecResult<SqlValue> {
    if value.is_null() {
        return if field.is_optional {
            Ok(SqlValue::Null)
        } else {
            Err(CodecError::UnexpectedNull {
                field: field.name.to_string(),
            })
        };
    }

    let encoded = match (&field.type_tag, value) {
        (TypeTag::Integer, Value::Integer(v)) => SqlValue::Integer(*v),
        (TypeTag::Float, Value::Float(v)) if v.is_nan() => {
            return Err(CodecError::NotANumber {
                field: field.name.to_string(),
            });
        }
        (TypeTag::Float, Value::Float(v)) => SqlValue::Real(*v),
        (TypeTag::Float, Value::Integer(v)) => SqlValue::Real(*v as f64),
        (TypeTag::Boolean, Value::Boolean(v)) => SqlValue::Integer(i64::from(*v)),
        (TypeTag::Text, Value::Text(v)) => SqlValue::Text(v.clone()),
        (TypeTag::Structured(kind), Value::Structured(v)) => {
            check_shape(*kind, v).map_err(|err| err.with_field(field.name))?;
            let text = serde_json::to_string(v).map_err(|err| CodecError::InvalidStructured {
                field: field.name.to_string(),
                message: err.to_string(),
            })?;
            SqlValue::Text(text)
        }
        (TypeTag::Date, Value::Date(v)) => {
            let text = v.format(DATE_FORMAT).to_string();
            if !STORABLE_YEARS.contains(&v.year()) {
                return Err(CodecError::InvalidDate {
                    field: field.name.to_string(),
                    value: text,
                });
            }
            SqlValue::Text(text)
        }
        (TypeTag::DateTime, Value::DateTime(v)) => {
            let text = v.format(DATETIME_FORMAT).to_string();
            if !STORABLE_YEARS.contains(&v.year()) {
                return Err(CodecError::InvalidDateTime {
                    field: field.name.to_string(),
                    value: text,
                });
            }
            SqlValue::Text(text)
        }
        (TypeTag::ModelReference(_), Value::Reference(id) | Value::Integer(id)) => {
            SqlValue::Integer(*id)
        }
        (tag, other) => {
            return Err(CodecError::mismatch(tag.describe(), other).with_field(field.name));
        }
    };

    Ok(encoded)
}

/// Decodes a stored column into a native value.
///
/// # Errors
/// - `UnexpectedNull` when a non-optional column is `NULL`.
/// - `InvalidStructured`, `InvalidDate`, `InvalidDateTime` on malformed text.
/// - `TypeMismatch` when the storage class does not fit the field's tag.
pub fn decode(stored: SqlValue, field: &FieldDescriptor) -> CodecResult<Value> {
    if matches!(stored, SqlValue::Null) {
        return if field.is_optional {
            Ok(Value::Null)
        } else {
            Err(CodecError::UnexpectedNull {
                field: field.name.to_string(),
            })
        };
    }

    let decoded = match (&field.type_tag, stored) {
        (TypeTag::Integer, SqlValue::Integer(v)) => Value::Integer(v),
        (TypeTag::Float, SqlValue::Real(v)) => Value::Float(v),
        (TypeTag::Float, SqlValue::Integer(v)) => Value::Float(v as f64),
        (TypeTag::Boolean, SqlValue::Integer(v)) => Value::Boolean(v != 0),
        (TypeTag::Text, SqlValue::Text(v)) => Value::Text(v),
        (TypeTag::Structured(kind), SqlValue::Text(text)) => {
            let parsed: serde_json::Value =
                serde_json::from_str(&text).map_err(|err| CodecError::InvalidStructured {
                    field: field.name.to_string(),
                    message: err.to_string(),
                })?;
            check_shape(*kind, &parsed).map_err(|err| err.with_field(field.name))?;
            Value::Structured(parsed)
        }
        (TypeTag::Date, SqlValue::Text(text)) => NaiveDate::parse_from_str(&text, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|_| CodecError::InvalidDate {
                field: field.name.to_string(),
                value: text,
            })?,
        (TypeTag::DateTime, SqlValue::Text(text)) => {
            NaiveDateTime::parse_from_str(&text, DATETIME_FORMAT)
                .map(Value::DateTime)
                .map_err(|_| CodecError::InvalidDateTime {
                    field: field.name.to_string(),
                    value: text,
                })?
        }
        (TypeTag::ModelReference(_), SqlValue::Integer(v)) => Value::Reference(v),
        (tag, other) => {
            return Err(CodecError::TypeMismatch {
                field: field.name.to_string(),
                expected: tag.describe(),
                found: storage_kind(&other),
            });
        }
    };

    Ok(decoded)
}

fn check_shape(kind: StructuredKind, value: &serde_json::Value) -> CodecResult<()> {
    let matches = match kind {
        StructuredKind::Map => value.is_object(),
        StructuredKind::List => value.is_array(),
    };
    if matches {
        Ok(())
    } else {
        Err(CodecError::ShapeMismatch {
            field: String::new(),
            expected: kind,
        })
    }
}

fn storage_kind(value: &SqlValue) -> &'static str {
    match value {
        SqlValue::Null => "NULL",
        SqlValue::Integer(_) => "INTEGER",
        SqlValue::Real(_) => "REAL",
        SqlValue::Text(_) => "TEXT",
        SqlValue::Blob(_) => "BLOB",
    }
}
