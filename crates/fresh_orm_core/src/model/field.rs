//! Rust field types and their column mapping.

use crate::codec::{CodecError, CodecResult, Value};
use crate::schema::{FieldDescriptor, StructuredKind, TypeTag};
use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// A Rust type that can be stored in one model column.
///
/// The `TypeTag` reported here drives both the DDL column type and the codec
/// branch. `Option<T>` reuses `T`'s tag and marks the column nullable.
pub trait FieldValue: Sized {
    fn type_tag() -> TypeTag;

    fn is_optional() -> bool {
        false
    }

    fn to_value(&self) -> CodecResult<Value>;

    fn from_value(value: Value) -> CodecResult<Self>;

    /// Descriptor for a field of this type named `name`.
    fn descriptor(name: &'static str) -> FieldDescriptor {
        FieldDescriptor::new(name, Self::type_tag(), Self::is_optional())
    }
}

impl FieldValue for i64 {
    fn type_tag() -> TypeTag {
        TypeTag::Integer
    }

    fn to_value(&self) -> CodecResult<Value> {
        Ok(Value::Integer(*self))
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Integer(v) => Ok(v),
            other => Err(CodecError::mismatch("integer", &other)),
        }
    }
}

macro_rules! narrow_integer {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn type_tag() -> TypeTag {
                    TypeTag::Integer
                }

                fn to_value(&self) -> CodecResult<Value> {
                    Ok(Value::Integer(i64::from(*self)))
                }

                fn from_value(value: Value) -> CodecResult<Self> {
                    match value {
                        Value::Integer(v) => <$ty>::try_from(v).map_err(|_| CodecError::OutOfRange {
                            field: String::new(),
                            value: v,
                            target: stringify!($ty),
                        }),
                        other => Err(CodecError::mismatch("integer", &other)),
                    }
                }
            }
        )*
    };
}

narrow_integer!(i8, i16, i32, u8, u16, u32);

impl FieldValue for f64 {
    fn type_tag() -> TypeTag {
        TypeTag::Float
    }

    fn to_value(&self) -> CodecResult<Value> {
        Ok(Value::Float(*self))
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Integer(v) => Ok(v as f64),
            other => Err(CodecError::mismatch("float", &other)),
        }
    }
}

impl FieldValue for f32 {
    fn type_tag() -> TypeTag {
        TypeTag::Float
    }

    fn to_value(&self) -> CodecResult<Value> {
        Ok(Value::Float(f64::from(*self)))
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl FieldValue for bool {
    fn type_tag() -> TypeTag {
        TypeTag::Boolean
    }

    fn to_value(&self) -> CodecResult<Value> {
        Ok(Value::Boolean(*self))
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Boolean(v) => Ok(v),
            other => Err(CodecError::mismatch("boolean", &other)),
        }
    }
}

impl FieldValue for String {
    fn type_tag() -> TypeTag {
        TypeTag::Text
    }

    fn to_value(&self) -> CodecResult<Value> {
        Ok(Value::Text(self.clone()))
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(CodecError::mismatch("text", &other)),
        }
    }
}

impl FieldValue for NaiveDate {
    fn type_tag() -> TypeTag {
        TypeTag::Date
    }

    fn to_value(&self) -> CodecResult<Value> {
        Ok(Value::Date(*self))
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Date(v) => Ok(v),
            other => Err(CodecError::mismatch("date", &other)),
        }
    }
}

impl FieldValue for NaiveDateTime {
    fn type_tag() -> TypeTag {
        TypeTag::DateTime
    }

    fn to_value(&self) -> CodecResult<Value> {
        Ok(Value::DateTime(*self))
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::DateTime(v) => Ok(v),
            other => Err(CodecError::mismatch("datetime", &other)),
        }
    }
}

impl FieldValue for serde_json::Map<String, serde_json::Value> {
    fn type_tag() -> TypeTag {
        TypeTag::Structured(StructuredKind::Map)
    }

    fn to_value(&self) -> CodecResult<Value> {
        Ok(Value::Structured(serde_json::Value::Object(self.clone())))
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Structured(serde_json::Value::Object(map)) => Ok(map),
            Value::Structured(_) => Err(CodecError::ShapeMismatch {
                field: String::new(),
                expected: StructuredKind::Map,
            }),
            other => Err(CodecError::mismatch("structured map", &other)),
        }
    }
}

impl<V> FieldValue for BTreeMap<String, V>
where
    V: Serialize + DeserializeOwned,
{
    fn type_tag() -> TypeTag {
        TypeTag::Structured(StructuredKind::Map)
    }

    fn to_value(&self) -> CodecResult<Value> {
        to_structured(self)
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        from_structured(value, "structured map")
    }
}

impl<V, S> FieldValue for HashMap<String, V, S>
where
    V: Serialize + DeserializeOwned,
    S: BuildHasher + Default,
{
    fn type_tag() -> TypeTag {
        TypeTag::Structured(StructuredKind::Map)
    }

    fn to_value(&self) -> CodecResult<Value> {
        to_structured(self)
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        from_structured(value, "structured map")
    }
}

impl<T> FieldValue for Vec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn type_tag() -> TypeTag {
        TypeTag::Structured(StructuredKind::List)
    }

    fn to_value(&self) -> CodecResult<Value> {
        to_structured(self)
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        from_structured(value, "structured list")
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn type_tag() -> TypeTag {
        T::type_tag()
    }

    fn is_optional() -> bool {
        true
    }

    fn to_value(&self) -> CodecResult<Value> {
        match self {
            Some(inner) => inner.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

fn to_structured<T: Serialize>(value: &T) -> CodecResult<Value> {
    serde_json::to_value(value)
        .map(Value::Structured)
        .map_err(|err| CodecError::InvalidStructured {
            field: String::new(),
            message: err.to_string(),
        })
}

fn from_structured<T: DeserializeOwned>(value: Value, expected: &'static str) -> CodecResult<T> {
    match value {
        Value::Structured(json) => {
            serde_json::from_value(json).map_err(|err| CodecError::InvalidStructured {
                field: String::new(),
                message: err.to_string(),
            })
        }
        other => Err(CodecError::mismatch(expected, &other)),
    }
}

/// Stores a `Display` value as text; the `#[orm(as_text)]` fallback.
pub(super) fn to_text_value<T: std::fmt::Display>(value: &T) -> CodecResult<Value> {
    Ok(Value::Text(value.to_string()))
}

/// Parses a text column with `FromStr`; the `#[orm(as_text)]` fallback.
pub(super) fn from_text_value<T>(value: Value) -> CodecResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Value::Text(text) => match text.parse() {
            Ok(parsed) => Ok(parsed),
            Err(err) => Err(CodecError::InvalidText {
                field: String::new(),
                message: err.to_string(),
                value: text,
            }),
        },
        other => Err(CodecError::mismatch("text", &other)),
    }
}
