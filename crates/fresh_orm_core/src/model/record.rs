//! Dynamic field bag exchanged between models and the repository.

use super::field::{from_text_value, to_text_value};
use super::FieldValue;
use crate::codec::{CodecError, CodecResult, Value};
use std::fmt::Display;
use std::str::FromStr;

/// One model instance as ordered `(field, value)` pairs plus its `id`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    id: Option<i64>,
    values: Vec<(&'static str, Value)>,
}

impl Record {
    pub fn new(id: Option<i64>) -> Self {
        Self {
            id,
            values: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Appends a field value. Lookups resolve the first entry with a name.
    pub fn push(&mut self, field: &'static str, value: Value) {
        self.values.push((field, value));
    }

    /// Converts a field with `FieldValue::to_value` and appends it.
    pub fn push_field<T: FieldValue>(&mut self, field: &'static str, value: &T) -> CodecResult<()> {
        let value = value.to_value().map_err(|err| err.with_field(field))?;
        self.push(field, value);
        Ok(())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    /// Appends a field stored through its `Display` text.
    pub fn push_text<T: Display>(&mut self, field: &'static str, value: &T) -> CodecResult<()> {
        let value = to_text_value(value).map_err(|err| err.with_field(field))?;
        self.push(field, value);
        Ok(())
    }

    /// Like `push_text`, with `None` stored as NULL.
    pub fn push_optional_text<T: Display>(
        &mut self,
        field: &'static str,
        value: Option<&T>,
    ) -> CodecResult<()> {
        match value {
            Some(value) => self.push_text(field, value),
            None => {
                self.push(field, Value::Null);
                Ok(())
            }
        }
    }

    /// Removes a field value and converts it into `T`.
    ///
    /// # Errors
    /// - `MissingField` when no value was recorded for `field`.
    /// - Any conversion error from `T::from_value`, tagged with `field`.
    pub fn take<T: FieldValue>(&mut self, field: &str) -> CodecResult<T> {
        let value = self.take_value(field)?;
        T::from_value(value).map_err(|err| err.with_field(field))
    }

    /// Removes a text field value and parses it with `FromStr`.
    pub fn take_text<T>(&mut self, field: &str) -> CodecResult<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let value = self.take_value(field)?;
        from_text_value(value).map_err(|err| err.with_field(field))
    }

    /// Like `take_text`, with NULL read back as `None`.
    pub fn take_optional_text<T>(&mut self, field: &str) -> CodecResult<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.take_value(field)? {
            Value::Null => Ok(None),
            value => from_text_value(value)
                .map(Some)
                .map_err(|err| err.with_field(field)),
        }
    }

    fn take_value(&mut self, field: &str) -> CodecResult<Value> {
        let position = self
            .values
            .iter()
            .position(|(name, _)| *name == field)
            .ok_or_else(|| CodecError::MissingField {
                field: field.to_string(),
            })?;
        Ok(self.values.remove(position).1)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Record;
    use crate::codec::{CodecError, Value};
    use std::net::Ipv4Addr;

    #[test]
    fn take_converts_and_removes() {
        let mut record = Record::new(Some(3));
        record.push("name", Value::Text("x".into()));
        record.push("count", Value::Integer(2));

        let name: String = record.take("name").unwrap();
        assert_eq!(name, "x");
        assert_eq!(record.len(), 1);
        assert_eq!(record.id(), Some(3));
        assert_eq!(
            record.take::<String>("name").unwrap_err(),
            CodecError::MissingField {
                field: "name".into()
            }
        );
    }

    #[test]
    fn take_tags_conversion_errors_with_field_name() {
        let mut record = Record::new(None);
        record.push("count", Value::Text("two".into()));
        let err = record.take::<i64>("count").unwrap_err();
        assert!(err.to_string().contains("`count`"), "unexpected error: {err}");
    }

    #[test]
    fn optional_text_maps_none_to_null() {
        let mut record = Record::new(None);
        record
            .push_optional_text::<Ipv4Addr>("backup", None)
            .unwrap();
        record
            .push_optional_text("primary", Some(&Ipv4Addr::LOCALHOST))
            .unwrap();
        assert_eq!(record.get("backup"), Some(&Value::Null));
        assert_eq!(record.get("primary"), Some(&Value::Text("127.0.0.1".into())));

        assert_eq!(record.take_optional_text::<Ipv4Addr>("backup").unwrap(), None);
        assert_eq!(
            record.take_optional_text::<Ipv4Addr>("primary").unwrap(),
            Some(Ipv4Addr::LOCALHOST)
        );
    }
}
