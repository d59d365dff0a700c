//! Model capability shared by every persisted record type.
//!
//! # Responsibility
//! - Define what a type must expose to be mapped to one table.
//! - Provide the field-level conversions used by derived and manual impls.
//!
//! # Invariants
//! - Every model carries an integer `id`, `None` until persisted.
//! - `fields()` lists non-`id` fields in declaration order.
//! - `to_record` / `from_record` use the same field names as `fields()`.

use crate::codec::CodecResult;
use crate::schema::FieldDescriptor;
use std::borrow::Cow;

mod field;
mod record;
mod related;

pub use field::FieldValue;
pub use record::Record;
pub use related::Related;

/// A record type mapped to one table.
///
/// Usually implemented with `#[derive(Model)]`.
pub trait Model: Sized {
    /// Simple type name.
    const TYPE_NAME: &'static str;

    /// Explicit table name; `None` means the lower-cased type name.
    const TABLE_NAME: Option<&'static str> = None;

    /// Non-`id` field descriptors in declaration order.
    fn fields() -> Vec<FieldDescriptor>;

    /// Database-assigned identifier, `None` until persisted.
    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    /// Converts every field into its native dynamic value.
    fn to_record(&self) -> CodecResult<Record>;

    /// Rebuilds an instance from decoded values.
    fn from_record(record: Record) -> CodecResult<Self>;

    fn table_name() -> Cow<'static, str> {
        table_name_for(Self::TYPE_NAME, Self::TABLE_NAME)
    }
}

/// Resolves a table name from a type name and an optional override.
pub fn table_name_for(type_name: &str, table_override: Option<&'static str>) -> Cow<'static, str> {
    match table_override {
        Some(table) => Cow::Borrowed(table),
        None => Cow::Owned(type_name.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::table_name_for;

    #[test]
    fn table_name_is_lowercased_type_name_unless_overridden() {
        assert_eq!(table_name_for("Category", None), "category");
        assert_eq!(table_name_for("ItemType", None), "itemtype");
        assert_eq!(table_name_for("Item", Some("items")), "items");
    }
}
