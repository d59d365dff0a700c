//! Field introspection for model types.
//!
//! # Responsibility
//! - Collect a model's declared descriptors and table name.
//! - Validate them once so SQL generation can trust the names.
//!
//! # Invariants
//! - Validation never reorders descriptors.
//! - Table and column names are plain SQL identifiers and never SQLite
//!   keywords; they are interpolated into statements verbatim.

use super::{IntrospectionError, IntrospectionResult, ModelSchema, ID_COLUMN};
use crate::model::Model;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// SQLite's reserved words, upper-case.
const SQL_KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN", "KEY",
    "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT", "NOTHING",
    "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS", "OUTER", "OVER",
    "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE", "RANGE",
    "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE", "RESTRICT",
    "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET", "TABLE",
    "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "UNBOUNDED", "UNION",
    "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN", "WHERE",
    "WINDOW", "WITH", "WITHOUT",
];

static KEYWORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| SQL_KEYWORDS.iter().copied().collect());

/// Returns whether `value` is usable as an unquoted table or column name.
///
/// Keywords are rejected in any letter case.
pub fn is_valid_identifier(value: &str) -> bool {
    IDENTIFIER_RE.is_match(value)
        && !KEYWORD_SET.contains(value.to_ascii_uppercase().as_str())
}

/// Derives and validates the ordered field descriptors of `M`.
///
/// # Errors
/// - `InvalidTableName` / `InvalidFieldName` for names that are not plain
///   identifiers or that are SQLite keywords.
/// - `ReservedField` when a descriptor is named `id`.
/// - `DuplicateField` when two descriptors share a name.
pub fn introspect<M: Model>() -> IntrospectionResult<ModelSchema> {
    let type_name = M::TYPE_NAME;
    let table_name = M::table_name().into_owned();
    if !is_valid_identifier(&table_name) {
        return Err(IntrospectionError::InvalidTableName {
            model: type_name,
            table: table_name,
        });
    }

    let fields = M::fields();
    let mut seen = HashSet::with_capacity(fields.len());
    for field in &fields {
        if !is_valid_identifier(field.name) {
            return Err(IntrospectionError::InvalidFieldName {
                model: type_name,
                field: field.name.to_string(),
            });
        }
        if field.name.eq_ignore_ascii_case(ID_COLUMN) {
            return Err(IntrospectionError::ReservedField {
                model: type_name,
                field: field.name,
            });
        }
        if !seen.insert(field.name.to_ascii_lowercase()) {
            return Err(IntrospectionError::DuplicateField {
                model: type_name,
                field: field.name,
            });
        }
        if let Some(target) = field.reference() {
            if !is_valid_identifier(&target.table) {
                return Err(IntrospectionError::InvalidTableName {
                    model: target.model,
                    table: target.table.clone(),
                });
            }
        }
    }

    Ok(ModelSchema {
        type_name,
        table_name,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::{introspect, is_valid_identifier};
    use crate::codec::CodecResult;
    use crate::model::{Model, Record};
    use crate::schema::{FieldDescriptor, IntrospectionError, TypeTag};

    struct Manual;

    impl Model for Manual {
        const TYPE_NAME: &'static str = "Manual";
        const TABLE_NAME: Option<&'static str> = Some("manual_rows");

        fn fields() -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::new("title", TypeTag::Text, false),
                FieldDescriptor::new("score", TypeTag::Float, true),
            ]
        }

        fn id(&self) -> Option<i64> {
            None
        }

        fn set_id(&mut self, _id: i64) {}

        fn to_record(&self) -> CodecResult<Record> {
            Ok(Record::new(None))
        }

        fn from_record(_record: Record) -> CodecResult<Self> {
            Ok(Manual)
        }
    }

    macro_rules! broken_model {
        ($name:ident, $table:expr, [$($field:expr),*]) => {
            struct $name;

            impl Model for $name {
                const TYPE_NAME: &'static str = stringify!($name);
                const TABLE_NAME: Option<&'static str> = $table;

                fn fields() -> Vec<FieldDescriptor> {
                    vec![$($field),*]
                }

                fn id(&self) -> Option<i64> {
                    None
                }

                fn set_id(&mut self, _id: i64) {}

                fn to_record(&self) -> CodecResult<Record> {
                    Ok(Record::new(None))
                }

                fn from_record(_record: Record) -> CodecResult<Self> {
                    Ok($name)
                }
            }
        };
    }

    broken_model!(WithId, None, [FieldDescriptor::new("id", TypeTag::Integer, false)]);
    broken_model!(
        Twice,
        None,
        [
            FieldDescriptor::new("name", TypeTag::Text, false),
            FieldDescriptor::new("Name", TypeTag::Text, true)
        ]
    );
    broken_model!(BadTable, Some("drop table; --"), []);
    broken_model!(BadField, None, [FieldDescriptor::new("two words", TypeTag::Text, false)]);
    broken_model!(Order, None, []);
    broken_model!(KeywordField, None, [FieldDescriptor::new("group", TypeTag::Text, false)]);

    #[test]
    fn introspect_keeps_declaration_order_and_table_override() {
        let schema = introspect::<Manual>().unwrap();
        assert_eq!(schema.type_name, "Manual");
        assert_eq!(schema.table_name, "manual_rows");
        let names: Vec<_> = schema.fields.iter().map(|field| field.name).collect();
        assert_eq!(names, ["title", "score"]);
        assert_eq!(schema.column_names(), ["id", "title", "score"]);
    }

    #[test]
    fn introspect_rejects_reserved_id_field() {
        let err = introspect::<WithId>().unwrap_err();
        assert!(matches!(
            err,
            IntrospectionError::ReservedField { field: "id", .. }
        ));
    }

    #[test]
    fn introspect_rejects_case_insensitive_duplicates() {
        let err = introspect::<Twice>().unwrap_err();
        assert!(matches!(
            err,
            IntrospectionError::DuplicateField { field: "Name", .. }
        ));
    }

    #[test]
    fn introspect_rejects_non_identifier_names() {
        assert!(matches!(
            introspect::<BadTable>().unwrap_err(),
            IntrospectionError::InvalidTableName { .. }
        ));
        assert!(matches!(
            introspect::<BadField>().unwrap_err(),
            IntrospectionError::InvalidFieldName { .. }
        ));
    }

    #[test]
    fn introspect_rejects_keyword_names() {
        assert!(matches!(
            introspect::<Order>().unwrap_err(),
            IntrospectionError::InvalidTableName { table, .. } if table == "order"
        ));
        assert!(matches!(
            introspect::<KeywordField>().unwrap_err(),
            IntrospectionError::InvalidFieldName { field, .. } if field == "group"
        ));
    }

    #[test]
    fn identifier_rules() {
        assert!(is_valid_identifier("category"));
        assert!(is_valid_identifier("_private2"));
        assert!(!is_valid_identifier("2fast"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("name\""));
        assert!(!is_valid_identifier("When"));
        assert!(!is_valid_identifier("order"));
        assert!(is_valid_identifier("orders"));
    }
}
