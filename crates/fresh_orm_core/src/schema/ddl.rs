//! `CREATE TABLE` generation from validated model schemas.
//!
//! # Responsibility
//! - Map each `TypeTag` to a column storage class and optional CHECK clause.
//! - Append one foreign-key clause per reference field after all columns.
//!
//! # Invariants
//! - Output always uses `CREATE TABLE IF NOT EXISTS`; re-running it never
//!   alters an existing table.
//! - Every non-`id` column is explicitly `NULL` or `NOT NULL`.

use super::{
    introspect, FieldDescriptor, IntrospectionResult, ModelSchema, StructuredKind, TypeTag,
    ID_COLUMN,
};
use crate::model::Model;

const ID_COLUMN_DEFINITION: &str = "INTEGER PRIMARY KEY AUTOINCREMENT";
const DATE_LIKE_PATTERN: &str = "____-__-__";
const DATETIME_LIKE_PATTERN: &str = "____-__-__ __:__:__%";

/// Builds the DDL statement for `M` after validating its schema.
pub fn build_create_table<M: Model>() -> IntrospectionResult<String> {
    let schema = introspect::<M>()?;
    Ok(create_table_sql(&schema))
}

/// Builds the DDL statement for an already validated schema.
pub fn create_table_sql(schema: &ModelSchema) -> String {
    let mut definitions = Vec::with_capacity(schema.fields.len() + 1);
    definitions.push(format!("{ID_COLUMN} {ID_COLUMN_DEFINITION}"));
    definitions.extend(schema.fields.iter().map(column_definition));
    definitions.extend(schema.foreign_keys().filter_map(foreign_key_clause));

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        schema.table_name,
        definitions.join(", ")
    )
}

/// Renders one column definition: name, storage class, CHECK, nullability.
pub fn column_definition(field: &FieldDescriptor) -> String {
    let name = field.name;
    let storage = match &field.type_tag {
        TypeTag::Integer | TypeTag::ModelReference(_) => "INTEGER".to_string(),
        TypeTag::Float => "REAL".to_string(),
        // 0/1 encoding.
        TypeTag::Boolean => "INTEGER".to_string(),
        TypeTag::Text => "TEXT".to_string(),
        TypeTag::Structured(StructuredKind::Map | StructuredKind::List) => {
            format!("TEXT CHECK(json_valid({name}))")
        }
        TypeTag::Date => format!("TEXT CHECK({name} LIKE '{DATE_LIKE_PATTERN}')"),
        TypeTag::DateTime => format!("TEXT CHECK({name} LIKE '{DATETIME_LIKE_PATTERN}')"),
    };
    let nullability = if field.is_optional { "NULL" } else { "NOT NULL" };

    format!("{name} {storage} {nullability}")
}

/// Renders the foreign-key clause for a reference field.
pub fn foreign_key_clause(field: &FieldDescriptor) -> Option<String> {
    field.reference().map(|target| {
        format!(
            "FOREIGN KEY ({}) REFERENCES {}({ID_COLUMN})",
            field.name, target.table
        )
    })
}
