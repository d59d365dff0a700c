//! Parameterized statement text for model tables.
//!
//! Only identifiers from a validated `ModelSchema` are interpolated; values
//! are always `?` placeholders.

use crate::schema::{ModelSchema, ID_COLUMN};

pub fn select_all(schema: &ModelSchema) -> String {
    format!("SELECT * FROM {}", schema.table_name)
}

pub fn select_by_id(schema: &ModelSchema) -> String {
    format!("SELECT * FROM {} t WHERE t.{ID_COLUMN} = ?", schema.table_name)
}

/// One `WHERE` term of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition<'a> {
    /// `t.column = ?`
    Equals(&'a str),
    /// `t.column IS NULL`
    IsNull(&'a str),
}

/// `SELECT` with `AND`-joined conditions; `conditions` must not be empty.
pub fn select_where(schema: &ModelSchema, conditions: &[Condition<'_>]) -> String {
    let terms: Vec<String> = conditions
        .iter()
        .map(|condition| match condition {
            Condition::Equals(column) => format!("t.{column} = ?"),
            Condition::IsNull(column) => format!("t.{column} IS NULL"),
        })
        .collect();
    format!(
        "SELECT * FROM {} t WHERE {}",
        schema.table_name,
        terms.join(" AND ")
    )
}

/// `INSERT` binding every non-`id` column in descriptor order.
pub fn insert(schema: &ModelSchema) -> String {
    if schema.fields.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", schema.table_name);
    }
    let columns: Vec<&str> = schema.fields.iter().map(|field| field.name).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.table_name,
        columns.join(", "),
        placeholders
    )
}

/// `UPDATE` of every non-`id` column keyed on `id` (bound last); `None` when
/// the model has nothing to update.
pub fn update(schema: &ModelSchema) -> Option<String> {
    if schema.fields.is_empty() {
        return None;
    }
    let assignments: Vec<String> = schema
        .fields
        .iter()
        .map(|field| format!("{} = ?", field.name))
        .collect();
    Some(format!(
        "UPDATE {} SET {} WHERE {ID_COLUMN} = ?",
        schema.table_name,
        assignments.join(", ")
    ))
}

pub fn delete(schema: &ModelSchema) -> String {
    format!("DELETE FROM {} WHERE {ID_COLUMN} = ?", schema.table_name)
}
