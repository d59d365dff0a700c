//! SQLite implementation of the generic model repository.
//!
//! # Responsibility
//! - Build and run parameterized statements for one model's table.
//! - Convert records to bound parameters and result rows back to records.
//!
//! # Invariants
//! - The schema is introspected once, when the repository is built.
//! - `create` never re-reads the inserted row; only `id` is written back.
//! - Log events carry table names, counts and durations, never field values.

use super::sql::{self, Condition};
use super::{Criteria, RepoError, RepoResult, Repository};
use crate::codec::{self, CodecError};
use crate::db::{Database, QueryRows};
use crate::model::{Model, Record};
use crate::schema::{introspect, FieldDescriptor, ModelSchema, TypeTag, ID_COLUMN};
use log::{debug, warn};
use rusqlite::types::Value as SqlValue;
use std::marker::PhantomData;
use std::time::Instant;

/// SQLite-backed repository for model `M`.
pub struct SqliteRepository<'db, M> {
    db: &'db Database,
    schema: ModelSchema,
    _model: PhantomData<fn() -> M>,
}

impl<'db, M: Model> SqliteRepository<'db, M> {
    /// Builds a repository after validating `M`'s schema.
    ///
    /// The table is not touched; see `create_table` and `verify_schema`.
    pub fn try_new(db: &'db Database) -> RepoResult<Self> {
        let schema = introspect::<M>()?;
        Ok(Self {
            db,
            schema,
            _model: PhantomData,
        })
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    /// Creates the model's table if it does not exist yet.
    pub fn create_table(&self) -> RepoResult<()> {
        self.db.init_tables(std::slice::from_ref(&self.schema))?;
        Ok(())
    }

    /// Checks that the live table has every column the model needs.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when the table does not exist.
    /// - `MissingRequiredColumn` for the first absent column.
    pub fn verify_schema(&self) -> RepoResult<()> {
        let table = &self.schema.table_name;
        let Some(columns) = self.db.table_columns(table)? else {
            return Err(RepoError::MissingRequiredTable(table.clone()));
        };

        for expected in self.schema.column_names() {
            if !columns
                .iter()
                .any(|column| column.eq_ignore_ascii_case(expected))
            {
                return Err(RepoError::MissingRequiredColumn {
                    table: table.clone(),
                    column: expected.to_string(),
                });
            }
        }
        Ok(())
    }

    fn encode_fields(&self, record: &M) -> RepoResult<Vec<SqlValue>> {
        let values = record.to_record()?;
        self.schema
            .fields
            .iter()
            .map(|field| {
                let value = values.get(field.name).ok_or_else(|| CodecError::MissingField {
                    field: field.name.to_string(),
                })?;
                Ok(codec::encode(value, field)?)
            })
            .collect()
    }

    fn decode_rows(&self, rows: QueryRows) -> RepoResult<Vec<M>> {
        let table = &self.schema.table_name;
        let id_index = rows
            .column_index(ID_COLUMN)
            .ok_or_else(|| RepoError::MissingRequiredColumn {
                table: table.clone(),
                column: ID_COLUMN.to_string(),
            })?;
        let field_indexes = self
            .schema
            .fields
            .iter()
            .map(|field| {
                rows.column_index(field.name)
                    .map(|index| (field, index))
                    .ok_or_else(|| RepoError::MissingRequiredColumn {
                        table: table.clone(),
                        column: field.name.to_string(),
                    })
            })
            .collect::<RepoResult<Vec<_>>>()?;

        let mut models = Vec::with_capacity(rows.len());
        for mut row in rows.rows {
            let id = match std::mem::replace(&mut row[id_index], SqlValue::Null) {
                SqlValue::Integer(id) => id,
                other => {
                    return Err(RepoError::InvalidData(format!(
                        "non-integer id ({other:?}) in {table}.{ID_COLUMN}"
                    )));
                }
            };

            let mut record = Record::new(Some(id));
            for (field, index) in &field_indexes {
                let stored = std::mem::replace(&mut row[*index], SqlValue::Null);
                record.push(field.name, codec::decode(stored, field)?);
            }
            models.push(M::from_record(record)?);
        }
        Ok(models)
    }

    fn bind_criteria<'c>(
        &self,
        criteria: &'c Criteria,
    ) -> RepoResult<(Vec<Condition<'c>>, Vec<SqlValue>)> {
        if criteria.is_empty() {
            return Err(RepoError::InvalidQuery(format!(
                "filter on `{}` needs at least one criterion",
                self.schema.table_name
            )));
        }

        let id_field = FieldDescriptor::new(ID_COLUMN, TypeTag::Integer, false);
        let mut conditions = Vec::with_capacity(criteria.len());
        let mut params = Vec::with_capacity(criteria.len());
        for (name, value) in criteria.iter() {
            let field = if name == ID_COLUMN {
                &id_field
            } else {
                self.schema
                    .field(name)
                    .ok_or_else(|| RepoError::UnknownField {
                        table: self.schema.table_name.clone(),
                        field: name.to_string(),
                    })?
            };

            if value.is_null() {
                conditions.push(Condition::IsNull(field.name));
            } else {
                conditions.push(Condition::Equals(field.name));
                params.push(codec::encode(value, field)?);
            }
        }
        Ok((conditions, params))
    }

    fn finish<T>(
        &self,
        event: &'static str,
        started_at: Instant,
        result: RepoResult<T>,
    ) -> RepoResult<T> {
        if let Err(err) = &result {
            warn!(
                "event={} module=repo status=error table={} duration_ms={} error_code={}",
                event,
                self.schema.table_name,
                started_at.elapsed().as_millis(),
                err.code()
            );
        }
        result
    }
}

impl<M: Model> Repository<M> for SqliteRepository<'_, M> {
    fn all(&self) -> RepoResult<Vec<M>> {
        let started_at = Instant::now();
        let result = self
            .db
            .query(&sql::select_all(&self.schema), &[])
            .map_err(RepoError::from)
            .and_then(|rows| self.decode_rows(rows));

        if let Ok(models) = &result {
            debug!(
                "event=repo_all module=repo status=ok table={} rows={} duration_ms={}",
                self.schema.table_name,
                models.len(),
                started_at.elapsed().as_millis()
            );
        }
        self.finish("repo_all", started_at, result)
    }

    fn filter(&self, criteria: &Criteria) -> RepoResult<Vec<M>> {
        let started_at = Instant::now();
        let result = self.bind_criteria(criteria).and_then(|(conditions, params)| {
            let rows = self
                .db
                .query(&sql::select_where(&self.schema, &conditions), &params)?;
            self.decode_rows(rows)
        });

        if let Ok(models) = &result {
            debug!(
                "event=repo_filter module=repo status=ok table={} criteria={} rows={} duration_ms={}",
                self.schema.table_name,
                criteria.len(),
                models.len(),
                started_at.elapsed().as_millis()
            );
        }
        self.finish("repo_filter", started_at, result)
    }

    fn by_id(&self, id: i64) -> RepoResult<Option<M>> {
        let started_at = Instant::now();
        let result = self
            .db
            .query(&sql::select_by_id(&self.schema), &[SqlValue::Integer(id)])
            .map_err(RepoError::from)
            .and_then(|rows| self.decode_rows(rows))
            .map(|models| models.into_iter().next());

        if let Ok(found) = &result {
            debug!(
                "event=repo_by_id module=repo status=ok table={} id={} found={} duration_ms={}",
                self.schema.table_name,
                id,
                found.is_some(),
                started_at.elapsed().as_millis()
            );
        }
        self.finish("repo_by_id", started_at, result)
    }

    fn create(&self, mut record: M) -> RepoResult<M> {
        let started_at = Instant::now();
        let result = self.encode_fields(&record).and_then(|params| {
            Ok(self.db.execute(&sql::insert(&self.schema), &params)?)
        });

        let result = result.map(|execution| {
            record.set_id(execution.last_insert_id);
            debug!(
                "event=repo_create module=repo status=ok table={} id={} duration_ms={}",
                self.schema.table_name,
                execution.last_insert_id,
                started_at.elapsed().as_millis()
            );
            record
        });
        self.finish("repo_create", started_at, result)
    }

    fn update(&self, record: M) -> RepoResult<M> {
        let started_at = Instant::now();
        let Some(id) = record.id() else {
            let result = Err(RepoError::MissingId {
                model: self.schema.type_name,
            });
            return self.finish("repo_update", started_at, result);
        };
        let Some(statement) = sql::update(&self.schema) else {
            debug!(
                "event=repo_update module=repo status=skipped table={} id={} reason=no_columns",
                self.schema.table_name, id
            );
            return Ok(record);
        };

        let result = self.encode_fields(&record).and_then(|mut params| {
            params.push(SqlValue::Integer(id));
            Ok(self.db.execute(&statement, &params)?)
        });

        let result = result.map(|execution| {
            debug!(
                "event=repo_update module=repo status=ok table={} id={} rows={} duration_ms={}",
                self.schema.table_name,
                id,
                execution.rows_affected,
                started_at.elapsed().as_millis()
            );
            record
        });
        self.finish("repo_update", started_at, result)
    }

    fn delete(&self, id: i64) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self
            .db
            .execute(&sql::delete(&self.schema), &[SqlValue::Integer(id)])
            .map_err(RepoError::from)
            .map(|execution| {
                debug!(
                    "event=repo_delete module=repo status=ok table={} id={} rows={} duration_ms={}",
                    self.schema.table_name,
                    id,
                    execution.rows_affected,
                    started_at.elapsed().as_millis()
                );
            });
        self.finish("repo_delete", started_at, result)
    }
}
