//! The storage-executor boundary.
//!
//! Repositories format table and column names into query text only after
//! `SafeIdentifier` validation; everything else (student ids, test ids,
//! id lists, limits) is bound as a [`QueryParam`] value. The warehouse
//! cannot parameterize identifiers, so this split is the whole injection
//! story.
//!
//! [`QueryExecutor`] is a trait so the assemblers can be driven by a
//! scripted executor in tests; [`WarehouseClient`] is the sqlx-backed
//! implementation that decodes dynamic `SELECT *` rows into JSON maps.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Number, Value};
use sqlx::postgres::{PgColumn, PgRow};
use sqlx::{Column, PgPool, Row as SqlxRow, TypeInfo};
use thiserror::Error;
use uuid::Uuid;

use gradebook_core::{Row, SafeIdentifier};

/// Failure raised by the storage executor.
///
/// Not caught or retried anywhere in the assemblers; it propagates
/// unchanged to the HTTP layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("warehouse query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// A value bound into a generated query.
///
/// Only scalars and arrays of scalars; identifiers never travel this way.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    Int(i64),
    TextArray(Vec<String>),
}

/// Fully-qualified, quoted table reference.
///
/// Built only from validated identifiers, so the rendered string is safe
/// to splice into query text.
#[derive(Debug, Clone)]
pub struct TableRef(String);

impl TableRef {
    pub fn new(schema: &SafeIdentifier, table: &SafeIdentifier) -> Self {
        Self(format!("\"{schema}\".\"{table}\""))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Runs a parameterized query and returns the flat result rows in order.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn run_query(&self, sql: &str, params: Vec<QueryParam>)
        -> Result<Vec<Row>, StoreError>;
}

/// sqlx-backed executor over the warehouse pool.
pub struct WarehouseClient {
    pool: PgPool,
}

impl WarehouseClient {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for WarehouseClient {
    async fn run_query(
        &self,
        sql: &str,
        params: Vec<QueryParam>,
    ) -> Result<Vec<Row>, StoreError> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = match param {
                QueryParam::Text(v) => query.bind(v),
                QueryParam::Int(v) => query.bind(v),
                QueryParam::TextArray(v) => query.bind(v),
            };
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_map).collect()
    }
}

fn row_to_map(row: PgRow) -> Result<Row, StoreError> {
    let mut map = Map::new();
    for column in row.columns() {
        map.insert(column.name().to_owned(), decode_column(&row, column)?);
    }
    Ok(map)
}

/// Decode one column of a dynamic row into a JSON value.
///
/// Timestamps become RFC 3339 strings; `json`/`jsonb` pass through.
/// Types with no mapping fall back to a text read, and to JSON null (with
/// a warning) if even that fails.
fn decode_column(row: &PgRow, column: &PgColumn) -> Result<Value, StoreError> {
    let idx = column.ordinal();
    let value = match column.type_info().name() {
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(idx)?.map(Value::String)
        }
        "INT2" => row
            .try_get::<Option<i16>, _>(idx)?
            .map(|v| Value::from(i64::from(v))),
        "INT4" => row
            .try_get::<Option<i32>, _>(idx)?
            .map(|v| Value::from(i64::from(v))),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(Value::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)?
            .and_then(|v| Number::from_f64(f64::from(v)))
            .map(Value::Number),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(idx)?
            .and_then(Number::from_f64)
            .map(Value::Number),
        "BOOL" => row.try_get::<Option<bool>, _>(idx)?.map(Value::Bool),
        "UUID" => row
            .try_get::<Option<Uuid>, _>(idx)?
            .map(|v| Value::String(v.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)?
            .map(|v| Value::String(v.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(|v| Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(idx)?
            .map(|v| Value::String(v.to_string())),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(idx)?,
        other => match row.try_get::<Option<String>, _>(idx) {
            Ok(v) => v.map(Value::String),
            Err(_) => {
                tracing::warn!(
                    column = column.name(),
                    column_type = other,
                    "no decoding for column type, returning null"
                );
                None
            }
        },
    };
    Ok(value.unwrap_or(Value::Null))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_ref_quotes_both_parts() {
        let schema = SafeIdentifier::new("analytics", "warehouse schema").unwrap();
        let table = SafeIdentifier::new("exam_result", "exam result table").unwrap();
        assert_eq!(
            TableRef::new(&schema, &table).to_string(),
            r#""analytics"."exam_result""#
        );
    }
}
