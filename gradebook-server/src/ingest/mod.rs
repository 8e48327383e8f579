//! Bulk file ingestion into warehouse tables.
//!
//! Files are read from the configured data directory, parsed into a
//! column list plus text records, and streamed into the destination table
//! with `COPY ... FROM STDIN` inside a single transaction, so a failed
//! load leaves the table untouched. Column names come from file content, so
//! they pass the same identifier validation as configured columns before
//! reaching SQL.
//!
//! This is the only path that writes to the warehouse; the read
//! endpoints never do.

pub mod csv;
pub mod ndjson;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use gradebook_core::{ConfigError, SafeIdentifier, WarehouseSection};

use crate::db::executor::TableRef;

/// How to write into the destination table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteDisposition {
    /// Keep existing rows.
    #[serde(alias = "WRITE_APPEND")]
    Append,
    /// Delete existing rows first.
    #[default]
    #[serde(alias = "WRITE_TRUNCATE")]
    Truncate,
    /// Fail if the table already holds rows.
    #[serde(alias = "WRITE_EMPTY")]
    Empty,
}

impl WriteDisposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Truncate => "truncate",
            Self::Empty => "empty",
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file not found: {path:?}")]
    FileNotFound { path: PathBuf },

    #[error("unsupported file format: {name} (expected .csv, .ndjson, or .jsonl)")]
    UnsupportedFormat { name: String },

    #[error("invalid {kind} file {path:?}: {reason}")]
    InvalidFormat {
        path: PathBuf,
        kind: &'static str,
        reason: String,
    },

    /// A table name or file-supplied column name failed validation.
    #[error(transparent)]
    Identifier(#[from] ConfigError),

    #[error("destination table '{table}' is not empty")]
    NotEmpty { table: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("JSON parse error at line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("warehouse load failed: {0}")]
    Store(#[from] sqlx::Error),
}

/// Parsed file content: validated column names plus text records.
/// `None` fields become SQL NULLs.
#[derive(Debug)]
pub(crate) struct Records {
    pub columns: Vec<SafeIdentifier>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Records {
    /// Render rows in COPY text format: tab-delimited fields, `\N` for
    /// NULL, backslash escapes for the delimiter characters.
    fn copy_payload(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let mut first = true;
            for field in row {
                if !first {
                    out.push('\t');
                }
                first = false;
                match field {
                    Some(value) => out.push_str(&escape_copy_field(value)),
                    None => out.push_str("\\N"),
                }
            }
            out.push('\n');
        }
        out
    }
}

fn escape_copy_field(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\t', "\\t")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Outcome of a completed load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub table: String,
    pub rows_written: u64,
    pub write_disposition: &'static str,
}

/// Loads parsed files into warehouse tables.
///
/// Holds its own pool handle; ingestion bypasses the read-path executor
/// on purpose, since it is the one writer in the system.
pub struct Loader {
    pool: PgPool,
    schema: SafeIdentifier,
}

impl Loader {
    pub fn new(pool: PgPool, warehouse: &WarehouseSection) -> Result<Self, ConfigError> {
        Ok(Self {
            pool,
            schema: SafeIdentifier::new(&warehouse.schema, "warehouse schema")?,
        })
    }

    /// Load one CSV or NDJSON file into `table`.
    ///
    /// The whole load is one transaction (disposition handling, COPY,
    /// commit); any failure rolls back.
    pub async fn load_file(
        &self,
        path: &Path,
        table: &str,
        disposition: WriteDisposition,
    ) -> Result<LoadSummary, IngestError> {
        if !path.exists() {
            return Err(IngestError::FileNotFound {
                path: path.to_owned(),
            });
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let records = match extension.as_deref() {
            Some("csv") => csv::read_records(path)?,
            Some("ndjson") | Some("jsonl") => ndjson::read_records(path)?,
            _ => {
                return Err(IngestError::UnsupportedFormat {
                    name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                })
            }
        };
        if records.columns.is_empty() {
            return Err(IngestError::InvalidFormat {
                path: path.to_owned(),
                kind: "data",
                reason: "no column names found".to_owned(),
            });
        }

        let table_ident = SafeIdentifier::new(table, "destination table")?;
        let table_ref = TableRef::new(&self.schema, &table_ident);

        let mut tx = self.pool.begin().await?;
        match disposition {
            WriteDisposition::Truncate => {
                sqlx::query(&format!("DELETE FROM {table_ref}"))
                    .execute(&mut *tx)
                    .await?;
            }
            WriteDisposition::Empty => {
                let (count,): (i64,) =
                    sqlx::query_as(&format!("SELECT COUNT(*) FROM {table_ref}"))
                        .fetch_one(&mut *tx)
                        .await?;
                if count > 0 {
                    return Err(IngestError::NotEmpty {
                        table: table_ident.to_string(),
                    });
                }
            }
            WriteDisposition::Append => {}
        }

        let column_list = records
            .columns
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let copy_sql = format!("COPY {table_ref} ({column_list}) FROM STDIN");

        let mut copy_in = (&mut *tx).copy_in_raw(&copy_sql).await?;
        copy_in.send(records.copy_payload().as_bytes()).await?;
        let rows_written = copy_in.finish().await?;
        tx.commit().await?;

        tracing::info!(
            table = %table_ident,
            rows_written,
            disposition = disposition.as_str(),
            "bulk load completed"
        );
        Ok(LoadSummary {
            table: table_ident.to_string(),
            rows_written,
            write_disposition: disposition.as_str(),
        })
    }
}
