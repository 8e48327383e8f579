//! Bulk upload endpoint.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::casing::camel_case_keys;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::ingest::WriteDisposition;

/// Upload request body. `table` falls back to the configured default
/// destination; `write_disposition` defaults to truncate.
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    /// File name located in the data directory.
    pub file_name: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub write_disposition: WriteDisposition,
}

/// POST /upload - load a data-directory file into a warehouse table
async fn upload(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<Value>, ApiError> {
    // the file must be a direct child of the data directory
    let name = FsPath::new(&req.file_name);
    if req.file_name.is_empty()
        || name.components().count() != 1
        || name.is_absolute()
    {
        return Err(ApiError::BadRequest {
            message: "file_name must name a file in the data directory".to_owned(),
        });
    }

    let table = req
        .table
        .or_else(|| state.warehouse.default_table.clone())
        .ok_or_else(|| ApiError::BadRequest {
            message: "provide table in the request or set WAREHOUSE_TABLE".to_owned(),
        })?;

    let data_dir = state
        .warehouse
        .ensure_data_dir()
        .map_err(|e| ApiError::Internal {
            message: format!("failed to prepare data directory: {e}"),
        })?;
    let path = data_dir.join(&req.file_name);

    let summary = state
        .loader
        .load_file(&path, &table, req.write_disposition)
        .await?;

    let payload = json!({
        "message": "upload completed",
        "table": summary.table,
        "rows_written": summary.rows_written,
        "write_disposition": summary.write_disposition,
    });
    Ok(Json(camel_case_keys(payload)))
}

/// Upload routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/upload", post(upload))
}
