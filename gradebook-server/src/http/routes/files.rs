//! Data-directory listing endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::server::AppState;

const LOADABLE_EXTENSIONS: [&str; 3] = ["csv", "ndjson", "jsonl"];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesResponse {
    pub data_dir: String,
    pub files: Vec<String>,
}

/// GET /files - list loadable files in the data directory
async fn list_files(State(state): State<Arc<AppState>>) -> Result<Json<FilesResponse>, ApiError> {
    let data_dir = state
        .warehouse
        .ensure_data_dir()
        .map_err(|e| ApiError::Internal {
            message: format!("failed to prepare data directory: {e}"),
        })?;

    let mut files = Vec::new();
    let entries = std::fs::read_dir(&data_dir).map_err(|e| ApiError::Internal {
        message: format!("failed to read data directory: {e}"),
    })?;
    for entry in entries.flatten() {
        let path = entry.path();
        let loadable = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| LOADABLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if loadable {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push(name.to_owned());
            }
        }
    }
    files.sort();

    Ok(Json(FilesResponse {
        data_dir: data_dir.display().to_string(),
        files,
    }))
}

/// File listing routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/files", get(list_files))
}
