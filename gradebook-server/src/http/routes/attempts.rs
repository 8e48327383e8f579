//! Exam attempt endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::casing::camel_case_keys;
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Attempts requested when the caller names no limit. The repository
/// clamps whatever arrives to its own guardrail range.
const DEFAULT_ATTEMPT_LIMIT: i64 = 2;

/// Query parameters for the attempts endpoint. A non-numeric `limit` is
/// rejected by extraction with a 400 before the handler runs; an
/// out-of-range numeric one is clamped downstream, not rejected.
#[derive(Debug, Deserialize)]
pub struct AttemptsQuery {
    pub limit: Option<i64>,
}

/// GET /v1/test-results/students/{student_id}/tests/{test_id}
async fn student_attempts(
    State(state): State<Arc<AppState>>,
    Path((student_id, test_id)): Path<(String, String)>,
    Query(params): Query<AttemptsQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_ATTEMPT_LIMIT);
    let attempts = state
        .attempts
        .latest_attempts(&student_id, &test_id, limit)
        .await?;

    if attempts.is_empty() {
        return Err(ApiError::NotFound {
            resource: "exam attempts",
            id: format!("{student_id}/{test_id}"),
        });
    }

    let payload = json!({
        "student_id": student_id,
        "test_id": test_id,
        "attempts": attempts,
    });
    Ok(Json(camel_case_keys(payload)))
}

/// Attempt routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/v1/test-results/students/{student_id}/tests/{test_id}",
        get(student_attempts),
    )
}
