//! Test question endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::http::casing::camel_case_keys;
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// GET /v1/tests/{test_id}/questions
async fn test_questions(
    State(state): State<Arc<AppState>>,
    Path(test_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let questions = state.questions.questions_with_answers(&test_id).await?;

    if questions.is_empty() {
        return Err(ApiError::NotFound {
            resource: "questions for test",
            id: test_id,
        });
    }

    let payload = json!({
        "test_id": test_id,
        "questions": questions,
    });
    Ok(Json(camel_case_keys(payload)))
}

/// Question routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/v1/tests/{test_id}/questions", get(test_questions))
}
