//! Course endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::http::casing::camel_case_keys;
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// GET /v1/courses/{course_id}
async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let course = state
        .courses
        .course(&course_id)
        .await?
        .ok_or(ApiError::NotFound {
            resource: "course",
            id: course_id,
        })?;

    Ok(Json(camel_case_keys(Value::Object(course))))
}

/// Course routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/v1/courses/{course_id}", get(get_course))
}
