use axum::{extract::State, response::IntoResponse, Json};

use crate::error::AppError;
use crate::AppState;

/// Service banner at the root path.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is online")
    ),
    tag = "Health"
)]
pub async fn online() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Building management server is online"
    }))
}

/// Health check including a database ping.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are healthy"),
        (status = 500, description = "Database unreachable", body = ErrorResponse)
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    if let Some(db) = &state.db {
        db.health_check().await?;
    }
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
