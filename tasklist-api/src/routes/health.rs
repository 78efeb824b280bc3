//! Service-level endpoints: welcome document, liveness probe, and the
//! 404 fallback for unmatched routes.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::json;

use crate::{app::AppState, error::ApiError, response::ApiResponse};

/// Health probe payload.
#[derive(Debug, Serialize)]
pub struct HealthData {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database connectivity
    pub database: String,
}

/// `GET /health`: liveness probe.
///
/// Always answers 200; database trouble is reported in the payload, not
/// the status code, so orchestrators can distinguish "down" from
/// "degraded".
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthData>> {
    let database = match sqlx::query("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let status = if database == "connected" {
        "healthy"
    } else {
        "degraded"
    };

    ApiResponse::data(HealthData {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    })
}

/// `GET /`: welcome document listing the API groups.
pub async fn welcome() -> Json<ApiResponse<serde_json::Value>> {
    ApiResponse::data_with_message(
        json!({
            "auth": "/api/auth",
            "todos": "/api/todos",
            "user": "/api/user",
        }),
        "Welcome to the Tasklist API",
    )
}

/// Router fallback: unmatched routes answer with the 404 envelope.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
