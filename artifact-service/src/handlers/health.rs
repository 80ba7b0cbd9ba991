use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "artifact-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Ready once the artifact store answers.
pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.storage.health_check().await.map_err(|e| {
        tracing::warn!(location = %state.storage.location(), error = %e, "Storage not ready");
        AppError::ServiceUnavailable
    })?;
    Ok(StatusCode::OK)
}
