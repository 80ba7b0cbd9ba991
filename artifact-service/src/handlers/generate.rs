use crate::models::{ArtifactKind, HandlerResponse, ProxyEvent};
use crate::services::pipeline;
use crate::startup::AppState;
use axum::extract::{Path, State};
use axum::Json;

/// `POST /code` with a `{"message": ..., "key": <language>}` body.
pub async fn generate_code(State(state): State<AppState>, body: String) -> HandlerResponse {
    pipeline::generate(&state, ArtifactKind::Code, &body).await
}

/// `POST /image` with a `{"message": ...}` body.
pub async fn generate_image(State(state): State<AppState>, body: String) -> HandlerResponse {
    pipeline::generate(&state, ArtifactKind::Image, &body).await
}

/// `POST /summary` with a base64-encoded MIME email as the body.
pub async fn generate_summary(State(state): State<AppState>, body: String) -> HandlerResponse {
    pipeline::generate(&state, ArtifactKind::Summary, &body).await
}

/// `POST /invoke/:kind` with a proxy-integration event.
///
/// The transport status is always 200; the outcome is carried in the
/// envelope's `statusCode`.
pub async fn invoke(
    State(state): State<AppState>,
    Path(kind): Path<ArtifactKind>,
    Json(event): Json<ProxyEvent>,
) -> Json<HandlerResponse> {
    Json(pipeline::handle_event(&state, kind, event).await)
}
