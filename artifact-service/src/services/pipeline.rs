//! The generate-then-persist request flow.
//!
//! Every handler runs the same four stages in order: decode the request,
//! invoke the model, persist the artifact, build the response envelope. Each
//! stage returns a [`Fault`] instead of swallowing errors; [`respond`] is the
//! single place where faults are turned into status codes.

use crate::models::{storage_key, Artifact, ArtifactKind, HandlerResponse, ProxyEvent};
use crate::services::decoder::{self, DecodeError};
use crate::services::metrics;
use crate::services::prompts;
use crate::services::providers::{
    FinishReason, ImageParams, ImageProvider, ProviderError, TextParams, TextProvider,
};
use crate::startup::AppState;
use axum::http::StatusCode;
use chrono::Utc;
use service_core::error::AppError;
use std::future::Future;
use std::time::Instant;
use thiserror::Error;

pub const INVALID_REQUEST_MESSAGE: &str = "Invalid request";
pub const EXTRACTION_FAILED_MESSAGE: &str = "Failed to extract content";
pub const IMAGE_FAILED_MESSAGE: &str = "Image generation failed";

/// Why a pipeline run did not end with a stored artifact.
#[derive(Error, Debug)]
pub enum Fault {
    #[error("Decode fault: {0}")]
    Decode(#[from] DecodeError),

    #[error("No text/plain content found in message")]
    NoContent,

    #[error("Inference fault: {0}")]
    Inference(#[from] ProviderError),

    #[error("Inference produced no artifact")]
    EmptyArtifact,

    #[error("Persist fault: {0}")]
    Persist(AppError),
}

/// Result of one pipeline run: the storage key on success.
pub type Outcome = Result<String, Fault>;

/// Map a pipeline outcome to the caller-facing envelope.
///
/// - decode faults end the request with 400; the summary handler reports
///   them (and a message without plain text) as "Failed to extract content";
/// - inference faults and empty artifacts are reported as 502 for images and
///   hidden behind the success message for code and summaries;
/// - persist faults are always hidden behind the success message.
pub fn respond(kind: ArtifactKind, outcome: &Outcome) -> HandlerResponse {
    match (kind, outcome) {
        (ArtifactKind::Summary, Err(Fault::Decode(_) | Fault::NoContent)) => {
            HandlerResponse::message(StatusCode::BAD_REQUEST, EXTRACTION_FAILED_MESSAGE)
        }
        (_, Err(Fault::Decode(_) | Fault::NoContent)) => {
            HandlerResponse::message(StatusCode::BAD_REQUEST, INVALID_REQUEST_MESSAGE)
        }
        (ArtifactKind::Image, Err(Fault::Inference(_) | Fault::EmptyArtifact)) => {
            HandlerResponse::message(StatusCode::BAD_GATEWAY, IMAGE_FAILED_MESSAGE)
        }
        (_, Ok(_))
        | (_, Err(Fault::Inference(_) | Fault::EmptyArtifact | Fault::Persist(_))) => {
            HandlerResponse::message(StatusCode::OK, kind.completion_message())
        }
    }
}

/// Run the pipeline for `kind` over a raw request body.
pub async fn generate(state: &AppState, kind: ArtifactKind, body: &str) -> HandlerResponse {
    match kind {
        ArtifactKind::Code => run(kind, code_pipeline(state, body)).await,
        ArtifactKind::Image => run(kind, image_pipeline(state, body)).await,
        ArtifactKind::Summary => run(kind, summary_pipeline(state, body)).await,
    }
}

/// Run the pipeline for an API-Gateway-proxy-shaped event.
///
/// Summary bodies are always base64; code and image bodies are decoded first
/// only when the event says so.
pub async fn handle_event(state: &AppState, kind: ArtifactKind, event: ProxyEvent) -> HandlerResponse {
    match event_body(kind, event) {
        Ok(body) => generate(state, kind, &body).await,
        Err(e) => run(kind, async { Err(Fault::Decode(e)) }).await,
    }
}

fn event_body(kind: ArtifactKind, event: ProxyEvent) -> Result<String, DecodeError> {
    let body = event.body.ok_or(DecodeError::MissingBody)?;
    if event.is_base64_encoded && kind != ArtifactKind::Summary {
        let raw = decoder::decode_base64(&body)?;
        return Ok(String::from_utf8(raw)?);
    }
    Ok(body)
}

async fn run<F>(kind: ArtifactKind, pipeline: F) -> HandlerResponse
where
    F: Future<Output = Outcome>,
{
    let start = Instant::now();
    let outcome = pipeline.await;

    match &outcome {
        Ok(key) => tracing::info!(kind = %kind, key = %key, "Artifact stored"),
        Err(fault) => log_fault(kind, fault),
    }

    let response = respond(kind, &outcome);
    metrics::record_request(
        kind.as_str(),
        response.status_code,
        start.elapsed().as_secs_f64(),
    );
    response
}

fn log_fault(kind: ArtifactKind, fault: &Fault) {
    match fault {
        Fault::Decode(e) => tracing::warn!(kind = %kind, error = %e, "Rejected malformed request"),
        Fault::NoContent => tracing::warn!(kind = %kind, "Request carried no plain-text content"),
        Fault::Inference(e) => tracing::error!(kind = %kind, error = %e, "Error generating the artifact"),
        Fault::EmptyArtifact => tracing::warn!(kind = %kind, "No artifact was generated"),
        Fault::Persist(e) => tracing::error!(kind = %kind, error = %e, "Error saving the artifact"),
    }
}

async fn code_pipeline(state: &AppState, body: &str) -> Outcome {
    let request = decoder::decode_code_request(body)?;
    tracing::info!(
        language = %request.language,
        message_len = request.message.len(),
        "Code generation requested"
    );

    let prompt = prompts::code_prompt(&request.language, &request.message);
    let code = invoke_text(
        state.text_provider.as_ref(),
        &prompt,
        &state.config.sampling.code,
    )
    .await?;

    persist(state, ArtifactKind::Code, code).await
}

async fn image_pipeline(state: &AppState, body: &str) -> Outcome {
    let request = decoder::decode_image_request(body)?;
    tracing::info!(message_len = request.message.len(), "Image generation requested");

    let prompts = prompts::image_prompts(&request.message);
    let image = invoke_image(
        state.image_provider.as_ref(),
        &prompts,
        &state.config.sampling.image,
    )
    .await?;

    persist(state, ArtifactKind::Image, image).await
}

async fn summary_pipeline(state: &AppState, body: &str) -> Outcome {
    let content = decoder::decode_summary_body(body)?.ok_or(Fault::NoContent)?;
    tracing::info!(content_len = content.len(), "Summary requested");

    let prompt = prompts::summary_prompt(&state.config.prompts.summary_instruction, &content);
    let summary = invoke_text(
        state.text_provider.as_ref(),
        &prompt,
        &state.config.sampling.summary,
    )
    .await?;

    persist(state, ArtifactKind::Summary, summary).await
}

async fn invoke_text(
    provider: &dyn TextProvider,
    prompt: &str,
    params: &TextParams,
) -> Result<Vec<u8>, Fault> {
    let start = Instant::now();
    let result = provider.generate(prompt, params).await;
    metrics::record_inference_latency(provider.model(), start.elapsed().as_secs_f64());

    let response = result.map_err(|e| {
        metrics::record_inference_error(provider.model(), e.kind());
        e
    })?;

    if response.finish_reason == FinishReason::Length {
        tracing::warn!(
            model = %provider.model(),
            max_tokens = params.max_tokens,
            "Completion hit the token limit"
        );
    }

    if response.text.is_empty() {
        return Err(Fault::EmptyArtifact);
    }

    Ok(response.text.into_bytes())
}

async fn invoke_image(
    provider: &dyn ImageProvider,
    prompts: &[String],
    params: &ImageParams,
) -> Result<Vec<u8>, Fault> {
    let start = Instant::now();
    let result = provider.generate(prompts, params).await;
    metrics::record_inference_latency(provider.model(), start.elapsed().as_secs_f64());

    let response = result.map_err(|e| {
        metrics::record_inference_error(provider.model(), e.kind());
        e
    })?;

    if response.image.is_empty() {
        return Err(Fault::EmptyArtifact);
    }

    Ok(response.image)
}

async fn persist(state: &AppState, kind: ArtifactKind, data: Vec<u8>) -> Outcome {
    let key = storage_key(kind, Utc::now(), &state.config.keys);
    let artifact = Artifact::new(kind, key, data);
    let size = artifact.len();
    let content_type = artifact.content_type();

    let result = state
        .storage
        .upload(&artifact.key, artifact.data, content_type)
        .await;
    metrics::record_storage_write(kind.as_str(), result.is_ok());
    result.map_err(Fault::Persist)?;

    tracing::info!(
        kind = %kind,
        location = %state.storage.location(),
        key = %artifact.key,
        size,
        "Artifact saved"
    );

    Ok(artifact.key)
}
