//! AWS Bedrock provider implementation.
//!
//! Text generation targets the Anthropic Claude text-completion schema and
//! image generation the Stability SDXL schema, both through `InvokeModel`.
//! Retries and the read timeout are delegated to the SDK client.

use super::{
    FinishReason, ImageParams, ImageProvider, ImageResponse, ProviderError, TextParams,
    TextProvider, TextResponse,
};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::SdkConfig;
use aws_sdk_bedrockruntime::error::{DisplayErrorContext, SdkError};
use aws_sdk_bedrockruntime::operation::invoke_model::InvokeModelError;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::Client;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Bedrock provider configuration.
#[derive(Debug, Clone)]
pub struct BedrockConfig {
    pub model: String,
    pub read_timeout: Duration,
    /// Total attempts, first try included.
    pub max_attempts: u32,
}

/// Build a runtime client with the provider's retry and timeout policy.
fn build_client(sdk_config: &SdkConfig, config: &BedrockConfig) -> Client {
    let client_config = aws_sdk_bedrockruntime::config::Builder::from(sdk_config)
        .retry_config(RetryConfig::standard().with_max_attempts(config.max_attempts))
        .timeout_config(
            TimeoutConfig::builder()
                .read_timeout(config.read_timeout)
                .build(),
        )
        .build();
    Client::from_conf(client_config)
}

/// Call `InvokeModel` with a JSON body and return the raw response body.
async fn invoke_model(client: &Client, model: &str, body: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
    let output = client
        .invoke_model()
        .model_id(model)
        .content_type(JSON_CONTENT_TYPE)
        .accept(JSON_CONTENT_TYPE)
        .body(Blob::new(body))
        .send()
        .await
        .map_err(map_sdk_error)?;

    Ok(output.body.into_inner())
}

fn map_sdk_error(err: SdkError<InvokeModelError>) -> ProviderError {
    let message = DisplayErrorContext(&err).to_string();

    if matches!(&err, SdkError::TimeoutError(_) | SdkError::DispatchFailure(_)) {
        return ProviderError::NetworkError(message);
    }

    match err.into_service_error() {
        InvokeModelError::ThrottlingException(_)
        | InvokeModelError::ServiceQuotaExceededException(_) => ProviderError::RateLimited,
        InvokeModelError::ValidationException(_) => ProviderError::InvalidRequest(message),
        InvokeModelError::AccessDeniedException(_)
        | InvokeModelError::ResourceNotFoundException(_) => ProviderError::NotConfigured(message),
        _ => ProviderError::ApiError(message),
    }
}

/// Bedrock text provider (Claude text-completion schema).
pub struct BedrockTextProvider {
    config: BedrockConfig,
    client: Client,
}

impl BedrockTextProvider {
    pub fn new(sdk_config: &SdkConfig, config: BedrockConfig) -> Self {
        let client = build_client(sdk_config, &config);
        Self { config, client }
    }
}

#[async_trait]
impl TextProvider for BedrockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        params: &TextParams,
    ) -> Result<TextResponse, ProviderError> {
        let body = text_request_body(prompt, params)?;

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            max_tokens = params.max_tokens,
            "Sending text request to Bedrock"
        );

        let response = invoke_model(&self.client, &self.config.model, body).await?;
        parse_text_response(&response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Bedrock image provider (Stability SDXL schema).
pub struct BedrockImageProvider {
    config: BedrockConfig,
    client: Client,
}

impl BedrockImageProvider {
    pub fn new(sdk_config: &SdkConfig, config: BedrockConfig) -> Self {
        let client = build_client(sdk_config, &config);
        Self { config, client }
    }
}

#[async_trait]
impl ImageProvider for BedrockImageProvider {
    async fn generate(
        &self,
        prompts: &[String],
        params: &ImageParams,
    ) -> Result<ImageResponse, ProviderError> {
        let body = image_request_body(prompts, params)?;

        tracing::debug!(
            model = %self.config.model,
            prompt_count = prompts.len(),
            steps = params.steps,
            "Sending image request to Bedrock"
        );

        let response = invoke_model(&self.client, &self.config.model, body).await?;
        parse_image_response(&response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Serialize a Claude text-completion request.
pub fn text_request_body(prompt: &str, params: &TextParams) -> Result<Vec<u8>, ProviderError> {
    let request = ClaudeTextRequest {
        prompt,
        max_tokens_to_sample: params.max_tokens,
        temperature: params.temperature,
        top_k: params.top_k,
        top_p: params.top_p,
        stop_sequences: &params.stop_sequences,
    };

    serde_json::to_vec(&request).map_err(|e| ProviderError::InvalidRequest(e.to_string()))
}

/// Extract the trimmed completion from a Claude response body.
pub fn parse_text_response(body: &[u8]) -> Result<TextResponse, ProviderError> {
    let response: ClaudeTextResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

    let finish_reason = match response.stop_reason.as_deref() {
        Some("max_tokens") => FinishReason::Length,
        _ => FinishReason::Complete,
    };

    Ok(TextResponse {
        text: response.completion.trim().to_string(),
        finish_reason,
    })
}

/// Serialize an SDXL text-to-image request.
pub fn image_request_body(prompts: &[String], params: &ImageParams) -> Result<Vec<u8>, ProviderError> {
    if prompts.is_empty() {
        return Err(ProviderError::InvalidRequest(
            "At least one text prompt is required".to_string(),
        ));
    }

    let request = SdxlRequest {
        text_prompts: prompts
            .iter()
            .map(|text| TextPrompt { text })
            .collect(),
        cfg_scale: params.cfg_scale,
        seed: params.seed,
        steps: params.steps,
    };

    serde_json::to_vec(&request).map_err(|e| ProviderError::InvalidRequest(e.to_string()))
}

/// Decode the first base64 artifact in an SDXL response body.
pub fn parse_image_response(body: &[u8]) -> Result<ImageResponse, ProviderError> {
    let response: SdxlResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

    let first = response
        .artifacts
        .first()
        .ok_or_else(|| ProviderError::ApiError("Response contained no artifacts".to_string()))?;

    match first.finish_reason.as_deref() {
        Some("CONTENT_FILTERED") => return Err(ProviderError::ContentFiltered),
        Some("ERROR") => {
            return Err(ProviderError::ApiError(
                "Model reported an error for the first artifact".to_string(),
            ))
        }
        _ => {}
    }

    let image = base64::engine::general_purpose::STANDARD
        .decode(first.base64.trim())
        .map_err(|e| ProviderError::MalformedResponse(format!("Invalid base64 artifact: {}", e)))?;

    Ok(ImageResponse { image })
}

// ============================================================================
// Bedrock model Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ClaudeTextRequest<'a> {
    prompt: &'a str,
    max_tokens_to_sample: u32,
    temperature: f32,
    top_k: u32,
    top_p: f32,
    stop_sequences: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ClaudeTextResponse {
    completion: String,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct SdxlRequest<'a> {
    text_prompts: Vec<TextPrompt<'a>>,
    cfg_scale: f32,
    seed: u32,
    steps: u32,
}

#[derive(Debug, Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SdxlResponse {
    #[serde(default)]
    artifacts: Vec<SdxlArtifact>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SdxlArtifact {
    base64: String,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_text_request_body_shape() {
        let params = TextParams::default();
        let body = text_request_body("Human: hi.\nAssistant:", &params).unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(value["prompt"], "Human: hi.\nAssistant:");
        assert_eq!(value["max_tokens_to_sample"], 2048);
        assert_eq!(value["top_k"], 250);
        assert_eq!(value["stop_sequences"], json!(["\n\nHuman:"]));
        assert!((value["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert!((value["top_p"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_parse_text_response_trims_completion() {
        let body = br#"{"completion": "  def reverse(s):\n    return s[::-1]\n\n", "stop_reason": "stop_sequence"}"#;
        let response = parse_text_response(body).unwrap();
        assert_eq!(response.text, "def reverse(s):\n    return s[::-1]");
        assert_eq!(response.finish_reason, FinishReason::Complete);
    }

    #[test]
    fn test_parse_text_response_length_limit() {
        let body = br#"{"completion": "partial", "stop_reason": "max_tokens"}"#;
        let response = parse_text_response(body).unwrap();
        assert_eq!(response.finish_reason, FinishReason::Length);
    }

    #[test]
    fn test_parse_text_response_missing_completion() {
        let err = parse_text_response(br#"{"message": "throttled"}"#).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[test]
    fn test_image_request_body_shape() {
        let body = image_request_body(&["a red fox".to_string()], &ImageParams::default()).unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(value["text_prompts"], json!([{"text": "a red fox"}]));
        assert_eq!(value["cfg_scale"], 10.0);
        assert_eq!(value["seed"], 0);
        assert_eq!(value["steps"], 50);
    }

    #[test]
    fn test_image_request_requires_prompt() {
        let err = image_request_body(&[], &ImageParams::default()).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
    }

    #[test]
    fn test_parse_image_response_decodes_artifacts() {
        let body = br#"{"result": "success", "artifacts": [{"seed": 0, "base64": "iVBORw0KGgo=", "finishReason": "SUCCESS"}]}"#;
        let response = parse_image_response(body).unwrap();
        assert_eq!(response.image, vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }

    #[test]
    fn test_parse_image_response_ignores_later_artifacts() {
        let body = br#"{"artifacts": [
            {"base64": "iVBORw0KGgo=", "finishReason": "SUCCESS"},
            {"base64": "%%% not base64 %%%", "finishReason": "SUCCESS"}
        ]}"#;
        let response = parse_image_response(body).unwrap();
        assert!(response.image.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_parse_image_response_malformed_first_artifact() {
        let body = br#"{"artifacts": [{"base64": "%%%", "finishReason": "SUCCESS"}]}"#;
        let err = parse_image_response(body).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_image_response_without_artifacts() {
        let err = parse_image_response(br#"{"artifacts": []}"#).unwrap_err();
        assert!(matches!(err, ProviderError::ApiError(_)));
    }

    #[test]
    fn test_parse_image_response_content_filtered() {
        let body = br#"{"artifacts": [{"base64": "", "finishReason": "CONTENT_FILTERED"}]}"#;
        let err = parse_image_response(body).unwrap_err();
        assert!(matches!(err, ProviderError::ContentFiltered));
    }
}
