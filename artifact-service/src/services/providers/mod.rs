//! Inference provider abstractions and implementations.
//!
//! Text and image generation sit behind separate traits so the pipeline can
//! run against Bedrock in production and against in-process mocks in tests.

pub mod bedrock;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::NetworkError(_) => "network_error",
            ProviderError::MalformedResponse(_) => "malformed_response",
        }
    }
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
}

/// Sampling parameters for text models.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub stop_sequences: Vec<String>,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.1,
            top_k: 250,
            top_p: 0.2,
            stop_sequences: vec!["\n\nHuman:".to_string()],
        }
    }
}

/// Diffusion parameters for image models.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageParams {
    /// Classifier-free guidance scale.
    pub cfg_scale: f32,
    pub seed: u32,
    pub steps: u32,
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            cfg_scale: 10.0,
            seed: 0,
            steps: 50,
        }
    }
}

/// Completed text generation.
#[derive(Debug, Clone)]
pub struct TextResponse {
    /// Completion with surrounding whitespace removed. May be empty.
    pub text: String,
    pub finish_reason: FinishReason,
}

/// Completed image generation.
#[derive(Debug, Clone)]
pub struct ImageResponse {
    /// Decoded bytes of the first image the provider returned.
    pub image: Vec<u8>,
}

/// Trait for text generation providers (e.g., Claude on Bedrock).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate a completion for a fully rendered prompt.
    async fn generate(
        &self,
        prompt: &str,
        params: &TextParams,
    ) -> Result<TextResponse, ProviderError>;

    /// Model identifier, for logs and metrics.
    fn model(&self) -> &str;
}

/// Trait for image generation providers (e.g., Stable Diffusion XL on Bedrock).
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate an image from text prompts.
    async fn generate(
        &self,
        prompts: &[String],
        params: &ImageParams,
    ) -> Result<ImageResponse, ProviderError>;

    /// Model identifier, for logs and metrics.
    fn model(&self) -> &str;
}
