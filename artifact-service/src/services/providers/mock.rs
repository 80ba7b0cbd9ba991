//! Mock provider implementations for local runs and testing.

use super::{
    FinishReason, ImageParams, ImageProvider, ImageResponse, ProviderError, TextParams,
    TextProvider, TextResponse,
};
use async_trait::async_trait;

/// Smallest valid PNG (1x1 transparent pixel).
pub const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// Mock text provider for testing.
///
/// The completion echoes the prompt, so whatever the pipeline persists shows
/// exactly what would have been sent to the model.
pub struct MockTextProvider {
    enabled: bool,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        _params: &TextParams,
    ) -> Result<TextResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        Ok(TextResponse {
            text: format!("Mock response for: {}", prompt),
            finish_reason: FinishReason::Complete,
        })
    }

    fn model(&self) -> &str {
        "mock-text"
    }
}

/// Mock image provider for testing.
pub struct MockImageProvider {
    enabled: bool,
}

impl MockImageProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn generate(
        &self,
        prompts: &[String],
        _params: &ImageParams,
    ) -> Result<ImageResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock image provider not enabled".to_string(),
            ));
        }

        if prompts.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "At least one text prompt is required".to_string(),
            ));
        }

        Ok(ImageResponse {
            image: PLACEHOLDER_PNG.to_vec(),
        })
    }

    fn model(&self) -> &str {
        "mock-image"
    }
}
