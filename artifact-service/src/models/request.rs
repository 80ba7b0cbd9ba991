//! Decoded request payloads.

use serde::Deserialize;
use validator::Validate;

/// Code generation request: `{"message": ..., "key": <language>}`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CodeRequest {
    #[validate(length(min = 1, message = "message cannot be empty"))]
    pub message: String,

    /// Target language, sent by callers under `key`.
    #[serde(rename = "key")]
    #[validate(length(min = 1, message = "key (target language) cannot be empty"))]
    pub language: String,
}

/// Image generation request: `{"message": ...}`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ImageRequest {
    #[validate(length(min = 1, message = "message cannot be empty"))]
    pub message: String,
}
