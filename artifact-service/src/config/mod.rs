use crate::services::providers::{ImageParams, TextParams};
use chrono::format::{Item, StrftimeItems};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Region the Bedrock and S3 clients are pinned to.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Bucket every artifact kind is written to.
pub const DEFAULT_BUCKET: &str = "bedrock-projects-bucket";

/// Bedrock model used for code generation and summaries.
pub const DEFAULT_TEXT_MODEL: &str = "anthropic.claude-v2";

/// Bedrock model used for image generation.
pub const DEFAULT_IMAGE_MODEL: &str = "stability.stable-diffusion-xl-v1";

/// Upper bound on waiting for a complete inference response.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_TEXT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_IMAGE_MAX_ATTEMPTS: u32 = 5;

pub const DEFAULT_SUMMARY_INSTRUCTION: &str =
    "Summarize the main points made in the following document";

#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    pub common: core_config::Config,
    pub aws: AwsConfig,
    pub storage: StorageConfig,
    pub inference: InferenceConfig,
    pub prompts: PromptConfig,
    pub sampling: SamplingConfig,
    pub keys: KeyFormats,
}

#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Target bucket for the S3 backend.
    pub bucket: String,
    /// Root directory for the local backend.
    pub local_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub backend: InferenceBackend,
    pub text_model: String,
    pub image_model: String,
    pub read_timeout_secs: u64,
    /// Total attempts (first try included) the SDK makes for text models.
    pub text_max_attempts: u32,
    /// Total attempts (first try included) the SDK makes for the image model.
    pub image_max_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceBackend {
    Bedrock,
    /// In-process providers that never leave the host. Used for local runs and tests.
    Mock,
}

#[derive(Debug, Clone)]
pub struct PromptConfig {
    /// Task line placed in front of the extracted email text.
    pub summary_instruction: String,
}

/// Sampling parameters per artifact kind. Not user-configurable.
#[derive(Debug, Clone)]
pub struct SamplingConfig {
    pub code: TextParams,
    pub summary: TextParams,
    pub image: ImageParams,
}

/// `chrono` format strings for the timestamp part of storage keys.
///
/// The code format has second resolution within a single day only, so two
/// code artifacts written in the same second, or at the same wall-clock time
/// on different days, share a key and the later write replaces the earlier.
#[derive(Debug, Clone)]
pub struct KeyFormats {
    pub code: String,
    pub image: String,
    pub summary: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            bucket: DEFAULT_BUCKET.to_string(),
            local_path: "storage".to_string(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            backend: InferenceBackend::Bedrock,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            text_max_attempts: DEFAULT_TEXT_MAX_ATTEMPTS,
            image_max_attempts: DEFAULT_IMAGE_MAX_ATTEMPTS,
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            summary_instruction: DEFAULT_SUMMARY_INSTRUCTION.to_string(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            code: TextParams {
                max_tokens: 2048,
                ..TextParams::default()
            },
            summary: TextParams {
                max_tokens: 5000,
                ..TextParams::default()
            },
            image: ImageParams::default(),
        }
    }
}

impl Default for KeyFormats {
    fn default() -> Self {
        Self {
            code: "%H%M%S".to_string(),
            image: "%Y%m%d_%H%M%S".to_string(),
            summary: "%Y%m%d_%H%M%S".to_string(),
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            aws: AwsConfig::default(),
            storage: StorageConfig::default(),
            inference: InferenceConfig::default(),
            prompts: PromptConfig::default(),
            sampling: SamplingConfig::default(),
            keys: KeyFormats::default(),
        }
    }
}

impl KeyFormats {
    /// Reject format strings `chrono` cannot render.
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, format) in [
            ("KEY_FORMAT_CODE", &self.code),
            ("KEY_FORMAT_IMAGE", &self.image),
            ("KEY_FORMAT_SUMMARY", &self.summary),
        ] {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is not a valid timestamp format: {}",
                    name,
                    format
                )));
            }
        }
        Ok(())
    }
}

impl InferenceConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl ArtifactConfig {
    /// Load configuration from the environment on top of the documented defaults.
    ///
    /// In production (`ENVIRONMENT=prod`) the deployment-specific values
    /// (`AWS_REGION`, `ARTIFACT_BUCKET`) must be set explicitly.
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";
        let defaults = ArtifactConfig::default();

        let keys = KeyFormats {
            code: parse_env("KEY_FORMAT_CODE", defaults.keys.code)?,
            image: parse_env("KEY_FORMAT_IMAGE", defaults.keys.image)?,
            summary: parse_env("KEY_FORMAT_SUMMARY", defaults.keys.summary)?,
        };
        keys.validate()?;

        Ok(ArtifactConfig {
            common: common_config,
            aws: AwsConfig {
                region: get_env("AWS_REGION", Some(DEFAULT_REGION), is_prod)?,
            },
            storage: StorageConfig {
                backend: parse_env("STORAGE_BACKEND", defaults.storage.backend)?,
                bucket: get_env("ARTIFACT_BUCKET", Some(DEFAULT_BUCKET), is_prod)?,
                local_path: parse_env("STORAGE_LOCAL_PATH", defaults.storage.local_path)?,
            },
            inference: InferenceConfig {
                backend: parse_env("INFERENCE_BACKEND", defaults.inference.backend)?,
                text_model: parse_env("TEXT_MODEL_ID", defaults.inference.text_model)?,
                image_model: parse_env("IMAGE_MODEL_ID", defaults.inference.image_model)?,
                read_timeout_secs: parse_env(
                    "INFERENCE_READ_TIMEOUT_SECS",
                    defaults.inference.read_timeout_secs,
                )?,
                text_max_attempts: parse_env(
                    "TEXT_MAX_ATTEMPTS",
                    defaults.inference.text_max_attempts,
                )?,
                image_max_attempts: parse_env(
                    "IMAGE_MAX_ATTEMPTS",
                    defaults.inference.image_max_attempts,
                )?,
            },
            prompts: PromptConfig {
                summary_instruction: parse_env(
                    "SUMMARY_INSTRUCTION",
                    defaults.prompts.summary_instruction,
                )?,
            },
            sampling: defaults.sampling,
            keys,
        })
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "s3" => Ok(StorageBackend::S3),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

impl FromStr for InferenceBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bedrock" => Ok(InferenceBackend::Bedrock),
            "mock" => Ok(InferenceBackend::Mock),
            _ => Err(format!("Invalid inference backend: {}", s)),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}
