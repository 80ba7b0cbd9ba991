//! Application startup and lifecycle management.

use crate::config::{ArtifactConfig, InferenceBackend, StorageBackend};
use crate::handlers;
use crate::services::providers::bedrock::{
    BedrockConfig, BedrockImageProvider, BedrockTextProvider,
};
use crate::services::providers::mock::{MockImageProvider, MockTextProvider};
use crate::services::providers::{ImageProvider, TextProvider};
use crate::services::{init_metrics, LocalStorage, S3Storage, Storage};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use axum::{
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::request_id_middleware;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
///
/// Clients are built once at startup and reused across requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArtifactConfig>,
    pub text_provider: Arc<dyn TextProvider>,
    pub image_provider: Arc<dyn ImageProvider>,
    pub storage: Arc<dyn Storage>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .route("/code", post(handlers::generate_code))
        .route("/image", post(handlers::generate_image))
        .route("/summary", post(handlers::generate_summary))
        .route("/invoke/:kind", post(handlers::invoke))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: ArtifactConfig) -> Result<Self, AppError> {
        init_metrics();
        config.keys.validate()?;

        let needs_aws = config.inference.backend == InferenceBackend::Bedrock
            || config.storage.backend == StorageBackend::S3;
        let sdk_config = if needs_aws {
            Some(load_aws_config(&config.aws.region).await)
        } else {
            None
        };

        let (text_provider, image_provider) = build_providers(&config, sdk_config.as_ref())?;
        let storage = build_storage(&config, sdk_config.as_ref()).await?;

        tracing::info!(
            inference = ?config.inference.backend,
            text_model = %text_provider.model(),
            image_model = %image_provider.model(),
            storage = %storage.location(),
            "Initialized artifact pipeline"
        );

        let state = AppState {
            config: Arc::new(config.clone()),
            text_provider,
            image_provider,
            storage,
        };

        let app = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn load_aws_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

type Providers = (Arc<dyn TextProvider>, Arc<dyn ImageProvider>);

fn build_providers(
    config: &ArtifactConfig,
    sdk_config: Option<&SdkConfig>,
) -> Result<Providers, AppError> {
    match (config.inference.backend, sdk_config) {
        (InferenceBackend::Mock, _) => {
            tracing::warn!("Using mock inference providers");
            Ok((
                Arc::new(MockTextProvider::new(true)),
                Arc::new(MockImageProvider::new(true)),
            ))
        }
        (InferenceBackend::Bedrock, Some(sdk_config)) => {
            let inference = &config.inference;
            let text = BedrockTextProvider::new(
                sdk_config,
                BedrockConfig {
                    model: inference.text_model.clone(),
                    read_timeout: inference.read_timeout(),
                    max_attempts: inference.text_max_attempts,
                },
            );
            let image = BedrockImageProvider::new(
                sdk_config,
                BedrockConfig {
                    model: inference.image_model.clone(),
                    read_timeout: inference.read_timeout(),
                    max_attempts: inference.image_max_attempts,
                },
            );
            Ok((Arc::new(text), Arc::new(image)))
        }
        (InferenceBackend::Bedrock, None) => Err(AppError::ConfigError(anyhow::anyhow!(
            "Bedrock inference requires AWS configuration"
        ))),
    }
}

async fn build_storage(
    config: &ArtifactConfig,
    sdk_config: Option<&SdkConfig>,
) -> Result<Arc<dyn Storage>, AppError> {
    match (config.storage.backend, sdk_config) {
        (StorageBackend::Local, _) => {
            let storage = LocalStorage::new(&config.storage.local_path)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to initialize local storage at {}: {}",
                        config.storage.local_path,
                        e
                    );
                    e
                })?;
            Ok(Arc::new(storage))
        }
        (StorageBackend::S3, Some(sdk_config)) => {
            let client = aws_sdk_s3::Client::new(sdk_config);
            Ok(Arc::new(S3Storage::new(
                client,
                config.storage.bucket.clone(),
            )))
        }
        (StorageBackend::S3, None) => Err(AppError::ConfigError(anyhow::anyhow!(
            "S3 storage requires AWS configuration"
        ))),
    }
}
