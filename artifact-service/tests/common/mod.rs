#![allow(dead_code)]

use artifact_service::config::{ArtifactConfig, InferenceBackend, StorageBackend};
use artifact_service::services::providers::mock::{MockImageProvider, MockTextProvider};
use artifact_service::services::{LocalStorage, Storage};
use artifact_service::startup::{AppState, Application};
use std::sync::Arc;
use uuid::Uuid;

/// Mock inference, local storage under `target/`, random port.
pub fn test_config() -> ArtifactConfig {
    let mut config = ArtifactConfig::default();
    config.common.port = 0;
    config.inference.backend = InferenceBackend::Mock;
    config.storage.backend = StorageBackend::Local;
    config.storage.local_path = format!("target/test-storage-{}", Uuid::new_v4());
    config
}

pub struct TestState {
    pub state: AppState,
    pub storage_path: String,
}

impl TestState {
    pub async fn new(text_enabled: bool, image_enabled: bool) -> Self {
        let config = test_config();
        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(&config.storage.local_path)
                .await
                .expect("Failed to create local storage"),
        );
        Self::with_storage(config, text_enabled, image_enabled, storage)
    }

    pub fn with_storage(
        config: ArtifactConfig,
        text_enabled: bool,
        image_enabled: bool,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let storage_path = config.storage.local_path.clone();
        let state = AppState {
            config: Arc::new(config),
            text_provider: Arc::new(MockTextProvider::new(text_enabled)),
            image_provider: Arc::new(MockImageProvider::new(image_enabled)),
            storage,
        };
        Self {
            state,
            storage_path,
        }
    }

    /// Every stored object as (key, bytes), keys relative to the storage root.
    pub async fn stored_objects(&self) -> Vec<(String, Vec<u8>)> {
        let mut objects = Vec::new();
        let root = std::path::Path::new(&self.storage_path);
        let Ok(mut prefixes) = tokio::fs::read_dir(root).await else {
            return objects;
        };
        while let Ok(Some(prefix)) = prefixes.next_entry().await {
            let mut entries = tokio::fs::read_dir(prefix.path())
                .await
                .expect("Failed to list prefix");
            while let Ok(Some(entry)) = entries.next_entry().await {
                let key = entry
                    .path()
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/");
                let data = tokio::fs::read(entry.path()).await.unwrap();
                objects.push((key, data));
            }
        }
        objects
    }

    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.storage_path).await;
    }
}

pub struct TestApp {
    pub http_address: String,
    pub port: u16,
    pub storage_path: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let config = test_config();
        let storage_path = config.storage.local_path.clone();

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let http_address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", http_address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        Self {
            http_address,
            port,
            storage_path,
        }
    }

    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.storage_path).await;
    }
}
