use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use service_core::error::AppError;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `key`, replacing any existing object.
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: Option<&str>)
        -> Result<(), AppError>;
    /// Check that the backing store is reachable.
    async fn health_check(&self) -> Result<(), AppError>;
    /// Human-readable location of the store, for logs.
    fn location(&self) -> String;
}

pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }

    /// Resolve `key` below the base path, refusing keys that would escape it.
    fn resolve(&self, key: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Invalid storage key: {}",
                key
            )));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        let metadata = fs::metadata(&self.base_path).await?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(AppError::StorageError(anyhow::anyhow!(
                "{} is not a directory",
                self.base_path.display()
            )))
        }
    }

    fn location(&self) -> String {
        self.base_path.display().to_string()
    }
}

pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                AppError::StorageError(anyhow::anyhow!(
                    "S3 upload failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| {
                AppError::StorageError(anyhow::anyhow!(
                    "S3 bucket {} unreachable: {}",
                    self.bucket,
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    fn location(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!(
            "artifact-storage-test-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    #[tokio::test]
    async fn test_local_upload_creates_prefix_dirs() {
        let dir = temp_dir();
        let storage = LocalStorage::new(&dir).await.unwrap();

        storage
            .upload("code-output/120000.py", b"print('hi')".to_vec(), None)
            .await
            .unwrap();

        assert!(dir.join("code-output").is_dir());
        assert_eq!(
            fs::read(dir.join("code-output/120000.py")).await.unwrap(),
            b"print('hi')".to_vec()
        );

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_local_upload_overwrites() {
        let dir = temp_dir();
        let storage = LocalStorage::new(&dir).await.unwrap();

        storage.upload("a/b.txt", b"one".to_vec(), None).await.unwrap();
        storage.upload("a/b.txt", b"two".to_vec(), None).await.unwrap();
        assert_eq!(fs::read(dir.join("a/b.txt")).await.unwrap(), b"two".to_vec());

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_local_rejects_escaping_keys() {
        let dir = temp_dir();
        let storage = LocalStorage::new(&dir).await.unwrap();

        let err = storage
            .upload("../outside.txt", b"x".to_vec(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(storage.upload("/etc/passwd", vec![], None).await.is_err());

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_local_health_check() {
        let dir = temp_dir();
        let storage = LocalStorage::new(&dir).await.unwrap();
        assert!(storage.health_check().await.is_ok());

        fs::remove_dir_all(&dir).await.unwrap();
        assert!(storage.health_check().await.is_err());

        let _ = fs::remove_dir_all(&dir).await;
    }
}
