//! 对象存储实现：本地目录与 Google Cloud Storage

use std::path::PathBuf;

use application::storage::{public_url, ObjectStorage, StorageError};
use async_trait::async_trait;
use config::{StorageBackend, StorageConfig};
use std::sync::Arc;

/// 按配置创建对象存储
pub fn object_storage_from_config(config: &StorageConfig) -> Arc<dyn ObjectStorage> {
    match config.backend {
        StorageBackend::Local => Arc::new(LocalObjectStorage::new(
            config.local_root.clone(),
            config.bucket.clone(),
            config.local_public_base_url.clone(),
        )),
        StorageBackend::Gcs => Arc::new(GcsObjectStorage::new(
            reqwest::Client::new(),
            config.upload_endpoint.clone(),
            config.bucket.clone(),
            config.public_base_url.clone(),
            config.access_token.clone(),
        )),
    }
}

/// 写入 `{root}/{bucket}/{filename}`，适合本地开发
pub struct LocalObjectStorage {
    root: PathBuf,
    bucket: String,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, bucket: String, public_base_url: String) -> Self {
        Self {
            root: root.into(),
            bucket,
            public_base_url,
        }
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(&self, filename: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        let dir = self.root.join(&self.bucket);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|err| StorageError::upload(err.to_string()))?;
        tokio::fs::write(dir.join(filename), bytes)
            .await
            .map_err(|err| StorageError::upload(err.to_string()))?;
        Ok(public_url(&self.public_base_url, &self.bucket, filename))
    }
}

/// Google Cloud Storage JSON API 的单次上传（`uploadType=media`）
pub struct GcsObjectStorage {
    client: reqwest::Client,
    upload_endpoint: String,
    bucket: String,
    public_base_url: String,
    access_token: Option<String>,
}

impl GcsObjectStorage {
    pub fn new(
        client: reqwest::Client,
        upload_endpoint: String,
        bucket: String,
        public_base_url: String,
        access_token: Option<String>,
    ) -> Self {
        Self {
            client,
            upload_endpoint,
            bucket,
            public_base_url,
            access_token,
        }
    }
}

#[async_trait]
impl ObjectStorage for GcsObjectStorage {
    async fn put(&self, filename: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        let url = format!(
            "{}/b/{}/o",
            self.upload_endpoint.trim_end_matches('/'),
            self.bucket
        );
        let mut request = self
            .client
            .post(&url)
            .query(&[("uploadType", "media"), ("name", filename)])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| StorageError::upload(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, bucket = %self.bucket, filename, "对象存储上传失败");
            return Err(StorageError::upload(format!("{status}: {body}")));
        }

        Ok(public_url(&self.public_base_url, &self.bucket, filename))
    }
}
