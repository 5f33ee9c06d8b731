use std::sync::Arc;

use crate::{
    error::ApplicationError,
    storage::{sanitize_filename, ObjectStorage},
};

/// 上传完成后的公开文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub filename: String,
    pub url: String,
}

pub struct UploadService {
    storage: Arc<dyn ObjectStorage>,
}

impl UploadService {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, ApplicationError> {
        let filename = sanitize_filename(filename)?;
        let url = self.storage.put(&filename, bytes).await?;
        tracing::info!(%url, "文件已上传");
        Ok(StoredFile { filename, url })
    }
}
