use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid file name: {0}")]
    InvalidName(String),
    #[error("upload failed: {0}")]
    Upload(String),
}

impl StorageError {
    pub fn upload(message: impl Into<String>) -> Self {
        Self::Upload(message.into())
    }
}

/// 对象存储，写入后返回公开访问地址
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, filename: &str, bytes: Vec<u8>) -> Result<String, StorageError>;
}

/// 去掉客户端传入文件名中的路径部分，只保留安全字符。
pub fn sanitize_filename(raw: &str) -> Result<String, StorageError> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        return Err(StorageError::InvalidName(raw.to_string()));
    }
    Ok(cleaned)
}

/// 公开访问地址：`{base}/{bucket}/{filename}`
pub fn public_url(base: &str, bucket: &str, filename: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), bucket, filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_components_are_stripped() {
        assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("C:\\tmp\\cat pic.png").unwrap(), "cat_pic.png");
        assert_eq!(sanitize_filename("avatar.jpg").unwrap(), "avatar.jpg");
    }

    #[test]
    fn empty_names_are_rejected() {
        assert!(matches!(sanitize_filename("  "), Err(StorageError::InvalidName(_))));
        assert!(matches!(sanitize_filename("dir/"), Err(StorageError::InvalidName(_))));
        assert!(matches!(sanitize_filename(".."), Err(StorageError::InvalidName(_))));
    }

    #[test]
    fn public_url_joins_without_double_slash() {
        assert_eq!(
            public_url("https://storage.googleapis.com/", "uploads", "a.png"),
            "https://storage.googleapis.com/uploads/a.png"
        );
    }
}
