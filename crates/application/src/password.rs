//! 密码哈希端口，具体算法由基础设施层提供

use async_trait::async_trait;
use domain::PasswordHash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordHasherError {
    #[error("failed to hash password: {0}")]
    Hash(String),
    /// 存储的哈希无法解析
    #[error("stored password hash is unusable: {0}")]
    Corrupted(String),
}

impl PasswordHasherError {
    pub fn hash(message: impl Into<String>) -> Self {
        Self::Hash(message.into())
    }

    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }
}

#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError>;

    /// 密码不匹配返回 `Ok(false)`；只有哈希本身损坏时才返回错误
    async fn verify(
        &self,
        plaintext: &str,
        stored: &PasswordHash,
    ) -> Result<bool, PasswordHasherError>;
}
