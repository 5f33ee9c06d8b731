use application::{PasswordHasher, PasswordHasherError};
use async_trait::async_trait;
use domain::PasswordHash;

/// bcrypt 哈希器。
///
/// 成本因子来自 `server.bcrypt_cost`；计算放在阻塞线程池中，避免占用异步工作线程。
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        let cost = self.cost;
        let plaintext = plaintext.to_owned();
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|err| PasswordHasherError::hash(err.to_string()))?
            .map_err(|err| PasswordHasherError::hash(err.to_string()))?;

        PasswordHash::new(hashed).map_err(|err| PasswordHasherError::hash(err.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        stored: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        let plaintext = plaintext.to_owned();
        let stored = stored.as_str().to_owned();
        match tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &stored)).await {
            Ok(result) => result.map_err(|err| PasswordHasherError::corrupted(err.to_string())),
            Err(join_error) => Err(PasswordHasherError::corrupted(join_error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        // 最低成本，避免拖慢测试
        let hasher = BcryptPasswordHasher::new(4);
        let hashed = hasher.hash("correct horse").await.unwrap();

        assert_ne!(hashed.as_str(), "correct horse");
        assert!(hashed.as_str().starts_with("$2b$04$"));
        assert!(hasher.verify("correct horse", &hashed).await.unwrap());
        assert!(!hasher.verify("battery staple", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        let hasher = BcryptPasswordHasher::new(4);
        let bogus = PasswordHash::new("not-a-bcrypt-hash").unwrap();
        assert!(matches!(
            hasher.verify("anything", &bogus).await,
            Err(PasswordHasherError::Corrupted(_))
        ));
    }
}
