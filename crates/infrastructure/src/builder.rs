use std::sync::Arc;

use application::{
    ConversationRepository, FriendshipRepository, InMemoryStore, ObjectStorage, PasswordHasher,
    PostRepository, UserRepository,
};
use config::AppConfig;
use thiserror::Error;

use crate::{
    migrations::MIGRATOR,
    password::BcryptPasswordHasher,
    repository::{create_pg_pool, PgStorage},
    storage::object_storage_from_config,
};

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// 各仓储的 trait 对象，PostgreSQL 与内存实现共用
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub friendships: Arc<dyn FriendshipRepository>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub posts: Arc<dyn PostRepository>,
}

impl Repositories {
    pub fn postgres(storage: &PgStorage) -> Self {
        Self {
            users: storage.user_repository.clone(),
            friendships: storage.friendship_repository.clone(),
            conversations: storage.conversation_repository.clone(),
            posts: storage.post_repository.clone(),
        }
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            friendships: Arc::new(store.clone()),
            conversations: Arc::new(store.clone()),
            posts: Arc::new(store),
        }
    }
}

#[derive(Clone)]
pub struct Infrastructure {
    pub repositories: Repositories,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub object_storage: Arc<dyn ObjectStorage>,
}

impl Infrastructure {
    /// 连接数据库并执行迁移；`database.in_memory` 为真时使用内存存储
    pub async fn connect(config: &AppConfig) -> Result<Self, InfrastructureError> {
        let repositories = if config.database.in_memory {
            tracing::warn!("使用内存存储，重启后数据丢失");
            Repositories::in_memory(InMemoryStore::new())
        } else {
            let pool =
                create_pg_pool(&config.database.url, config.database.max_connections).await?;
            MIGRATOR.run(&pool).await?;
            tracing::info!("数据库迁移完成");
            Repositories::postgres(&PgStorage::new(pool))
        };

        Ok(Self {
            repositories,
            password_hasher: Arc::new(BcryptPasswordHasher::new(config.server.bcrypt_cost)),
            object_storage: object_storage_from_config(&config.storage),
        })
    }
}
