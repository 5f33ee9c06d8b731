//! 基础设施层实现。
//!
//! 提供数据库仓储、密码哈希、对象存储等适配器，实现应用层定义的接口。

pub mod builder;
pub mod migrations;
pub mod password;
pub mod repository;
pub mod storage;

pub use builder::{Infrastructure, InfrastructureError, Repositories};
pub use migrations::MIGRATOR;
pub use password::BcryptPasswordHasher;
pub use repository::{
    create_pg_pool, PgConversationRepository, PgFriendshipRepository, PgPostRepository,
    PgStorage, PgUserRepository,
};
pub use storage::{object_storage_from_config, GcsObjectStorage, LocalObjectStorage};
