use std::sync::Arc;

use dashmap::DashMap;
use domain::UserId;
use tokio::sync::Mutex;

use crate::error::ApplicationError;
use crate::repository::UserRepository;

/// 在线状态管理器trait
///
/// 由实时通道在连接建立、断开时调用。
#[async_trait::async_trait]
pub trait PresenceManager: Send + Sync {
    /// 已认证的实时连接建立时调用
    async fn connected(&self, user_id: UserId) -> Result<(), ApplicationError>;

    /// 实时连接断开时调用
    async fn disconnected(&self, user_id: UserId) -> Result<(), ApplicationError>;
}

/// 按连接计数的在线状态管理器
///
/// 同一用户可以同时持有多条连接，只有最后一条断开时才标记离线。
/// 每个用户一个计数槽，同一用户的上下线按顺序写库，不同用户互不阻塞。
pub struct ConnectionPresenceManager {
    user_repository: Arc<dyn UserRepository>,
    connections: DashMap<UserId, Arc<Mutex<usize>>>,
}

impl ConnectionPresenceManager {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self {
            user_repository,
            connections: DashMap::new(),
        }
    }

    pub async fn connection_count(&self, user_id: UserId) -> usize {
        match self.slot(user_id) {
            Some(slot) => *slot.lock().await,
            None => 0,
        }
    }

    fn slot(&self, user_id: UserId) -> Option<Arc<Mutex<usize>>> {
        self.connections
            .get(&user_id)
            .map(|entry| entry.value().clone())
    }
}

#[async_trait::async_trait]
impl PresenceManager for ConnectionPresenceManager {
    async fn connected(&self, user_id: UserId) -> Result<(), ApplicationError> {
        let slot = self.connections.entry(user_id).or_default().clone();
        let mut count = slot.lock().await;
        *count += 1;
        if *count == 1 {
            self.user_repository.set_online(user_id, true).await?;
            tracing::debug!(user_id = %user_id, "用户上线");
        }
        Ok(())
    }

    async fn disconnected(&self, user_id: UserId) -> Result<(), ApplicationError> {
        let Some(slot) = self.slot(user_id) else {
            return Ok(());
        };
        let mut count = slot.lock().await;
        if *count == 0 {
            return Ok(());
        }
        *count -= 1;
        if *count > 0 {
            return Ok(());
        }
        self.user_repository.set_online(user_id, false).await?;
        tracing::debug!(user_id = %user_id, "用户离线");
        drop(count);

        // 只有本调用持有计数槽且计数为零时才回收
        self.connections.remove_if(&user_id, |_, entry| {
            Arc::strong_count(entry) == 2
                && entry.try_lock().map(|count| *count == 0).unwrap_or(false)
        });
        Ok(())
    }
}
