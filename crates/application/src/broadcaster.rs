use async_trait::async_trait;
use domain::{Message, UserId};
use thiserror::Error;

/// 新私信事件，广播给所有订阅者，由订阅端按参与者过滤。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MessageCreated {
    pub message: Message,
}

impl MessageCreated {
    pub fn new(message: Message) -> Self {
        Self { message }
    }

    /// 只有发送者和接收者能看到该事件
    pub fn is_visible_to(&self, user_id: UserId) -> bool {
        self.message.involves(user_id)
    }
}

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast failed: {0}")]
    Failed(String),
}

impl BroadcastError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageBroadcaster: Send + Sync {
    async fn broadcast(&self, event: MessageCreated) -> Result<(), BroadcastError>;
}
