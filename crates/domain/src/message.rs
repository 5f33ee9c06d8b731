use crate::errors::DomainError;
use crate::value_objects::{ChatroomId, MessageContent, MessageId, Timestamp, UserId};

/// 私信。创建后不可修改。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub chatroom_id: ChatroomId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: MessageContent,
    pub created_at: Timestamp,
}

/// 尚未归属会话的待发送消息；会话由仓储在同一事务内解析。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: MessageContent,
    pub created_at: Timestamp,
}

impl MessageDraft {
    pub fn new(
        id: MessageId,
        sender_id: UserId,
        receiver_id: UserId,
        content: MessageContent,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        if sender_id == receiver_id {
            return Err(DomainError::SelfRelation);
        }
        Ok(Self {
            id,
            sender_id,
            receiver_id,
            content,
            created_at,
        })
    }

    pub fn into_message(self, chatroom_id: ChatroomId) -> Message {
        Message {
            id: self.id,
            chatroom_id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

impl Message {
    pub fn involves(&self, user_id: UserId) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }
}
