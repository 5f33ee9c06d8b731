use crate::errors::DomainError;
use crate::value_objects::{ChatroomId, ParticipantPair, Timestamp, UserId};

/// 两人会话。
///
/// 两个参与者按创建时的顺序存放在两个槽位中；唯一性由归一化的
/// [`ParticipantPair`] 保证。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Chatroom {
    pub id: ChatroomId,
    pub user1_id: UserId,
    pub user2_id: UserId,
    pub created_at: Timestamp,
}

impl Chatroom {
    /// 以 `first` 占据第一个槽位创建会话。
    pub fn open(
        id: ChatroomId,
        first: UserId,
        second: UserId,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        ParticipantPair::new(first, second)?;
        Ok(Self {
            id,
            user1_id: first,
            user2_id: second,
            created_at,
        })
    }

    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }
}
