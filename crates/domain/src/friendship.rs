//! 好友关系规则
//!
//! 两个用户之间在任一时刻只处于一种关系状态，因此同一对用户不会
//! 同时出现在好友集合和待处理请求集合中。

use crate::errors::DomainError;
use crate::value_objects::{Timestamp, UserId};

/// 从某个用户视角看，与另一用户的当前关系。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    None,
    Friends,
    /// 自己已发出请求，等待对方处理
    Outgoing,
    /// 对方已发出请求，等待自己处理
    Incoming,
}

impl Relation {
    /// 判断能否由当前用户发出好友请求。
    ///
    /// 返回 `Ok(true)` 表示需要新建请求，`Ok(false)` 表示请求已存在（幂等）。
    pub fn check_request(self) -> Result<bool, DomainError> {
        match self {
            Relation::None => Ok(true),
            Relation::Outgoing => Ok(false),
            Relation::Friends => Err(DomainError::AlreadyFriends),
            Relation::Incoming => Err(DomainError::FriendRequestPending),
        }
    }
}

/// 方向性的好友请求边：requester -> target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendRequest {
    pub requester_id: UserId,
    pub target_id: UserId,
    pub created_at: Timestamp,
}

impl FriendRequest {
    pub fn new(
        requester_id: UserId,
        target_id: UserId,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        if requester_id == target_id {
            return Err(DomainError::SelfRelation);
        }
        Ok(Self {
            requester_id,
            target_id,
            created_at,
        })
    }
}
