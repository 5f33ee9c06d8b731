//! 领域模型错误定义
//!
//! 业务规则错误与存储错误分开定义，应用层再统一包装。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 输入校验失败
    #[error("invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("user not found")]
    UserNotFound,

    #[error("post not found")]
    PostNotFound,

    /// 待处理的好友请求不存在（从未发送或已被处理）
    #[error("friend request not found")]
    FriendRequestNotFound,

    #[error("users are already friends")]
    AlreadyFriends,

    /// 对方已经向当前用户发出了请求，应当直接接受
    #[error("a friend request from the other user is already pending")]
    FriendRequestPending,

    /// 不能与自己建立好友或会话关系
    #[error("cannot relate a user to themselves")]
    SelfRelation,
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 仓储层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    /// 唯一约束冲突
    #[error("record already exists")]
    Conflict,

    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
