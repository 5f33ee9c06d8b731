//! 社交网络核心领域模型
//!
//! 包含用户、好友关系、两人会话、私信、帖子等实体，以及相关的业务规则。

pub mod chatroom;
pub mod errors;
pub mod friendship;
pub mod message;
pub mod post;
pub mod user;
pub mod value_objects;

// 重新导出常用类型
pub use chatroom::Chatroom;
pub use errors::{DomainError, RepositoryError};
pub use friendship::{FriendRequest, Relation};
pub use message::{Message, MessageDraft};
pub use post::{Comment, Like, Post, PostDetails};
pub use user::{ProfileUpdate, User, UserSummary};
pub use value_objects::{
    Age, ChatroomId, CommentId, MessageContent, MessageId, ParticipantPair, PasswordHash,
    PersonName, PostId, Timestamp, UserEmail, UserId,
};
