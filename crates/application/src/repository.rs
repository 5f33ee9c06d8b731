//! 持久化网关接口
//!
//! 多步骤的读改写流程（接受好友请求、查找或创建会话并追加消息）
//! 以单个方法的形式出现，由实现方保证在一个事务内完成。

use async_trait::async_trait;
use domain::{
    Chatroom, ChatroomId, Comment, FriendRequest, Like, Message, MessageDraft, ParticipantPair,
    Post, PostId, Relation, RepositoryError, User, UserEmail, UserId, UserSummary,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 邮箱重复时返回 [`RepositoryError::Conflict`]
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn update(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError>;
    /// 姓或名包含 `query`（忽略大小写）
    async fn search_by_name(&self, query: &str, limit: i64) -> Result<Vec<User>, RepositoryError>;
    async fn set_online(&self, id: UserId, online: bool) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait FriendshipRepository: Send + Sync {
    /// 在同一事务内读取当前关系，仅当关系为 [`Relation::None`] 时写入请求。
    ///
    /// 返回写入前的关系，由调用方决定如何解释。
    async fn create_request(&self, request: FriendRequest) -> Result<Relation, RepositoryError>;

    /// 在同一事务内：删除 requester -> accepter 的待处理请求，写入双向好友关系，
    /// 并确保两人的会话存在（已存在时沿用，否则写入 `chatroom`）。
    ///
    /// 没有待处理请求时返回 [`RepositoryError::NotFound`]，且不产生任何修改。
    async fn accept_request(
        &self,
        accepter_id: UserId,
        requester_id: UserId,
        chatroom: Chatroom,
    ) -> Result<Chatroom, RepositoryError>;

    async fn friends_of(&self, user_id: UserId) -> Result<Vec<UserSummary>, RepositoryError>;
    /// 自己发出、尚未处理的请求对象
    async fn outgoing_requests(&self, user_id: UserId)
        -> Result<Vec<UserSummary>, RepositoryError>;
    /// 别人发给自己、尚未处理的请求发送者
    async fn incoming_requests(&self, user_id: UserId)
        -> Result<Vec<UserSummary>, RepositoryError>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_between(
        &self,
        pair: ParticipantPair,
    ) -> Result<Option<Chatroom>, RepositoryError>;

    /// 在同一事务内查找两人的会话（不存在时写入 `candidate`），然后追加消息。
    ///
    /// 同一用户对的并发调用必须收敛到同一个会话。
    async fn append_message(
        &self,
        candidate: Chatroom,
        draft: MessageDraft,
    ) -> Result<Message, RepositoryError>;

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Chatroom>, RepositoryError>;

    /// 会话中的消息，按创建时间升序
    async fn messages(&self, chatroom_id: ChatroomId) -> Result<Vec<Message>, RepositoryError>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: Post) -> Result<Post, RepositoryError>;
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepositoryError>;
    /// 按创建时间倒序
    async fn list_by_author(&self, author_id: UserId) -> Result<Vec<Post>, RepositoryError>;
    /// 重复点赞不产生新记录
    async fn add_like(&self, like: Like) -> Result<(), RepositoryError>;
    async fn likes(&self, post_id: PostId) -> Result<Vec<Like>, RepositoryError>;
    async fn add_comment(&self, comment: Comment) -> Result<Comment, RepositoryError>;
    /// 按创建时间倒序
    async fn comments(&self, post_id: PostId) -> Result<Vec<Comment>, RepositoryError>;
}
