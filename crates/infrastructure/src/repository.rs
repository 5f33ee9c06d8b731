use std::sync::Arc;

use application::repository::{
    ConversationRepository, FriendshipRepository, PostRepository, UserRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Age, Chatroom, ChatroomId, Comment, CommentId, FriendRequest, Like, Message, MessageContent,
    MessageDraft, MessageId, ParticipantPair, PasswordHash, PersonName, Post, PostId, Relation,
    RepositoryError, User, UserEmail, UserId, UserSummary,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

pub(crate) fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    let unique_violation = err
        .as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false);
    if unique_violation {
        return RepositoryError::Conflict;
    }
    RepositoryError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

const USER_COLUMNS: &str = "id, email, first_name, last_name, age, password_hash, bio, profile_pic, online, created_at, updated_at";
const SUMMARY_COLUMNS: &str = "u.id, u.first_name, u.last_name, u.profile_pic, u.online";
const MESSAGE_COLUMNS: &str = "id, chatroom_id, sender_id, receiver_id, content, created_at";
const POST_COLUMNS: &str = "id, author_id, content, image_url, link, created_at";

#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    age: i32,
    password_hash: String,
    bio: Option<String>,
    profile_pic: Option<String>,
    online: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let email = UserEmail::parse(value.email).map_err(|err| invalid_data(err.to_string()))?;
        let first_name = PersonName::parse("first_name", value.first_name)
            .map_err(|err| invalid_data(err.to_string()))?;
        let last_name = PersonName::parse("last_name", value.last_name)
            .map_err(|err| invalid_data(err.to_string()))?;
        let age = Age::parse(value.age).map_err(|err| invalid_data(err.to_string()))?;
        let password =
            PasswordHash::new(value.password_hash).map_err(|err| invalid_data(err.to_string()))?;

        Ok(User {
            id: UserId::from(value.id),
            email,
            first_name,
            last_name,
            age,
            password,
            bio: value.bio,
            profile_pic: value.profile_pic,
            online: value.online,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SummaryRecord {
    id: Uuid,
    first_name: String,
    last_name: String,
    profile_pic: Option<String>,
    online: bool,
}

impl TryFrom<SummaryRecord> for UserSummary {
    type Error = RepositoryError;

    fn try_from(value: SummaryRecord) -> Result<Self, Self::Error> {
        Ok(UserSummary {
            id: UserId::from(value.id),
            first_name: PersonName::parse("first_name", value.first_name)
                .map_err(|err| invalid_data(err.to_string()))?,
            last_name: PersonName::parse("last_name", value.last_name)
                .map_err(|err| invalid_data(err.to_string()))?,
            profile_pic: value.profile_pic,
            online: value.online,
        })
    }
}

#[derive(Debug, FromRow)]
struct ChatroomRecord {
    id: Uuid,
    user1_id: Uuid,
    user2_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<ChatroomRecord> for Chatroom {
    fn from(value: ChatroomRecord) -> Self {
        Chatroom {
            id: ChatroomId::from(value.id),
            user1_id: UserId::from(value.user1_id),
            user2_id: UserId::from(value.user2_id),
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    chatroom_id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let content =
            MessageContent::new(value.content).map_err(|err| invalid_data(err.to_string()))?;
        Ok(Message {
            id: MessageId::from(value.id),
            chatroom_id: ChatroomId::from(value.chatroom_id),
            sender_id: UserId::from(value.sender_id),
            receiver_id: UserId::from(value.receiver_id),
            content,
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PostRecord {
    id: Uuid,
    author_id: Uuid,
    content: Option<String>,
    image_url: Option<String>,
    link: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PostRecord> for Post {
    fn from(value: PostRecord) -> Self {
        Post {
            id: PostId::from(value.id),
            author_id: UserId::from(value.author_id),
            content: value.content,
            image_url: value.image_url,
            link: value.link,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LikeRecord {
    post_id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<LikeRecord> for Like {
    fn from(value: LikeRecord) -> Self {
        Like {
            post_id: PostId::from(value.post_id),
            user_id: UserId::from(value.user_id),
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CommentRecord {
    id: Uuid,
    post_id: Uuid,
    author_id: Uuid,
    comment: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRecord> for Comment {
    fn from(value: CommentRecord) -> Self {
        Comment {
            id: CommentId::from(value.id),
            post_id: PostId::from(value.post_id),
            author_id: UserId::from(value.author_id),
            comment: value.comment,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RelationRecord {
    friends: bool,
    outgoing: bool,
    incoming: bool,
}

impl From<RelationRecord> for Relation {
    fn from(value: RelationRecord) -> Self {
        if value.friends {
            Relation::Friends
        } else if value.outgoing {
            Relation::Outgoing
        } else if value.incoming {
            Relation::Incoming
        } else {
            Relation::None
        }
    }
}

/// `%`、`_` 和反斜杠按字面匹配
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (id, email, first_name, last_name, age, password_hash, bio, profile_pic, online, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::from(user.id))
        .bind(user.email.as_str())
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_str())
        .bind(user.age.value())
        .bind(user.password.as_str())
        .bind(user.bio.as_deref())
        .bind(user.profile_pic.as_deref())
        .bind(user.online)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, age = $4, bio = $5, profile_pic = $6, updated_at = $7
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::from(user.id))
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_str())
        .bind(user.age.value())
        .bind(user.bio.as_deref())
        .bind(user.profile_pic.as_deref())
        .bind(user.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(record)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn search_by_name(&self, query: &str, limit: i64) -> Result<Vec<User>, RepositoryError> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE first_name ILIKE $1 OR last_name ILIKE $1
            ORDER BY first_name, last_name
            LIMIT $2
            "#
        ))
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(User::try_from).collect()
    }

    async fn set_online(&self, id: UserId, online: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET online = $2 WHERE id = $1")
            .bind(Uuid::from(id))
            .bind(online)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgFriendshipRepository {
    pool: PgPool,
}

impl PgFriendshipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn summaries(
        &self,
        sql: &str,
        user_id: UserId,
    ) -> Result<Vec<UserSummary>, RepositoryError> {
        let records = sqlx::query_as::<_, SummaryRecord>(sql)
            .bind(Uuid::from(user_id))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        records.into_iter().map(UserSummary::try_from).collect()
    }
}

/// 同一用户对的好友操作在事务内串行化
async fn lock_pair(
    tx: &mut Transaction<'_, Postgres>,
    pair: ParticipantPair,
) -> Result<(), RepositoryError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(format!("friend:{}:{}", pair.low(), pair.high()))
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_err)?;
    Ok(())
}

async fn relation_in(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    other_id: UserId,
) -> Result<Relation, RepositoryError> {
    let record = sqlx::query_as::<_, RelationRecord>(RELATION_SQL)
        .bind(Uuid::from(user_id))
        .bind(Uuid::from(other_id))
        .fetch_one(&mut **tx)
        .await
        .map_err(map_sqlx_err)?;
    Ok(record.into())
}

const RELATION_SQL: &str = r#"
    SELECT
        EXISTS (SELECT 1 FROM friendships WHERE user_id = $1 AND friend_id = $2) AS friends,
        EXISTS (SELECT 1 FROM friend_requests WHERE requester_id = $1 AND target_id = $2) AS outgoing,
        EXISTS (SELECT 1 FROM friend_requests WHERE requester_id = $2 AND target_id = $1) AS incoming
"#;

/// 插入会话（用户对已存在时跳过），返回该用户对唯一的会话
async fn ensure_chatroom(
    tx: &mut Transaction<'_, Postgres>,
    candidate: &Chatroom,
) -> Result<Chatroom, RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO chatrooms (id, user1_id, user2_id, created_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(Uuid::from(candidate.id))
    .bind(Uuid::from(candidate.user1_id))
    .bind(Uuid::from(candidate.user2_id))
    .bind(candidate.created_at)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx_err)?;

    let record = sqlx::query_as::<_, ChatroomRecord>(
        r#"
        SELECT id, user1_id, user2_id, created_at FROM chatrooms
        WHERE (user1_id = $1 AND user2_id = $2) OR (user1_id = $2 AND user2_id = $1)
        "#,
    )
    .bind(Uuid::from(candidate.user1_id))
    .bind(Uuid::from(candidate.user2_id))
    .fetch_one(&mut **tx)
    .await
    .map_err(map_sqlx_err)?;

    Ok(record.into())
}

#[async_trait]
impl FriendshipRepository for PgFriendshipRepository {
    async fn create_request(&self, request: FriendRequest) -> Result<Relation, RepositoryError> {
        let pair = ParticipantPair::new(request.requester_id, request.target_id)
            .map_err(|err| invalid_data(err.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        lock_pair(&mut tx, pair).await?;

        let prior = relation_in(&mut tx, request.requester_id, request.target_id).await?;
        if prior == Relation::None {
            sqlx::query(
                r#"
                INSERT INTO friend_requests (requester_id, target_id, created_at)
                VALUES ($1, $2, $3)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(Uuid::from(request.requester_id))
            .bind(Uuid::from(request.target_id))
            .bind(request.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        }

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(prior)
    }

    async fn accept_request(
        &self,
        accepter_id: UserId,
        requester_id: UserId,
        chatroom: Chatroom,
    ) -> Result<Chatroom, RepositoryError> {
        let pair = ParticipantPair::new(accepter_id, requester_id)
            .map_err(|err| invalid_data(err.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        lock_pair(&mut tx, pair).await?;

        // 1. 删除待处理请求；不存在时直接返回，事务随 tx 丢弃回滚
        let deleted = sqlx::query(
            "DELETE FROM friend_requests WHERE requester_id = $1 AND target_id = $2",
        )
        .bind(Uuid::from(requester_id))
        .bind(Uuid::from(accepter_id))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;
        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        // 2. 双向好友关系
        sqlx::query(
            r#"
            INSERT INTO friendships (user_id, friend_id, created_at)
            VALUES ($1, $2, $3), ($2, $1, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::from(accepter_id))
        .bind(Uuid::from(requester_id))
        .bind(chatroom.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        // 3. 会话
        let chatroom = ensure_chatroom(&mut tx, &chatroom).await?;

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(chatroom)
    }

    async fn friends_of(&self, user_id: UserId) -> Result<Vec<UserSummary>, RepositoryError> {
        self.summaries(
            &format!(
                r#"
                SELECT {SUMMARY_COLUMNS} FROM friendships f
                JOIN users u ON u.id = f.friend_id
                WHERE f.user_id = $1
                ORDER BY f.created_at
                "#
            ),
            user_id,
        )
        .await
    }

    async fn outgoing_requests(
        &self,
        user_id: UserId,
    ) -> Result<Vec<UserSummary>, RepositoryError> {
        self.summaries(
            &format!(
                r#"
                SELECT {SUMMARY_COLUMNS} FROM friend_requests r
                JOIN users u ON u.id = r.target_id
                WHERE r.requester_id = $1
                ORDER BY r.created_at
                "#
            ),
            user_id,
        )
        .await
    }

    async fn incoming_requests(
        &self,
        user_id: UserId,
    ) -> Result<Vec<UserSummary>, RepositoryError> {
        self.summaries(
            &format!(
                r#"
                SELECT {SUMMARY_COLUMNS} FROM friend_requests r
                JOIN users u ON u.id = r.requester_id
                WHERE r.target_id = $1
                ORDER BY r.created_at
                "#
            ),
            user_id,
        )
        .await
    }
}

#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn find_between(
        &self,
        pair: ParticipantPair,
    ) -> Result<Option<Chatroom>, RepositoryError> {
        let record = sqlx::query_as::<_, ChatroomRecord>(
            r#"
            SELECT id, user1_id, user2_id, created_at FROM chatrooms
            WHERE (user1_id = $1 AND user2_id = $2) OR (user1_id = $2 AND user2_id = $1)
            "#,
        )
        .bind(Uuid::from(pair.low()))
        .bind(Uuid::from(pair.high()))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(Chatroom::from))
    }

    async fn append_message(
        &self,
        candidate: Chatroom,
        draft: MessageDraft,
    ) -> Result<Message, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        // 唯一索引保证并发的首次联系收敛到同一会话
        let chatroom = ensure_chatroom(&mut tx, &candidate).await?;

        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            INSERT INTO messages (id, chatroom_id, sender_id, receiver_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(Uuid::from(draft.id))
        .bind(Uuid::from(chatroom.id))
        .bind(Uuid::from(draft.sender_id))
        .bind(Uuid::from(draft.receiver_id))
        .bind(draft.content.as_str())
        .bind(draft.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;
        Message::try_from(record)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Chatroom>, RepositoryError> {
        let records = sqlx::query_as::<_, ChatroomRecord>(
            r#"
            SELECT id, user1_id, user2_id, created_at FROM chatrooms
            WHERE user1_id = $1 OR user2_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(Uuid::from(user_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Chatroom::from).collect())
    }

    async fn messages(&self, chatroom_id: ChatroomId) -> Result<Vec<Message>, RepositoryError> {
        let records = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chatroom_id = $1 ORDER BY created_at, id"
        ))
        .bind(Uuid::from(chatroom_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, post: Post) -> Result<Post, RepositoryError> {
        let record = sqlx::query_as::<_, PostRecord>(&format!(
            r#"
            INSERT INTO posts (id, author_id, content, image_url, link, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::from(post.id))
        .bind(Uuid::from(post.author_id))
        .bind(post.content.as_deref())
        .bind(post.image_url.as_deref())
        .bind(post.link.as_deref())
        .bind(post.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.into())
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let record = sqlx::query_as::<_, PostRecord>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(Post::from))
    }

    async fn list_by_author(&self, author_id: UserId) -> Result<Vec<Post>, RepositoryError> {
        let records = sqlx::query_as::<_, PostRecord>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = $1 ORDER BY created_at DESC"
        ))
        .bind(Uuid::from(author_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Post::from).collect())
    }

    async fn add_like(&self, like: Like) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO post_likes (post_id, user_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (post_id, user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::from(like.post_id))
        .bind(Uuid::from(like.user_id))
        .bind(like.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn likes(&self, post_id: PostId) -> Result<Vec<Like>, RepositoryError> {
        let records = sqlx::query_as::<_, LikeRecord>(
            "SELECT post_id, user_id, created_at FROM post_likes WHERE post_id = $1 ORDER BY created_at",
        )
        .bind(Uuid::from(post_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Like::from).collect())
    }

    async fn add_comment(&self, comment: Comment) -> Result<Comment, RepositoryError> {
        let record = sqlx::query_as::<_, CommentRecord>(
            r#"
            INSERT INTO comments (id, post_id, author_id, comment, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, post_id, author_id, comment, created_at
            "#,
        )
        .bind(Uuid::from(comment.id))
        .bind(Uuid::from(comment.post_id))
        .bind(Uuid::from(comment.author_id))
        .bind(&comment.comment)
        .bind(comment.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.into())
    }

    async fn comments(&self, post_id: PostId) -> Result<Vec<Comment>, RepositoryError> {
        let records = sqlx::query_as::<_, CommentRecord>(
            r#"
            SELECT id, post_id, author_id, comment, created_at FROM comments
            WHERE post_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(Uuid::from(post_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Comment::from).collect())
    }
}

#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    pub user_repository: Arc<PgUserRepository>,
    pub friendship_repository: Arc<PgFriendshipRepository>,
    pub conversation_repository: Arc<PgConversationRepository>,
    pub post_repository: Arc<PgPostRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repository: Arc::new(PgUserRepository::new(pool.clone())),
            friendship_repository: Arc::new(PgFriendshipRepository::new(pool.clone())),
            conversation_repository: Arc::new(PgConversationRepository::new(pool.clone())),
            post_repository: Arc::new(PgPostRepository::new(pool.clone())),
            pool,
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
