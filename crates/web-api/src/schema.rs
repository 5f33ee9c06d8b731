//! GraphQL schema：查询、变更与订阅

use async_graphql::{Context, Object, Schema, SimpleObject, Subscription, Upload, ID};
use futures_util::{Stream, StreamExt};
use uuid::Uuid;

use application::{
    AuthenticateUserRequest, Conversation, CreatePostRequest, EditProfileRequest,
    RegisterUserRequest, SendMessageRequest,
};
use domain::{
    Chatroom, Comment, Like, Message, Post, PostDetails, PostId, User, UserId,
    UserSummary,
};

use crate::{
    auth::Caller,
    error::{ApiError, GraphqlResultExt},
    state::AppState,
};

pub type SocialSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

pub fn build_schema(state: AppState) -> SocialSchema {
    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(state)
        .finish()
}

fn state<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a AppState> {
    ctx.data::<AppState>()
}

fn caller(ctx: &Context<'_>) -> Caller {
    ctx.data_opt::<Caller>().copied().unwrap_or_default()
}

fn require_caller(ctx: &Context<'_>) -> async_graphql::Result<UserId> {
    caller(ctx).require().into_gql()
}

fn parse_id<T: From<Uuid>>(field: &str, id: &ID) -> async_graphql::Result<T> {
    Uuid::parse_str(id.as_str())
        .map(T::from)
        .map_err(|_| ApiError::bad_request(format!("{field}: invalid id")))
        .into_gql()
}

fn required_id<T: From<Uuid>>(field: &str, id: Option<ID>) -> async_graphql::Result<T> {
    let id = id
        .ok_or_else(|| ApiError::bad_request(format!("{field}: is required")))
        .into_gql()?;
    parse_id(field, &id)
}

/// 完整资料或精简信息，统一暴露为 GraphQL `User`
pub struct UserObject {
    id: UserId,
    first_name: String,
    last_name: String,
    profile_pic: Option<String>,
    online: bool,
    details: Option<UserDetails>,
}

struct UserDetails {
    email: String,
    age: i32,
    bio: Option<String>,
}

impl From<User> for UserObject {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.as_str().to_string(),
            last_name: user.last_name.as_str().to_string(),
            profile_pic: user.profile_pic,
            online: user.online,
            details: Some(UserDetails {
                email: user.email.as_str().to_string(),
                age: user.age.value(),
                bio: user.bio,
            }),
        }
    }
}

impl From<UserSummary> for UserObject {
    fn from(summary: UserSummary) -> Self {
        Self {
            id: summary.id,
            first_name: summary.first_name.as_str().to_string(),
            last_name: summary.last_name.as_str().to_string(),
            profile_pic: summary.profile_pic,
            online: summary.online,
            details: None,
        }
    }
}

fn users(summaries: Vec<UserSummary>) -> Vec<UserObject> {
    summaries.into_iter().map(UserObject::from).collect()
}

#[Object(name = "User")]
impl UserObject {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    async fn first_name(&self) -> &str {
        &self.first_name
    }

    async fn last_name(&self) -> &str {
        &self.last_name
    }

    async fn email(&self) -> Option<&str> {
        self.details.as_ref().map(|d| d.email.as_str())
    }

    async fn age(&self) -> Option<i32> {
        self.details.as_ref().map(|d| d.age)
    }

    async fn bio(&self) -> Option<&str> {
        self.details.as_ref().and_then(|d| d.bio.as_deref())
    }

    async fn profile_pic(&self) -> Option<&str> {
        self.profile_pic.as_deref()
    }

    /// 是否有活跃的实时连接
    async fn status(&self) -> bool {
        self.online
    }

    /// 帖子，按时间倒序
    async fn post(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<PostObject>> {
        let posts = state(ctx)?
            .post_service
            .posts_by_author(self.id)
            .await
            .into_gql()?;
        Ok(posts.into_iter().map(PostObject::lazy).collect())
    }

    async fn friends(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<UserObject>> {
        let friends = state(ctx)?
            .friendship_service
            .friends(self.id)
            .await
            .into_gql()?;
        Ok(users(friends))
    }

    #[graphql(name = "sent_friendreq")]
    async fn sent_friendreq(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<UserObject>> {
        let sent = state(ctx)?
            .friendship_service
            .outgoing(self.id)
            .await
            .into_gql()?;
        Ok(users(sent))
    }

    #[graphql(name = "received_friendreq")]
    async fn received_friendreq(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Vec<UserObject>> {
        let received = state(ctx)?
            .friendship_service
            .incoming(self.id)
            .await
            .into_gql()?;
        Ok(users(received))
    }

    /// 会话列表，只对本人可见
    async fn messages(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<ChatroomObject>> {
        if caller(ctx).user_id() != Some(self.id) {
            return Err(ApiError::forbidden("conversations are private")).into_gql();
        }
        let conversations = state(ctx)?
            .messaging_service
            .list_conversations(self.id)
            .await
            .into_gql()?;
        Ok(conversations.into_iter().map(ChatroomObject::from).collect())
    }
}

/// GraphQL `Chatroom`；参与者和消息按需加载
pub struct ChatroomObject {
    chatroom: Chatroom,
    user1: Option<UserSummary>,
    user2: Option<UserSummary>,
    messages: Option<Vec<Message>>,
}

impl From<Conversation> for ChatroomObject {
    fn from(conversation: Conversation) -> Self {
        Self {
            chatroom: conversation.chatroom,
            user1: Some(conversation.user1),
            user2: Some(conversation.user2),
            messages: Some(conversation.messages),
        }
    }
}

impl From<Chatroom> for ChatroomObject {
    fn from(chatroom: Chatroom) -> Self {
        Self {
            chatroom,
            user1: None,
            user2: None,
            messages: None,
        }
    }
}

async fn load_user(ctx: &Context<'_>, user_id: UserId) -> async_graphql::Result<UserObject> {
    let user = state(ctx)?
        .user_service
        .get_user(user_id)
        .await
        .into_gql()?;
    Ok(user.into())
}

async fn participant(
    ctx: &Context<'_>,
    loaded: &Option<UserSummary>,
    user_id: UserId,
) -> async_graphql::Result<UserObject> {
    match loaded {
        Some(summary) => Ok(summary.clone().into()),
        None => load_user(ctx, user_id).await,
    }
}

#[Object(name = "Chatroom")]
impl ChatroomObject {
    async fn id(&self) -> ID {
        ID(self.chatroom.id.to_string())
    }

    async fn user1(&self, ctx: &Context<'_>) -> async_graphql::Result<UserObject> {
        participant(ctx, &self.user1, self.chatroom.user1_id).await
    }

    async fn user2(&self, ctx: &Context<'_>) -> async_graphql::Result<UserObject> {
        participant(ctx, &self.user2, self.chatroom.user2_id).await
    }

    /// 按时间升序
    async fn messages(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<MessageObject>> {
        let messages = match &self.messages {
            Some(messages) => messages.clone(),
            None => {
                let viewer = require_caller(ctx)?;
                state(ctx)?
                    .messaging_service
                    .chatroom_messages(viewer, &self.chatroom)
                    .await
                    .into_gql()?
            }
        };
        Ok(messages.into_iter().map(MessageObject).collect())
    }
}

pub struct MessageObject(Message);

#[Object(name = "Message")]
impl MessageObject {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn created_at(&self) -> String {
        self.0.created_at.to_rfc3339()
    }

    async fn created_by(&self, ctx: &Context<'_>) -> async_graphql::Result<UserObject> {
        load_user(ctx, self.0.sender_id).await
    }

    async fn received_by(&self, ctx: &Context<'_>) -> async_graphql::Result<UserObject> {
        load_user(ctx, self.0.receiver_id).await
    }

    async fn messagecontent(&self) -> &str {
        self.0.content.as_str()
    }

    async fn chatroom(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<ChatroomObject>> {
        let chatroom = state(ctx)?
            .messaging_service
            .chatroom_between(self.0.sender_id, self.0.receiver_id)
            .await
            .into_gql()?;
        Ok(chatroom.map(ChatroomObject::from))
    }
}

/// GraphQL `Post`；点赞和评论在未预取时按需加载
pub struct PostObject {
    post: Post,
    likes: Option<Vec<Like>>,
    comments: Option<Vec<Comment>>,
}

impl PostObject {
    fn lazy(post: Post) -> Self {
        Self {
            post,
            likes: None,
            comments: None,
        }
    }
}

impl From<PostDetails> for PostObject {
    fn from(details: PostDetails) -> Self {
        Self {
            post: details.post,
            likes: Some(details.likes),
            comments: Some(details.comments),
        }
    }
}

impl PostObject {
    async fn details(&self, ctx: &Context<'_>) -> async_graphql::Result<PostDetails> {
        state(ctx)?
            .post_service
            .get_post(self.post.id)
            .await
            .into_gql()
    }
}

#[Object(name = "Post")]
impl PostObject {
    async fn id(&self) -> ID {
        ID(self.post.id.to_string())
    }

    async fn image_url(&self) -> Option<&str> {
        self.post.image_url.as_deref()
    }

    async fn content(&self) -> Option<&str> {
        self.post.content.as_deref()
    }

    async fn link(&self) -> Option<&str> {
        self.post.link.as_deref()
    }

    async fn created_at(&self) -> String {
        self.post.created_at.to_rfc3339()
    }

    async fn author(&self, ctx: &Context<'_>) -> async_graphql::Result<UserObject> {
        load_user(ctx, self.post.author_id).await
    }

    /// 点过赞的用户
    async fn likes(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<UserObject>> {
        let likes = match &self.likes {
            Some(likes) => likes.clone(),
            None => self.details(ctx).await?.likes,
        };
        let mut likers = Vec::with_capacity(likes.len());
        for like in likes {
            likers.push(load_user(ctx, like.user_id).await?);
        }
        Ok(likers)
    }

    /// 按时间倒序
    async fn comments(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<CommentObject>> {
        let comments = match &self.comments {
            Some(comments) => comments.clone(),
            None => self.details(ctx).await?.comments,
        };
        Ok(comments.into_iter().map(CommentObject).collect())
    }
}

pub struct CommentObject(Comment);

#[Object(name = "Comment")]
impl CommentObject {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn comment(&self) -> &str {
        &self.0.comment
    }

    async fn author(&self, ctx: &Context<'_>) -> async_graphql::Result<UserObject> {
        load_user(ctx, self.0.author_id).await
    }

    async fn post(&self, ctx: &Context<'_>) -> async_graphql::Result<PostObject> {
        let details = state(ctx)?
            .post_service
            .get_post(self.0.post_id)
            .await
            .into_gql()?;
        Ok(details.into())
    }
}

#[derive(SimpleObject)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserObject,
}

#[derive(SimpleObject)]
#[graphql(name = "File")]
pub struct FileObject {
    pub url: String,
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// 当前调用者，匿名时为 null
    async fn current_user(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<UserObject>> {
        let Some(user_id) = caller(ctx).user_id() else {
            return Ok(None);
        };
        let user = state(ctx)?
            .user_service
            .find_user(user_id)
            .await
            .into_gql()?;
        Ok(user.map(UserObject::from))
    }

    async fn get_user(
        &self,
        ctx: &Context<'_>,
        user_id: Option<ID>,
    ) -> async_graphql::Result<UserObject> {
        let user_id: UserId = required_id("userId", user_id)?;
        load_user(ctx, user_id).await
    }

    /// 调用者参与的所有会话
    async fn get_all_messages(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Vec<ChatroomObject>> {
        let user_id = require_caller(ctx)?;
        let conversations = state(ctx)?
            .messaging_service
            .list_conversations(user_id)
            .await
            .into_gql()?;
        Ok(conversations.into_iter().map(ChatroomObject::from).collect())
    }

    async fn search(
        &self,
        ctx: &Context<'_>,
        name: Option<String>,
    ) -> async_graphql::Result<Vec<UserObject>> {
        let found = state(ctx)?
            .user_service
            .search(name.as_deref().unwrap_or_default())
            .await
            .into_gql()?;
        Ok(found.into_iter().map(UserObject::from).collect())
    }

    async fn get_post(
        &self,
        ctx: &Context<'_>,
        post_id: Option<ID>,
    ) -> async_graphql::Result<PostObject> {
        let post_id: PostId = required_id("postId", post_id)?;
        let details = state(ctx)?
            .post_service
            .get_post(post_id)
            .await
            .into_gql()?;
        Ok(details.into())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_user(
        &self,
        ctx: &Context<'_>,
        first_name: Option<String>,
        last_name: Option<String>,
        email: Option<String>,
        age: Option<i32>,
        password: Option<String>,
    ) -> async_graphql::Result<UserObject> {
        let user = state(ctx)?
            .user_service
            .register(RegisterUserRequest {
                first_name,
                last_name,
                email,
                age,
                password,
            })
            .await
            .into_gql()?;
        Ok(user.into())
    }

    async fn login(
        &self,
        ctx: &Context<'_>,
        email: Option<String>,
        password: Option<String>,
    ) -> async_graphql::Result<AuthPayload> {
        let state = state(ctx)?;
        let user = state
            .user_service
            .authenticate(AuthenticateUserRequest { email, password })
            .await
            .into_gql()?;
        let token = state.jwt_service.generate_token(user.id).into_gql()?;
        Ok(AuthPayload {
            token,
            user: user.into(),
        })
    }

    async fn single_upload(
        &self,
        ctx: &Context<'_>,
        file: Upload,
    ) -> async_graphql::Result<FileObject> {
        let upload = file.value(ctx)?;
        let filename = upload.filename.clone();
        let mut content = upload.content;
        let bytes = tokio::task::spawn_blocking(move || {
            use std::io::Read;
            let mut buffer = Vec::new();
            content.read_to_end(&mut buffer).map(|_| buffer)
        })
        .await
        .map_err(|err| ApiError::internal_server_error(err.to_string()))
        .into_gql()?
        .map_err(|err| ApiError::bad_request(format!("unreadable upload: {err}")))
        .into_gql()?;

        let stored = state(ctx)?
            .upload_service
            .upload(&filename, bytes)
            .await
            .into_gql()?;
        Ok(FileObject { url: stored.url })
    }

    async fn create_post(
        &self,
        ctx: &Context<'_>,
        link: Option<String>,
        content: Option<String>,
        image_url: Option<String>,
    ) -> async_graphql::Result<PostObject> {
        let author_id = require_caller(ctx)?;
        let post = state(ctx)?
            .post_service
            .create_post(CreatePostRequest {
                author_id,
                content,
                image_url,
                link,
            })
            .await
            .into_gql()?;
        Ok(PostObject::from(PostDetails {
            post,
            likes: Vec::new(),
            comments: Vec::new(),
        }))
    }

    /// 发送私信；首次联系时自动创建会话
    async fn message(
        &self,
        ctx: &Context<'_>,
        receiver: Option<ID>,
        content: Option<String>,
    ) -> async_graphql::Result<MessageObject> {
        let sender_id = require_caller(ctx)?;
        let receiver_id: UserId = required_id("receiver", receiver)?;
        let message = state(ctx)?
            .messaging_service
            .send_message(SendMessageRequest {
                sender_id,
                receiver_id,
                content,
            })
            .await
            .into_gql()?;
        Ok(MessageObject(message))
    }

    /// 返回发起人
    async fn send_friend_req(
        &self,
        ctx: &Context<'_>,
        friend_id: Option<ID>,
    ) -> async_graphql::Result<UserObject> {
        let requester_id = require_caller(ctx)?;
        let target_id: UserId = required_id("friendId", friend_id)?;
        let requester_id = state(ctx)?
            .friendship_service
            .send_request(requester_id, target_id)
            .await
            .into_gql()?;
        load_user(ctx, requester_id).await
    }

    /// 接受 `friendId` 发来的请求，返回对方
    async fn accept_friend_req(
        &self,
        ctx: &Context<'_>,
        friend_id: Option<ID>,
    ) -> async_graphql::Result<UserObject> {
        let accepter_id = require_caller(ctx)?;
        let requester_id: UserId = required_id("friendId", friend_id)?;
        let accepted = state(ctx)?
            .friendship_service
            .accept_request(accepter_id, requester_id)
            .await
            .into_gql()?;
        Ok(accepted.requester.into())
    }

    async fn edit_user(
        &self,
        ctx: &Context<'_>,
        profile_pic: Option<String>,
        age: Option<i32>,
        bio: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> async_graphql::Result<UserObject> {
        let user_id = require_caller(ctx)?;
        let user = state(ctx)?
            .user_service
            .edit_profile(
                user_id,
                EditProfileRequest {
                    first_name,
                    last_name,
                    age,
                    bio,
                    profile_pic,
                },
            )
            .await
            .into_gql()?;
        Ok(user.into())
    }

    async fn like(
        &self,
        ctx: &Context<'_>,
        post_id: Option<ID>,
    ) -> async_graphql::Result<PostObject> {
        let user_id = require_caller(ctx)?;
        let post_id: PostId = required_id("postId", post_id)?;
        let details = state(ctx)?
            .post_service
            .like(user_id, post_id)
            .await
            .into_gql()?;
        Ok(details.into())
    }

    async fn comment(
        &self,
        ctx: &Context<'_>,
        post_id: Option<ID>,
        content: Option<String>,
    ) -> async_graphql::Result<CommentObject> {
        let author_id = require_caller(ctx)?;
        let post_id: PostId = required_id("postId", post_id)?;
        let comment = state(ctx)?
            .post_service
            .comment(author_id, post_id, content)
            .await
            .into_gql()?;
        Ok(CommentObject(comment))
    }
}

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// 调用者作为发送者或接收者的新消息
    async fn message(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<impl Stream<Item = MessageObject>> {
        let user_id = require_caller(ctx)?;
        let stream = state(ctx)?.broadcaster.subscribe(user_id);
        Ok(stream.map(|event| MessageObject(event.message)))
    }
}

