//! 内存实现的仓储，用于本地开发和测试。
//!
//! 所有状态放在一把异步互斥锁之后，每个仓储方法在持锁期间完成全部读写，
//! 因此多步骤操作与数据库事务具有相同的原子性。

use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    Chatroom, ChatroomId, Comment, FriendRequest, Like, Message, MessageDraft, ParticipantPair,
    Post, PostId, Relation, RepositoryError, User, UserEmail, UserId, UserSummary,
};
use tokio::sync::Mutex;

use crate::repository::{
    ConversationRepository, FriendshipRepository, PostRepository, UserRepository,
};

#[derive(Default)]
struct State {
    users: Vec<User>,
    requests: Vec<FriendRequest>,
    /// 双向存储：(user, friend)
    friendships: Vec<(UserId, UserId)>,
    chatrooms: Vec<Chatroom>,
    messages: Vec<Message>,
    posts: Vec<Post>,
    likes: Vec<Like>,
    comments: Vec<Comment>,
}

impl State {
    fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn summaries(&self, ids: impl Iterator<Item = UserId>) -> Vec<UserSummary> {
        ids.filter_map(|id| self.user(id).map(User::summary)).collect()
    }

    fn relation(&self, user_id: UserId, other_id: UserId) -> Relation {
        if self.friendships.contains(&(user_id, other_id)) {
            Relation::Friends
        } else if self.has_request(user_id, other_id) {
            Relation::Outgoing
        } else if self.has_request(other_id, user_id) {
            Relation::Incoming
        } else {
            Relation::None
        }
    }

    fn has_request(&self, requester: UserId, target: UserId) -> bool {
        self.requests
            .iter()
            .any(|r| r.requester_id == requester && r.target_id == target)
    }

    fn chatroom_between(&self, a: UserId, b: UserId) -> Option<&Chatroom> {
        self.chatrooms
            .iter()
            .find(|c| c.has_participant(a) && c.has_participant(b))
    }

    /// 返回已有会话，否则写入候选会话
    fn ensure_chatroom(&mut self, candidate: Chatroom) -> Chatroom {
        if let Some(existing) = self.chatroom_between(candidate.user1_id, candidate.user2_id) {
            return existing.clone();
        }
        self.chatrooms.push(candidate.clone());
        candidate
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 两人之间会话的数量，用于校验会话唯一性
    pub async fn chatroom_count_between(&self, a: UserId, b: UserId) -> usize {
        let state = self.state.lock().await;
        state
            .chatrooms
            .iter()
            .filter(|c| c.has_participant(a) && c.has_participant(b))
            .count()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        let taken = state
            .users
            .iter()
            .any(|u| u.email.as_str().eq_ignore_ascii_case(user.email.as_str()));
        if taken {
            return Err(RepositoryError::Conflict);
        }
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        let slot = state
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.state.lock().await.user(id).cloned())
    }

    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.email.as_str().eq_ignore_ascii_case(email.as_str()))
            .cloned())
    }

    async fn search_by_name(&self, query: &str, limit: i64) -> Result<Vec<User>, RepositoryError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let state = self.state.lock().await;
        let mut found: Vec<User> = state
            .users
            .iter()
            .filter(|u| u.name_matches(query))
            .cloned()
            .collect();
        // 与 PostgreSQL 实现相同的排序，截断后返回同一批结果
        found.sort_by(|a, b| {
            (a.first_name.as_str(), a.last_name.as_str())
                .cmp(&(b.first_name.as_str(), b.last_name.as_str()))
        });
        found.truncate(limit);
        Ok(found)
    }

    async fn set_online(&self, id: UserId, online: bool) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        user.online = online;
        Ok(())
    }
}

#[async_trait]
impl FriendshipRepository for InMemoryStore {
    async fn create_request(&self, request: FriendRequest) -> Result<Relation, RepositoryError> {
        let mut state = self.state.lock().await;
        let prior = state.relation(request.requester_id, request.target_id);
        if prior == Relation::None {
            state.requests.push(request);
        }
        Ok(prior)
    }

    async fn accept_request(
        &self,
        accepter_id: UserId,
        requester_id: UserId,
        chatroom: Chatroom,
    ) -> Result<Chatroom, RepositoryError> {
        let mut state = self.state.lock().await;
        let position = state
            .requests
            .iter()
            .position(|r| r.requester_id == requester_id && r.target_id == accepter_id)
            .ok_or(RepositoryError::NotFound)?;
        state.requests.remove(position);

        for edge in [(accepter_id, requester_id), (requester_id, accepter_id)] {
            if !state.friendships.contains(&edge) {
                state.friendships.push(edge);
            }
        }
        Ok(state.ensure_chatroom(chatroom))
    }

    async fn friends_of(&self, user_id: UserId) -> Result<Vec<UserSummary>, RepositoryError> {
        let state = self.state.lock().await;
        let ids = state
            .friendships
            .iter()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, friend)| *friend);
        Ok(state.summaries(ids))
    }

    async fn outgoing_requests(
        &self,
        user_id: UserId,
    ) -> Result<Vec<UserSummary>, RepositoryError> {
        let state = self.state.lock().await;
        let ids = state
            .requests
            .iter()
            .filter(|r| r.requester_id == user_id)
            .map(|r| r.target_id);
        Ok(state.summaries(ids))
    }

    async fn incoming_requests(
        &self,
        user_id: UserId,
    ) -> Result<Vec<UserSummary>, RepositoryError> {
        let state = self.state.lock().await;
        let ids = state
            .requests
            .iter()
            .filter(|r| r.target_id == user_id)
            .map(|r| r.requester_id);
        Ok(state.summaries(ids))
    }
}

#[async_trait]
impl ConversationRepository for InMemoryStore {
    async fn find_between(
        &self,
        pair: ParticipantPair,
    ) -> Result<Option<Chatroom>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.chatroom_between(pair.low(), pair.high()).cloned())
    }

    async fn append_message(
        &self,
        candidate: Chatroom,
        draft: MessageDraft,
    ) -> Result<Message, RepositoryError> {
        let mut state = self.state.lock().await;
        let chatroom = state.ensure_chatroom(candidate);
        let message = draft.into_message(chatroom.id);
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Chatroom>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .chatrooms
            .iter()
            .filter(|c| c.has_participant(user_id))
            .cloned()
            .collect())
    }

    async fn messages(&self, chatroom_id: ChatroomId) -> Result<Vec<Message>, RepositoryError> {
        let state = self.state.lock().await;
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.chatroom_id == chatroom_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: Post) -> Result<Post, RepositoryError> {
        self.state.lock().await.posts.push(post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list_by_author(&self, author_id: UserId) -> Result<Vec<Post>, RepositoryError> {
        let state = self.state.lock().await;
        let mut posts: Vec<Post> = state
            .posts
            .iter()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn add_like(&self, like: Like) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let exists = state
            .likes
            .iter()
            .any(|l| l.post_id == like.post_id && l.user_id == like.user_id);
        if !exists {
            state.likes.push(like);
        }
        Ok(())
    }

    async fn likes(&self, post_id: PostId) -> Result<Vec<Like>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .likes
            .iter()
            .filter(|l| l.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn add_comment(&self, comment: Comment) -> Result<Comment, RepositoryError> {
        self.state.lock().await.comments.push(comment.clone());
        Ok(comment)
    }

    async fn comments(&self, post_id: PostId) -> Result<Vec<Comment>, RepositoryError> {
        let state = self.state.lock().await;
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }
}
