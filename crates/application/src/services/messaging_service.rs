use std::sync::Arc;

use domain::{
    Chatroom, ChatroomId, DomainError, Message, MessageContent, MessageDraft, MessageId,
    ParticipantPair, UserId, UserSummary,
};

use crate::{
    broadcaster::{MessageBroadcaster, MessageCreated},
    clock::Clock,
    error::ApplicationError,
    repository::{ConversationRepository, UserRepository},
};

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: Option<String>,
}

/// 会话及其参与者和按时间升序排列的消息
#[derive(Debug, Clone)]
pub struct Conversation {
    pub chatroom: Chatroom,
    pub user1: UserSummary,
    pub user2: UserSummary,
    pub messages: Vec<Message>,
}

pub struct MessagingServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub conversation_repository: Arc<dyn ConversationRepository>,
    pub broadcaster: Arc<dyn MessageBroadcaster>,
    pub clock: Arc<dyn Clock>,
}

pub struct MessagingService {
    deps: MessagingServiceDependencies,
}

impl MessagingService {
    pub fn new(deps: MessagingServiceDependencies) -> Self {
        Self { deps }
    }

    /// 发送私信。
    ///
    /// 查找或创建会话与写入消息在同一事务内完成；写入成功后再推送事件，
    /// 推送失败只记录日志，不影响已保存的消息。
    #[tracing::instrument(
        skip_all,
        fields(sender = %request.sender_id, receiver = %request.receiver_id)
    )]
    pub async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<Message, ApplicationError> {
        let content = request
            .content
            .ok_or_else(|| DomainError::invalid_argument("content", "is required"))?;
        let content = MessageContent::new(content)?;
        let now = self.deps.clock.now();

        let draft = MessageDraft::new(
            MessageId::generate(),
            request.sender_id,
            request.receiver_id,
            content,
            now,
        )?;
        self.deps
            .user_repository
            .find_by_id(request.receiver_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        // 首次联系时发送者占据第一个槽位
        let candidate = Chatroom::open(
            ChatroomId::generate(),
            request.sender_id,
            request.receiver_id,
            now,
        )?;
        let message = self
            .deps
            .conversation_repository
            .append_message(candidate, draft)
            .await?;

        if let Err(broadcast_error) = self
            .deps
            .broadcaster
            .broadcast(MessageCreated::new(message.clone()))
            .await
        {
            tracing::warn!(
                message_id = %message.id,
                chatroom_id = %message.chatroom_id,
                error = %broadcast_error,
                "消息已保存，但实时推送失败"
            );
        }

        Ok(message)
    }

    /// 两人之间的会话（如果存在）
    pub async fn chatroom_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Option<Chatroom>, ApplicationError> {
        let pair = ParticipantPair::new(a, b)?;
        Ok(self.deps.conversation_repository.find_between(pair).await?)
    }

    /// 会话中的消息，只有参与者可以查看
    pub async fn chatroom_messages(
        &self,
        viewer_id: UserId,
        chatroom: &Chatroom,
    ) -> Result<Vec<Message>, ApplicationError> {
        if !chatroom.has_participant(viewer_id) {
            return Err(ApplicationError::Authorization);
        }
        Ok(self
            .deps
            .conversation_repository
            .messages(chatroom.id)
            .await?)
    }

    pub async fn list_conversations(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Conversation>, ApplicationError> {
        let chatrooms = self
            .deps
            .conversation_repository
            .list_for_user(user_id)
            .await?;

        let mut conversations = Vec::with_capacity(chatrooms.len());
        for chatroom in chatrooms {
            let user1 = self.summary(chatroom.user1_id).await?;
            let user2 = self.summary(chatroom.user2_id).await?;
            let messages = self
                .deps
                .conversation_repository
                .messages(chatroom.id)
                .await?;
            conversations.push(Conversation {
                chatroom,
                user1,
                user2,
                messages,
            });
        }
        Ok(conversations)
    }

    async fn summary(&self, user_id: UserId) -> Result<UserSummary, ApplicationError> {
        let user = self
            .deps
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        Ok(user.summary())
    }
}
