use std::sync::Arc;

use domain::{
    Chatroom, ChatroomId, DomainError, FriendRequest, RepositoryError, User, UserId, UserSummary,
};

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{FriendshipRepository, UserRepository},
};

/// 接受好友请求的结果：请求发起人和两人的会话
#[derive(Debug, Clone)]
pub struct AcceptedFriendship {
    pub requester: User,
    pub chatroom: Chatroom,
}

pub struct FriendshipServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub friendship_repository: Arc<dyn FriendshipRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct FriendshipService {
    deps: FriendshipServiceDependencies,
}

impl FriendshipService {
    pub fn new(deps: FriendshipServiceDependencies) -> Self {
        Self { deps }
    }

    /// 发出好友请求，返回发起人 ID。重复发送同一请求不会产生新记录。
    #[tracing::instrument(skip_all, fields(requester = %requester_id, target = %target_id))]
    pub async fn send_request(
        &self,
        requester_id: UserId,
        target_id: UserId,
    ) -> Result<UserId, ApplicationError> {
        let request = FriendRequest::new(requester_id, target_id, self.deps.clock.now())?;
        self.deps
            .user_repository
            .find_by_id(target_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        let prior = self
            .deps
            .friendship_repository
            .create_request(request)
            .await?;
        if prior.check_request()? {
            tracing::info!("好友请求已发出");
        }
        Ok(requester_id)
    }

    /// 接受 `requester_id` 发来的请求；删除待处理请求、建立双向好友关系并确保会话存在，
    /// 三步在同一事务内完成。
    #[tracing::instrument(skip_all, fields(accepter = %accepter_id, requester = %requester_id))]
    pub async fn accept_request(
        &self,
        accepter_id: UserId,
        requester_id: UserId,
    ) -> Result<AcceptedFriendship, ApplicationError> {
        let candidate = Chatroom::open(
            ChatroomId::generate(),
            accepter_id,
            requester_id,
            self.deps.clock.now(),
        )?;

        let chatroom = self
            .deps
            .friendship_repository
            .accept_request(accepter_id, requester_id, candidate)
            .await
            .map_err(|err| match err {
                RepositoryError::NotFound => DomainError::FriendRequestNotFound.into(),
                other => ApplicationError::from(other),
            })?;

        let requester = self
            .deps
            .user_repository
            .find_by_id(requester_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        tracing::info!(chatroom_id = %chatroom.id, "好友请求已接受");
        Ok(AcceptedFriendship {
            requester,
            chatroom,
        })
    }

    pub async fn friends(&self, user_id: UserId) -> Result<Vec<UserSummary>, ApplicationError> {
        Ok(self.deps.friendship_repository.friends_of(user_id).await?)
    }

    pub async fn outgoing(&self, user_id: UserId) -> Result<Vec<UserSummary>, ApplicationError> {
        Ok(self
            .deps
            .friendship_repository
            .outgoing_requests(user_id)
            .await?)
    }

    pub async fn incoming(&self, user_id: UserId) -> Result<Vec<UserSummary>, ApplicationError> {
        Ok(self
            .deps
            .friendship_repository
            .incoming_requests(user_id)
            .await?)
    }
}
