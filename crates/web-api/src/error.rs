use application::{ApplicationError, StorageError};
use async_graphql::ErrorExtensions;
use domain::{DomainError, RepositoryError};

/// 对外暴露的错误：稳定的错误码 + 可读的消息，以 `extensions.code` 形式返回给客户端。
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_USER_INPUT", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHENTICATED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_SERVER_ERROR", message)
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.message.clone())
            .extend_with(|_, ext| ext.set("code", self.code))
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::InvalidArgument { field, reason } => {
                ApiError::bad_request(format!("{}: {}", field, reason))
            }
            DomainError::UserAlreadyExists => {
                ApiError::new("USER_EXISTS", "Email Already Exists!")
            }
            DomainError::UserNotFound => ApiError::new("USER_NOT_FOUND", "user not found"),
            DomainError::PostNotFound => ApiError::new("POST_NOT_FOUND", "post not found"),
            DomainError::FriendRequestNotFound => ApiError::new(
                "FRIEND_REQUEST_NOT_FOUND",
                "no pending friend request from this user",
            ),
            DomainError::AlreadyFriends => {
                ApiError::new("ALREADY_FRIENDS", "users are already friends")
            }
            DomainError::FriendRequestPending => ApiError::new(
                "FRIEND_REQUEST_PENDING",
                "this user already sent you a friend request",
            ),
            DomainError::SelfRelation => {
                ApiError::bad_request("cannot target your own account")
            }
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Domain(err) => err.into(),
            ApplicationError::Repository(RepositoryError::NotFound) => {
                ApiError::new("NOT_FOUND", "requested resource not found")
            }
            ApplicationError::Repository(RepositoryError::Conflict) => {
                ApiError::new("CONFLICT", "resource already exists")
            }
            ApplicationError::Repository(RepositoryError::Storage { message }) => {
                tracing::error!(%message, "数据库错误");
                ApiError::internal_server_error("internal server error")
            }
            ApplicationError::Password(err) => {
                tracing::error!(error = %err, "密码哈希失败");
                ApiError::internal_server_error("internal server error")
            }
            ApplicationError::Storage(StorageError::InvalidName(name)) => {
                ApiError::bad_request(format!("invalid file name: {name}"))
            }
            ApplicationError::Storage(err @ StorageError::Upload(_)) => {
                tracing::error!(error = %err, "文件上传失败");
                ApiError::new("UPLOAD_FAILED", "file upload failed")
            }
            ApplicationError::Authentication => ApiError::unauthorized("Invalid credentials"),
            ApplicationError::Authorization => ApiError::forbidden("not allowed"),
        }
    }
}

/// 把服务层结果转换为带错误码的 GraphQL 结果
pub trait GraphqlResultExt<T> {
    fn into_gql(self) -> async_graphql::Result<T>;
}

impl<T, E> GraphqlResultExt<T> for Result<T, E>
where
    E: Into<ApiError>,
{
    fn into_gql(self) -> async_graphql::Result<T> {
        self.map_err(|err| err.into().extend())
    }
}
