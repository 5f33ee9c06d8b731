//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、事务边界、
//! 以及对外部适配器（例如密码哈希、消息广播、对象存储）的抽象。

pub mod broadcaster;
pub mod clock;
pub mod error;
pub mod local_broadcast;
pub mod memory;
pub mod password;
pub mod presence;
pub mod repository;
pub mod services;
pub mod storage;

pub use broadcaster::{BroadcastError, MessageBroadcaster, MessageCreated};
pub use clock::{Clock, SystemClock};
pub use error::ApplicationError;
pub use local_broadcast::{LocalMessageBroadcaster, MessageStream};
pub use memory::InMemoryStore;
pub use password::{PasswordHasher, PasswordHasherError};
pub use presence::{ConnectionPresenceManager, PresenceManager};
pub use repository::{
    ConversationRepository, FriendshipRepository, PostRepository, UserRepository,
};
pub use services::{
    AcceptedFriendship, AuthenticateUserRequest, Conversation, CreatePostRequest,
    EditProfileRequest, FriendshipService, FriendshipServiceDependencies, MessagingService,
    MessagingServiceDependencies, PostService, PostServiceDependencies, RegisterUserRequest,
    SendMessageRequest, StoredFile, UploadService, UserService, UserServiceDependencies,
};
pub use storage::{ObjectStorage, StorageError};
