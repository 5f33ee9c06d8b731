use std::{path::PathBuf, sync::Arc};

use application::{
    ConnectionPresenceManager, FriendshipService, FriendshipServiceDependencies,
    LocalMessageBroadcaster, MessagingService, MessagingServiceDependencies, PostService,
    PostServiceDependencies, PresenceManager, SystemClock, UploadService, UserService,
    UserServiceDependencies,
};
use config::{AppConfig, StorageBackend};
use infrastructure::Infrastructure;

use crate::auth::{IdentityResolver, JwtService};

/// 各用例服务与实时通道共享的状态
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub friendship_service: Arc<FriendshipService>,
    pub messaging_service: Arc<MessagingService>,
    pub post_service: Arc<PostService>,
    pub upload_service: Arc<UploadService>,
    pub broadcaster: LocalMessageBroadcaster,
    pub jwt_service: Arc<JwtService>,
    pub identity: IdentityResolver,
    pub presence: Arc<dyn PresenceManager>,
    /// 本地存储后端的根目录，需要由 HTTP 服务对外提供
    pub static_root: Option<PathBuf>,
}

impl AppState {
    pub fn new(infrastructure: Infrastructure, config: &AppConfig) -> Self {
        let repositories = infrastructure.repositories;
        let clock = Arc::new(SystemClock);
        let broadcaster = LocalMessageBroadcaster::new(config.broadcast.capacity);

        let user_service = Arc::new(UserService::new(UserServiceDependencies {
            user_repository: repositories.users.clone(),
            password_hasher: infrastructure.password_hasher,
            clock: clock.clone(),
        }));
        let friendship_service = Arc::new(FriendshipService::new(FriendshipServiceDependencies {
            user_repository: repositories.users.clone(),
            friendship_repository: repositories.friendships.clone(),
            clock: clock.clone(),
        }));
        let messaging_service = Arc::new(MessagingService::new(MessagingServiceDependencies {
            user_repository: repositories.users.clone(),
            conversation_repository: repositories.conversations.clone(),
            broadcaster: Arc::new(broadcaster.clone()),
            clock: clock.clone(),
        }));
        let post_service = Arc::new(PostService::new(PostServiceDependencies {
            post_repository: repositories.posts.clone(),
            clock,
        }));
        let upload_service = Arc::new(UploadService::new(infrastructure.object_storage));

        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        let identity = IdentityResolver::new(jwt_service.clone(), user_service.clone());
        let presence = Arc::new(ConnectionPresenceManager::new(repositories.users));
        let static_root = match config.storage.backend {
            StorageBackend::Local => Some(PathBuf::from(&config.storage.local_root)),
            StorageBackend::Gcs => None,
        };

        Self {
            user_service,
            friendship_service,
            messaging_service,
            post_service,
            upload_service,
            broadcaster,
            jwt_service,
            identity,
            presence,
            static_root,
        }
    }
}
