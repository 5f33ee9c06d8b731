//! 测试辅助：内存仓储 + 明文密码哈希
#![allow(dead_code)]

use std::sync::Arc;

use application::{
    AuthenticateUserRequest, FriendshipService, FriendshipServiceDependencies, InMemoryStore,
    LocalMessageBroadcaster, MessagingService, MessagingServiceDependencies, PasswordHasher,
    PasswordHasherError, PostService, PostServiceDependencies, RegisterUserRequest, SystemClock,
    UserService, UserServiceDependencies,
};
use async_trait::async_trait;
use domain::{PasswordHash, User};

/// 测试用哈希器，不做真正的哈希
pub struct PlainHasher;

#[async_trait]
impl PasswordHasher for PlainHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(format!("plain:{plaintext}"))
            .map_err(|e| PasswordHasherError::hash(e.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(hashed.as_str() == format!("plain:{plaintext}"))
    }
}

pub struct TestServices {
    pub store: InMemoryStore,
    pub broadcaster: LocalMessageBroadcaster,
    pub users: UserService,
    pub friendships: FriendshipService,
    pub messaging: Arc<MessagingService>,
    pub posts: PostService,
}

impl TestServices {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let broadcaster = LocalMessageBroadcaster::new(64);
        let clock = Arc::new(SystemClock);

        let users = UserService::new(UserServiceDependencies {
            user_repository: Arc::new(store.clone()),
            password_hasher: Arc::new(PlainHasher),
            clock: clock.clone(),
        });
        let friendships = FriendshipService::new(FriendshipServiceDependencies {
            user_repository: Arc::new(store.clone()),
            friendship_repository: Arc::new(store.clone()),
            clock: clock.clone(),
        });
        let messaging = Arc::new(MessagingService::new(MessagingServiceDependencies {
            user_repository: Arc::new(store.clone()),
            conversation_repository: Arc::new(store.clone()),
            broadcaster: Arc::new(broadcaster.clone()),
            clock: clock.clone(),
        }));
        let posts = PostService::new(PostServiceDependencies {
            post_repository: Arc::new(store.clone()),
            clock,
        });

        Self {
            store,
            broadcaster,
            users,
            friendships,
            messaging,
            posts,
        }
    }

    pub async fn register(&self, first_name: &str, email: &str) -> User {
        self.users
            .register(RegisterUserRequest {
                first_name: Some(first_name.to_string()),
                last_name: Some("Tester".to_string()),
                email: Some(email.to_string()),
                age: Some(28),
                password: Some("hunter2".to_string()),
            })
            .await
            .expect("register user")
    }

    pub fn login_request(email: &str, password: &str) -> AuthenticateUserRequest {
        AuthenticateUserRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }
}
