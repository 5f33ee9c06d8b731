//! 在线状态按连接计数

mod support;

use std::{sync::Arc, time::Duration};

use application::{
    ConnectionPresenceManager, InMemoryStore, PresenceManager, UserRepository, UserService,
};
use async_trait::async_trait;
use domain::{RepositoryError, User, UserEmail, UserId};
use support::TestServices;
use tokio::sync::Notify;

/// 对指定用户的在线状态写入挂起，直到收到放行通知
struct StalledUsers {
    inner: InMemoryStore,
    stalled: UserId,
    release: Arc<Notify>,
}

#[async_trait]
impl UserRepository for StalledUsers {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        UserRepository::create(&self.inner, user).await
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        UserRepository::update(&self.inner, user).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::find_by_id(&self.inner, id).await
    }

    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError> {
        UserRepository::find_by_email(&self.inner, email).await
    }

    async fn search_by_name(&self, query: &str, limit: i64) -> Result<Vec<User>, RepositoryError> {
        UserRepository::search_by_name(&self.inner, query, limit).await
    }

    async fn set_online(&self, id: UserId, online: bool) -> Result<(), RepositoryError> {
        if id == self.stalled {
            self.release.notified().await;
        }
        UserRepository::set_online(&self.inner, id, online).await
    }
}

async fn is_online(users: &UserService, user_id: domain::UserId) -> bool {
    users.get_user(user_id).await.unwrap().online
}

#[tokio::test]
async fn user_stays_online_until_last_connection_closes() {
    let services = TestServices::new();
    let ada = services.register("Ada", "ada@example.com").await;
    let presence = ConnectionPresenceManager::new(Arc::new(services.store.clone()));

    assert!(!is_online(&services.users, ada.id).await);

    presence.connected(ada.id).await.unwrap();
    presence.connected(ada.id).await.unwrap();
    assert!(is_online(&services.users, ada.id).await);
    assert_eq!(presence.connection_count(ada.id).await, 2);

    presence.disconnected(ada.id).await.unwrap();
    assert!(is_online(&services.users, ada.id).await);

    presence.disconnected(ada.id).await.unwrap();
    assert!(!is_online(&services.users, ada.id).await);
    assert_eq!(presence.connection_count(ada.id).await, 0);

    // 多余的断开通知被忽略
    presence.disconnected(ada.id).await.unwrap();
    assert!(!is_online(&services.users, ada.id).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_connections_balance_out() {
    let services = TestServices::new();
    let ada = services.register("Ada", "ada@example.com").await;
    let presence = Arc::new(ConnectionPresenceManager::new(Arc::new(services.store.clone())));

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let presence = presence.clone();
            let user_id = ada.id;
            tokio::spawn(async move {
                presence.connected(user_id).await.unwrap();
                tokio::task::yield_now().await;
                presence.disconnected(user_id).await.unwrap();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(presence.connection_count(ada.id).await, 0);
    assert!(!is_online(&services.users, ada.id).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_presence_write_does_not_block_other_users() {
    let services = TestServices::new();
    let ada = services.register("Ada", "ada@example.com").await;
    let bob = services.register("Bob", "bob@example.com").await;
    let release = Arc::new(Notify::new());
    let presence = Arc::new(ConnectionPresenceManager::new(Arc::new(StalledUsers {
        inner: services.store.clone(),
        stalled: ada.id,
        release: release.clone(),
    })));

    let ada_connect = {
        let presence = presence.clone();
        tokio::spawn(async move { presence.connected(ada.id).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    tokio::time::timeout(Duration::from_secs(1), presence.connected(bob.id))
        .await
        .expect("bob must not wait behind ada")
        .unwrap();
    assert!(is_online(&services.users, bob.id).await);
    assert!(!is_online(&services.users, ada.id).await);

    release.notify_one();
    ada_connect.await.unwrap().unwrap();
    assert!(is_online(&services.users, ada.id).await);
}
