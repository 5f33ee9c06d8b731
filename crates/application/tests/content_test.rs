//! 资料、搜索与帖子

mod support;

use application::{ApplicationError, CreatePostRequest, EditProfileRequest, UserRepository};
use domain::{DomainError, PostId};
use support::TestServices;

#[tokio::test]
async fn profile_edit_keeps_unspecified_fields() {
    let services = TestServices::new();
    let ada = services.register("Ada", "ada@example.com").await;

    let edited = services
        .users
        .edit_profile(
            ada.id,
            EditProfileRequest {
                bio: Some("compilers".into()),
                age: Some(36),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(edited.bio.as_deref(), Some("compilers"));
    assert_eq!(edited.age.value(), 36);
    assert_eq!(edited.first_name.as_str(), "Ada");
    assert_eq!(edited.profile_pic, None);

    let invalid = services
        .users
        .edit_profile(
            ada.id,
            EditProfileRequest {
                age: Some(0),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        invalid,
        Err(ApplicationError::Domain(DomainError::InvalidArgument { .. }))
    ));
}

#[tokio::test]
async fn search_is_case_insensitive() {
    let services = TestServices::new();
    let ada = services.register("Ada", "ada@example.com").await;
    services.register("Bob", "bob@example.com").await;

    let found = services.users.search("aDa").await.unwrap();
    assert_eq!(found.iter().map(|u| u.id).collect::<Vec<_>>(), vec![ada.id]);

    // 所有人的姓都是 Tester
    assert_eq!(services.users.search("tester").await.unwrap().len(), 2);
    assert!(services.users.search("  ").await.unwrap().is_empty());
}

#[tokio::test]
async fn search_limit_keeps_alphabetical_prefix() {
    let services = TestServices::new();
    let carol = services.register("Carol", "carol@example.com").await;
    let alice = services.register("Alice", "alice@example.com").await;
    services.register("Dave", "dave@example.com").await;
    let bob = services.register("Bob", "bob@example.com").await;

    let found = UserRepository::search_by_name(&services.store, "tester", 3)
        .await
        .unwrap();
    assert_eq!(
        found.iter().map(|u| u.id).collect::<Vec<_>>(),
        vec![alice.id, bob.id, carol.id]
    );
}

#[tokio::test]
async fn likes_are_idempotent_and_comments_newest_first() {
    let services = TestServices::new();
    let ada = services.register("Ada", "ada@example.com").await;
    let bob = services.register("Bob", "bob@example.com").await;

    let post = services
        .posts
        .create_post(CreatePostRequest {
            author_id: ada.id,
            content: Some("hello world".into()),
            image_url: None,
            link: None,
        })
        .await
        .unwrap();

    services.posts.like(bob.id, post.id).await.unwrap();
    let details = services.posts.like(bob.id, post.id).await.unwrap();
    assert_eq!(details.likes.len(), 1);

    services
        .posts
        .comment(bob.id, post.id, Some("first".into()))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    services
        .posts
        .comment(ada.id, post.id, Some("second".into()))
        .await
        .unwrap();

    let details = services.posts.get_post(post.id).await.unwrap();
    let comments: Vec<&str> = details.comments.iter().map(|c| c.comment.as_str()).collect();
    assert_eq!(comments, vec!["second", "first"]);

    let missing = services.posts.like(bob.id, PostId::generate()).await;
    assert!(matches!(missing, Err(ApplicationError::Domain(DomainError::PostNotFound))));

    let blank = services.posts.comment(bob.id, post.id, None).await;
    assert!(matches!(
        blank,
        Err(ApplicationError::Domain(DomainError::InvalidArgument { .. }))
    ));
}
