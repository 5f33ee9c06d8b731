use std::sync::Arc;

use domain::{Comment, CommentId, DomainError, Like, Post, PostDetails, PostId, UserId};

use crate::{clock::Clock, error::ApplicationError, repository::PostRepository};

#[derive(Debug, Clone)]
pub struct CreatePostRequest {
    pub author_id: UserId,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
}

pub struct PostServiceDependencies {
    pub post_repository: Arc<dyn PostRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct PostService {
    deps: PostServiceDependencies,
}

impl PostService {
    pub fn new(deps: PostServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create_post(&self, request: CreatePostRequest) -> Result<Post, ApplicationError> {
        let post = Post::publish(
            PostId::generate(),
            request.author_id,
            request.content,
            request.image_url,
            request.link,
            self.deps.clock.now(),
        )?;
        Ok(self.deps.post_repository.create(post).await?)
    }

    pub async fn get_post(&self, post_id: PostId) -> Result<PostDetails, ApplicationError> {
        let post = self
            .deps
            .post_repository
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::PostNotFound)?;
        let likes = self.deps.post_repository.likes(post_id).await?;
        let comments = self.deps.post_repository.comments(post_id).await?;
        Ok(PostDetails {
            post,
            likes,
            comments,
        })
    }

    /// 作者的帖子，按时间倒序
    pub async fn posts_by_author(&self, author_id: UserId) -> Result<Vec<Post>, ApplicationError> {
        Ok(self.deps.post_repository.list_by_author(author_id).await?)
    }

    /// 点赞，重复点赞无副作用；返回最新的帖子详情
    pub async fn like(
        &self,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<PostDetails, ApplicationError> {
        self.ensure_exists(post_id).await?;
        self.deps
            .post_repository
            .add_like(Like {
                post_id,
                user_id,
                created_at: self.deps.clock.now(),
            })
            .await?;
        self.get_post(post_id).await
    }

    pub async fn comment(
        &self,
        author_id: UserId,
        post_id: PostId,
        content: Option<String>,
    ) -> Result<Comment, ApplicationError> {
        let comment = Comment::write(
            CommentId::generate(),
            post_id,
            author_id,
            content.unwrap_or_default(),
            self.deps.clock.now(),
        )?;
        self.ensure_exists(post_id).await?;
        Ok(self.deps.post_repository.add_comment(comment).await?)
    }

    async fn ensure_exists(&self, post_id: PostId) -> Result<(), ApplicationError> {
        self.deps
            .post_repository
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::PostNotFound)?;
        Ok(())
    }
}
