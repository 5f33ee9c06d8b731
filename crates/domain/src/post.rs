use crate::errors::DomainError;
use crate::value_objects::{CommentId, PostId, Timestamp, UserId};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub created_at: Timestamp,
}

impl Post {
    /// 正文、图片、链接至少要有一项。
    pub fn publish(
        id: PostId,
        author_id: UserId,
        content: Option<String>,
        image_url: Option<String>,
        link: Option<String>,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        let content = non_blank(content);
        let image_url = non_blank(image_url);
        let link = non_blank(link);
        if content.is_none() && image_url.is_none() && link.is_none() {
            return Err(DomainError::invalid_argument(
                "post",
                "content, imageUrl or link is required",
            ));
        }
        Ok(Self {
            id,
            author_id,
            content,
            image_url,
            link,
            created_at,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Like {
    pub post_id: PostId,
    pub user_id: UserId,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub comment: String,
    pub created_at: Timestamp,
}

impl Comment {
    pub fn write(
        id: CommentId,
        post_id: PostId,
        author_id: UserId,
        comment: impl Into<String>,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        let comment = comment.into();
        if comment.trim().is_empty() {
            return Err(DomainError::invalid_argument("comment", "cannot be empty"));
        }
        Ok(Self {
            id,
            post_id,
            author_id,
            comment,
            created_at,
        })
    }
}

/// 帖子及其点赞、评论。评论按时间倒序。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDetails {
    pub post: Post,
    pub likes: Vec<Like>,
    pub comments: Vec<Comment>,
}
