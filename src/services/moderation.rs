use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    models::comments::{AdminComment, Comment},
    repositories::{comments_repo::CommentRepository, posts_repo::PostRepository},
    Error, Result,
};

/// Comment moderation. Readers only ever see approved comments.
#[derive(Clone)]
pub struct ModerationService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl ModerationService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    /// Stores the comment unapproved. The caller gets no copy back.
    #[instrument(skip(self, name, content))]
    pub async fn submit(&self, post_id: Uuid, name: &str, content: &str) -> Result<()> {
        let name = name.trim();
        let content = content.trim();
        if name.is_empty() {
            return Err(Error::Validation("Name is required".to_string()));
        }
        if content.is_empty() {
            return Err(Error::Validation("Comment is required".to_string()));
        }

        if self.posts.find_post(post_id).await?.is_none() {
            return Err(Error::not_found("Blog"));
        }

        let comment = self.comments.insert_comment(post_id, name, content).await?;
        info!(comment_id = %comment.id, "Comment submitted for review");
        Ok(())
    }

    pub async fn list_approved_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let comments = self.comments.list_comments_for_post(post_id, true).await?;
        Ok(comments.into_iter().filter(|c| c.is_approved).collect())
    }

    pub async fn list_all_for_admin(&self) -> Result<Vec<AdminComment>> {
        self.comments.list_all_comments().await
    }

    /// Idempotent; there is no way back to unapproved.
    #[instrument(skip(self))]
    pub async fn approve(&self, comment_id: Uuid) -> Result<Comment> {
        let comment = self
            .comments
            .approve_comment(comment_id)
            .await?
            .ok_or_else(|| Error::not_found("Comment"))?;

        info!("Comment approved");
        Ok(comment)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, comment_id: Uuid) -> Result<()> {
        if !self.comments.delete_comment(comment_id).await? {
            return Err(Error::not_found("Comment"));
        }

        info!("Comment deleted");
        Ok(())
    }
}
