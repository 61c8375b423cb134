use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    models::comments::{AdminComment, Comment, CommentWithBlogRow},
    Error, Result,
};

use super::PostgresRepo;

#[async_trait]
pub trait CommentRepository: Sync + Send {
    /// Stores a new, unapproved comment. A blog that no longer exists is `NotFound`.
    async fn insert_comment(&self, blog_id: Uuid, name: &str, content: &str) -> Result<Comment>;
    async fn list_comments_for_post(&self, blog_id: Uuid, approved_only: bool)
        -> Result<Vec<Comment>>;
    async fn list_all_comments(&self) -> Result<Vec<AdminComment>>;
    async fn approve_comment(&self, comment_id: Uuid) -> Result<Option<Comment>>;
    async fn delete_comment(&self, comment_id: Uuid) -> Result<bool>;
    async fn delete_comments_for_post(&self, blog_id: Uuid) -> Result<u64>;
    async fn count_comments(&self) -> Result<i64>;
}

/// The blog can vanish between the existence check and the insert.
fn missing_blog_or_storage(err: sqlx::Error) -> Error {
    let orphaned = err
        .as_database_error()
        .is_some_and(|db_err| db_err.is_foreign_key_violation());

    if orphaned {
        Error::not_found("Blog")
    } else {
        Error::from(err)
    }
}

#[async_trait]
impl CommentRepository for PostgresRepo {
    #[instrument(skip(self, content))]
    async fn insert_comment(&self, blog_id: Uuid, name: &str, content: &str) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, blog_id, name, content, is_approved)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING id, blog_id, name, content, is_approved, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(blog_id)
        .bind(name)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(missing_blog_or_storage)?;

        Ok(comment)
    }

    async fn list_comments_for_post(
        &self,
        blog_id: Uuid,
        approved_only: bool,
    ) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, blog_id, name, content, is_approved, created_at
            FROM comments
            WHERE blog_id = $1 AND ($2 = FALSE OR is_approved = TRUE)
            ORDER BY created_at DESC
            "#,
        )
        .bind(blog_id)
        .bind(approved_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn list_all_comments(&self) -> Result<Vec<AdminComment>> {
        let rows = sqlx::query_as::<_, CommentWithBlogRow>(
            r#"
            SELECT c.id, c.blog_id, b.title AS blog_title, c.name, c.content, c.is_approved, c.created_at
            FROM comments c
            JOIN blogs b ON b.id = c.blog_id
            ORDER BY c.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AdminComment::from).collect())
    }

    async fn approve_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET is_approved = TRUE
            WHERE id = $1
            RETURNING id, blog_id, name, content, is_approved, created_at
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_comments_for_post(&self, blog_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM comments WHERE blog_id = $1")
            .bind(blog_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn count_comments(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
