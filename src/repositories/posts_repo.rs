use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    models::posts::{NewPost, Post, PostFields, PostFilter, StoredImage},
    Result,
};

use super::PostgresRepo;

const POST_COLUMNS: &str = "id, title, sub_title, description, category, image, image_id, \
                            is_published, created_at, updated_at";

#[async_trait]
pub trait PostRepository: Sync + Send {
    async fn insert_post(&self, new_post: NewPost) -> Result<Post>;
    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>>;
    /// Newest first. `limit = None` returns every matching row.
    async fn list_posts(&self, filter: PostFilter, limit: Option<i64>) -> Result<Vec<Post>>;
    /// Overwrites every field; the image pair is replaced only when `image` is given.
    async fn update_post(
        &self,
        post_id: Uuid,
        fields: &PostFields,
        image: Option<&StoredImage>,
    ) -> Result<Option<Post>>;
    async fn toggle_published(&self, post_id: Uuid) -> Result<Option<Post>>;
    async fn delete_post(&self, post_id: Uuid) -> Result<bool>;
    async fn count_posts(&self, is_published: Option<bool>) -> Result<i64>;
}

#[async_trait]
impl PostRepository for PostgresRepo {
    #[instrument(skip(self, new_post), fields(title = %new_post.fields.title))]
    async fn insert_post(&self, new_post: NewPost) -> Result<Post> {
        let NewPost { fields, image } = new_post;

        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO blogs (id, title, sub_title, description, category, image, image_id, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(fields.title)
        .bind(fields.sub_title)
        .bind(fields.description)
        .bind(fields.category)
        .bind(image.url)
        .bind(image.handle)
        .bind(fields.is_published)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM blogs WHERE id = $1"
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn list_posts(&self, filter: PostFilter, limit: Option<i64>) -> Result<Vec<Post>> {
        let published_only = matches!(filter, PostFilter::Published);

        let posts = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS} FROM blogs
            WHERE ($1 = FALSE OR is_published = TRUE)
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(published_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    #[instrument(skip(self, fields, image))]
    async fn update_post(
        &self,
        post_id: Uuid,
        fields: &PostFields,
        image: Option<&StoredImage>,
    ) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE blogs
            SET title = $2,
                sub_title = $3,
                description = $4,
                category = $5,
                is_published = $6,
                image = COALESCE($7, image),
                image_id = COALESCE($8, image_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post_id)
        .bind(&fields.title)
        .bind(&fields.sub_title)
        .bind(&fields.description)
        .bind(fields.category)
        .bind(fields.is_published)
        .bind(image.map(|i| i.url.as_str()))
        .bind(image.map(|i| i.handle.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn toggle_published(&self, post_id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE blogs
            SET is_published = NOT is_published,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_posts(&self, is_published: Option<bool>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM blogs WHERE ($1::BOOLEAN IS NULL OR is_published = $1)",
        )
        .bind(is_published)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
