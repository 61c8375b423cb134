use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    models::users::{User, UserRole},
    Result,
};

use super::PostgresRepo;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User>;
}

#[async_trait]
impl UserRepository for PostgresRepo {
    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        tracing::debug!(user_found = user.is_some(), "User query completed");

        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password, role, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}
