use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    middleware::Principal,
    models::users::{User, UserRole},
    repositories::user_repo::UserRepository,
    Error, Result,
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    jwt_secret: String,
    /// Hours.
    jwt_expiration: i64,
    admin_email: String,
    admin_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: UserRole,
    iat: usize,
    exp: usize,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        jwt_secret: String,
        jwt_expiration: i64,
        admin_email: String,
        admin_password: String,
    ) -> Self {
        Self {
            user_repo,
            jwt_secret,
            jwt_expiration,
            admin_email,
            admin_password,
        }
    }

    pub fn session_hours(&self) -> i64 {
        self.jwt_expiration
    }

    /// Checks the configured admin credentials and issues an admin token.
    pub fn admin_login(&self, email: &str, password: &str) -> Result<String> {
        if email != self.admin_email || password != self.admin_password {
            warn!("Rejected admin login");
            return Err(Error::Unauthorized);
        }

        info!("Admin logged in");
        self.generate_token(email, UserRole::Admin)
    }

    #[instrument(skip(self, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(User, String)> {
        if self.user_repo.find_by_email(email).await?.is_some() {
            return Err(Error::Validation("User already exists".to_string()));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string();

        let user = self
            .user_repo
            .create_user(name.trim(), email, &password_hash, UserRole::User)
            .await?;

        let token = self.generate_token(&user.id.to_string(), user.role)?;
        Ok((user, token))
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        let invalid = || Error::Validation("Invalid credentials".to_string());

        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(invalid)?;

        let parsed_hash = PasswordHash::new(&user.password)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| invalid())?;

        let token = self.generate_token(&user.id.to_string(), user.role)?;
        Ok((user, token))
    }

    fn generate_token(&self, subject: &str, role: UserRole) -> Result<String> {
        let now = Utc::now();
        let exp = (now + Duration::hours(self.jwt_expiration)).timestamp() as usize;
        let iat = now.timestamp() as usize;
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat,
            exp,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| Error::Internal(format!("Token encoding failed: {e}")))
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("User"))
    }

    /// Verifies the signature and expiry and extracts the principal.
    pub fn verify_token(&self, token: &str) -> Result<Principal> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| Error::Unauthorized)?
        .claims;

        match claims.role {
            UserRole::Admin => Ok(Principal::Admin { email: claims.sub }),
            UserRole::User => {
                let user_id = Uuid::parse_str(&claims.sub).map_err(|_| Error::Unauthorized)?;
                Ok(Principal::Viewer { user_id })
            }
        }
    }
}
