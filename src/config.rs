use std::{env, str::FromStr, time::Duration};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub frontend_origin: String,
    pub jwt_secret: String,
    /// Session lifetime in hours.
    pub jwt_maxage: i64,
    pub cookie_secure: bool,
    pub admin_email: String,
    pub admin_password: String,
    pub cloudinary: CloudinaryConfig,
    pub gemini: GeminiConfig,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl Config {
    pub fn init() -> Result<Config> {
        dotenv::dotenv().ok();

        let max_upload_mb: usize = optional("MAX_UPLOAD_MB", 5)?;

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            database_max_connections: optional("DATABASE_MAX_CONNECTIONS", 10)?,
            port: optional("PORT", 5000)?,
            frontend_origin: optional("FRONTEND_ORIGIN", "http://localhost:5173".to_string())?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_maxage: optional("JWT_MAXAGE", 24 * 7)?,
            cookie_secure: optional("COOKIE_SECURE", false)?,
            admin_email: required("ADMIN_EMAIL")?,
            admin_password: required("ADMIN_PASSWORD")?,
            cloudinary: CloudinaryConfig {
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: required("CLOUDINARY_API_SECRET")?,
                folder: optional("CLOUDINARY_FOLDER", "blogs".to_string())?,
            },
            gemini: GeminiConfig {
                api_key: required("GEMINI_API_KEY")?,
                model: optional("GEMINI_MODEL", "gemini-2.0-flash".to_string())?,
                timeout: Duration::from_secs(optional("GENERATION_TIMEOUT_SECS", 30)?),
            },
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}

fn required(key: &str) -> Result<String> {
    let value = env::var(key).with_context(|| format!("{key} must be set"))?;
    anyhow::ensure!(!value.trim().is_empty(), "{key} cannot be empty");
    Ok(value)
}

fn optional<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        _ => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Config {
        Config {
            database_url: "postgres://localhost/blog_test".to_string(),
            database_max_connections: 1,
            port: 0,
            frontend_origin: "http://localhost:5173".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_maxage: 1,
            cookie_secure: false,
            admin_email: "admin@example.com".to_string(),
            admin_password: "admin-password".to_string(),
            cloudinary: CloudinaryConfig {
                cloud_name: "demo".to_string(),
                api_key: "key".to_string(),
                api_secret: "secret".to_string(),
                folder: "blogs".to_string(),
            },
            gemini: GeminiConfig {
                api_key: "key".to_string(),
                model: "gemini-2.0-flash".to_string(),
                timeout: Duration::from_millis(200),
            },
            max_upload_bytes: 1024 * 1024,
        }
    }
}
