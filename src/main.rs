use std::sync::Arc;

use ai::gemini::GeminiGenerator;
use anyhow::Context;
use config::Config;
use media::cloudinary::CloudinaryStore;
use repositories::PostgresRepo;
use routes::{configure_cors, create_routes};
use services::{auth::AuthService, moderation::ModerationService, publication::PublicationService};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use self::errors::{Error, Result};

mod ai;
mod config;
mod errors;
mod handlers;
mod media;
mod middleware;
mod models;
mod repositories;
mod routes;
mod services;
#[cfg(test)]
mod test_utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth_service: AuthService,
    pub publication_service: PublicationService,
    pub moderation_service: ModerationService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog_backend=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::init()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to the database")?;
    info!("Connection to the database is successful");

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let db_blog = Arc::new(PostgresRepo::new(pool));
    let assets = Arc::new(CloudinaryStore::from_config(&config.cloudinary)?);
    let generator = Arc::new(GeminiGenerator::from_config(&config.gemini)?);

    let app_state = AppState {
        auth_service: AuthService::new(
            db_blog.clone(),
            config.jwt_secret.clone(),
            config.jwt_maxage,
            config.admin_email.clone(),
            config.admin_password.clone(),
        ),
        publication_service: PublicationService::new(
            db_blog.clone(),
            db_blog.clone(),
            assets,
            generator,
            config.gemini.timeout,
        ),
        moderation_service: ModerationService::new(db_blog.clone(), db_blog),
        config: config.clone(),
    };

    let app = create_routes(Arc::new(app_state)).layer(configure_cors(&config.frontend_origin)?);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
