use std::sync::Arc;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    Extension, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin::admin_handler, auth::auth_handler, blog::blog_handler},
    AppState,
};

pub fn create_routes(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/admin", admin_handler())
        .nest("/blog", blog_handler(app_state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new().nest("/api", api_route)
}

/// Cookies only travel cross-origin to an exact, credentialed origin.
pub fn configure_cors(frontend_origin: &str) -> anyhow::Result<CorsLayer> {
    let origin = frontend_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("FRONTEND_ORIGIN is not a valid origin: {frontend_origin}"))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}
