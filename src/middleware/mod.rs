use std::sync::Arc;

use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::{AppState, Error, Result};

pub const ADMIN_COOKIE: &str = "adminToken";
pub const USER_COOKIE: &str = "token";

/// Verified identity of the caller, scoped to one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    Admin { email: String },
    Viewer { user_id: Uuid },
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| {
            auth_value
                .strip_prefix("Bearer ")
                .map(|stripped| stripped.to_string())
        })
}

fn app_state(req: &Request) -> Result<Arc<AppState>> {
    req.extensions()
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or_else(|| Error::Internal("application state missing from request".to_string()))
}

/// Lets the request through only with a valid admin session.
pub async fn require_admin(mut req: Request, next: Next) -> Result<impl IntoResponse> {
    let app_state = app_state(&req)?;

    let cookies = CookieJar::from_headers(req.headers());
    let token = cookies
        .get(ADMIN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| bearer_token(&req))
        .ok_or(Error::Unauthorized)?;

    let principal = app_state.auth_service.verify_token(&token)?;
    if !matches!(principal, Principal::Admin { .. }) {
        return Err(Error::Forbidden);
    }

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Accepts either kind of session.
pub async fn require_session(mut req: Request, next: Next) -> Result<impl IntoResponse> {
    let app_state = app_state(&req)?;

    let cookies = CookieJar::from_headers(req.headers());
    let token = cookies
        .get(ADMIN_COOKIE)
        .or_else(|| cookies.get(USER_COOKIE))
        .map(|c| c.value().to_string())
        .or_else(|| bearer_token(&req))
        .ok_or(Error::Unauthorized)?;

    let principal = app_state.auth_service.verify_token(&token)?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}
