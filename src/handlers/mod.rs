use axum::{extract::FromRequest, http::HeaderValue};
use tower_cookies::{cookie::SameSite, Cookie};
use uuid::Uuid;

use crate::{Error, Result};

pub mod admin;
pub mod auth;
pub mod blog;

/// `Json` whose rejection answers with the usual error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// A malformed id cannot reference anything.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| Error::not_found(what))
}

pub fn session_cookie(
    name: &'static str,
    token: String,
    hours: i64,
    secure: bool,
) -> Result<HeaderValue> {
    let cookie = Cookie::build((name, token))
        .path("/")
        .max_age(time::Duration::hours(hours))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .build();

    cookie
        .to_string()
        .parse()
        .map_err(|_| Error::Internal("session cookie is not a valid header".to_string()))
}

pub fn expired_cookie(name: &'static str) -> Result<HeaderValue> {
    let cookie = Cookie::build((name, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .http_only(true)
        .build();

    cookie
        .to_string()
        .parse()
        .map_err(|_| Error::Internal("session cookie is not a valid header".to_string()))
}
