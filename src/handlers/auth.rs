use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    middleware,
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    middleware::{require_session, Principal, ADMIN_COOKIE, USER_COOKIE},
    models::{
        response::{Response, SessionPayload, UserPayload},
        users::{FilterUserDto, LoginUserDto, RegisterUserDto, User, UserRole},
    },
    AppState, Result,
};

use super::{expired_cookie, session_cookie, ApiJson};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me).layer(middleware::from_fn(require_session)))
}

fn cookie_name(user: &User) -> &'static str {
    match user.role {
        UserRole::Admin => ADMIN_COOKIE,
        UserRole::User => USER_COOKIE,
    }
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    ApiJson(new_user): ApiJson<RegisterUserDto>,
) -> Result<impl IntoResponse> {
    new_user.validate()?;

    let (user, token) = app_state
        .auth_service
        .register(&new_user.name, &new_user.email, &new_user.password)
        .await?;

    let cookie = session_cookie(
        cookie_name(&user),
        token.clone(),
        app_state.auth_service.session_hours(),
        app_state.config.cookie_secure,
    )?;

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(Response::with_message(
            "Registration successful",
            SessionPayload {
                user: FilterUserDto::filter_user(&user),
                token,
            },
        )),
    ))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    ApiJson(body): ApiJson<LoginUserDto>,
) -> Result<impl IntoResponse> {
    body.validate()?;

    let (user, token) = app_state
        .auth_service
        .login(&body.email, &body.password)
        .await?;

    let cookie = session_cookie(
        cookie_name(&user),
        token.clone(),
        app_state.auth_service.session_hours(),
        app_state.config.cookie_secure,
    )?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(Response::with_message(
            "Login successful",
            SessionPayload {
                user: FilterUserDto::filter_user(&user),
                token,
            },
        )),
    ))
}

pub async fn logout() -> Result<impl IntoResponse> {
    Ok((
        AppendHeaders([
            (header::SET_COOKIE, expired_cookie(ADMIN_COOKIE)?),
            (header::SET_COOKIE, expired_cookie(USER_COOKIE)?),
        ]),
        Json(Response::message("Logged out")),
    ))
}

pub async fn me(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse> {
    let user = match principal {
        Principal::Viewer { user_id } => {
            FilterUserDto::filter_user(&app_state.auth_service.current_user(user_id).await?)
        }
        // The configured admin has no users row.
        Principal::Admin { email } => FilterUserDto {
            id: String::new(),
            name: "Admin".to_string(),
            email,
            role: UserRole::Admin.to_str().to_string(),
        },
    };

    Ok(Json(Response::data(UserPayload { user })))
}
