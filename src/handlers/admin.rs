use std::sync::Arc;

use axum::{
    http::header,
    middleware,
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
    Extension, Json, Router,
};

use crate::{
    middleware::{require_admin, ADMIN_COOKIE},
    models::{
        comments::CommentIdDto,
        response::{BlogsPayload, CommentsPayload, Response, TokenPayload},
        users::LoginUserDto,
    },
    AppState, Result,
};

use super::{parse_id, session_cookie, ApiJson};

pub fn admin_handler() -> Router {
    let protected = Router::new()
        .route("/blogs", get(get_all_blogs))
        .route("/comments", get(get_all_comments))
        .route("/comment/approve", post(approve_comment))
        .route("/comment/delete", post(delete_comment))
        .route("/dashboard", get(dashboard))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/login", post(admin_login))
        .merge(protected)
}

pub async fn admin_login(
    Extension(app_state): Extension<Arc<AppState>>,
    ApiJson(body): ApiJson<LoginUserDto>,
) -> Result<impl IntoResponse> {
    let token = app_state
        .auth_service
        .admin_login(body.email.trim(), &body.password)?;

    let cookie = session_cookie(
        ADMIN_COOKIE,
        token.clone(),
        app_state.auth_service.session_hours(),
        app_state.config.cookie_secure,
    )?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(Response::with_message("Login successful", TokenPayload { token })),
    ))
}

pub async fn get_all_blogs(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    let blogs = app_state.publication_service.list_all().await?;
    Ok(Json(Response::data(BlogsPayload { blogs })))
}

pub async fn get_all_comments(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    let comments = app_state.moderation_service.list_all_for_admin().await?;
    Ok(Json(Response::data(CommentsPayload { comments })))
}

pub async fn approve_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    ApiJson(body): ApiJson<CommentIdDto>,
) -> Result<impl IntoResponse> {
    let comment_id = parse_id(&body.id, "Comment")?;
    app_state.moderation_service.approve(comment_id).await?;

    Ok(Json(Response::message("Comment approved successfully")))
}

pub async fn delete_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    ApiJson(body): ApiJson<CommentIdDto>,
) -> Result<impl IntoResponse> {
    let comment_id = parse_id(&body.id, "Comment")?;
    app_state.moderation_service.delete(comment_id).await?;

    Ok(Json(Response::message("Comment deleted successfully")))
}

pub async fn dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    let dashboard_data = app_state.publication_service.dashboard().await?;
    Ok(Json(Response::data(dashboard_data)))
}
