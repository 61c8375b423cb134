use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
    Extension, Json, Router,
};

use crate::{
    middleware::require_admin,
    models::{
        comments::{AddCommentDto, BlogCommentsDto},
        posts::{BlogFormDto, BlogIdDto, GenerateDto},
        response::{BlogPayload, BlogsPayload, CommentsPayload, ContentPayload, Response},
    },
    AppState, Error, Result,
};

use super::{parse_id, ApiJson};

pub fn blog_handler(max_upload_bytes: usize) -> Router {
    let uploads = Router::new()
        .route("/add", post(add_blog))
        .route("/edit", put(edit_blog))
        .route_layer(middleware::from_fn(require_admin))
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    let admin = Router::new()
        .route("/delete", delete(delete_blog))
        .route("/toggle-publish", patch(toggle_publish))
        .route("/generate", post(generate_content))
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .route("/all", get(get_blogs))
        .route("/{blog_id}", get(get_blog_by_id))
        .route("/add-comment", post(add_comment))
        .route("/comments", post(get_blog_comments))
        .merge(uploads)
        .merge(admin)
}

/// The `blog` JSON part plus the optional `image` file part.
struct BlogUpload {
    form: BlogFormDto,
    image: Option<Vec<u8>>,
}

async fn read_blog_upload(
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<BlogUpload> {
    let mut multipart = multipart.map_err(|e| Error::Validation(e.body_text()))?;
    let mut form = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "blog" => {
                let text = field.text().await?;
                let parsed = serde_json::from_str::<BlogFormDto>(&text)
                    .map_err(|e| Error::Validation(format!("Invalid blog data: {e}")))?;
                form = Some(parsed);
            }
            "image" => image = Some(field.bytes().await?.to_vec()),
            _ => {}
        }
    }

    let form = form.ok_or_else(|| Error::Validation("Blog data is required".to_string()))?;
    Ok(BlogUpload { form, image })
}

async fn add_blog(
    Extension(app_state): Extension<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let BlogUpload { form, image } = read_blog_upload(multipart).await?;

    let blog = app_state.publication_service.create(form, image).await?;

    Ok((
        StatusCode::CREATED,
        Json(Response::with_message(
            "Blog added successfully",
            BlogPayload { blog },
        )),
    ))
}

async fn edit_blog(
    Extension(app_state): Extension<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let BlogUpload { form, image } = read_blog_upload(multipart).await?;

    let raw_id = form
        .id
        .as_deref()
        .ok_or_else(|| Error::Validation("Blog id is required".to_string()))?;
    let blog_id = parse_id(raw_id, "Blog")?;

    let blog = app_state
        .publication_service
        .edit(blog_id, form, image)
        .await?;

    Ok(Json(Response::with_message(
        "Blog updated successfully",
        BlogPayload { blog },
    )))
}

async fn get_blogs(Extension(app_state): Extension<Arc<AppState>>) -> Result<impl IntoResponse> {
    let blogs = app_state.publication_service.list_published().await?;
    Ok(Json(Response::data(BlogsPayload { blogs })))
}

async fn get_blog_by_id(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(blog_id): Path<String>,
) -> Result<impl IntoResponse> {
    let blog_id = parse_id(&blog_id, "Blog")?;
    let blog = app_state.publication_service.get_published(blog_id).await?;
    Ok(Json(Response::data(BlogPayload { blog })))
}

async fn delete_blog(
    Extension(app_state): Extension<Arc<AppState>>,
    ApiJson(body): ApiJson<BlogIdDto>,
) -> Result<impl IntoResponse> {
    let blog_id = parse_id(&body.id, "Blog")?;
    app_state.publication_service.delete(blog_id).await?;

    Ok(Json(Response::message("Blog deleted successfully")))
}

async fn toggle_publish(
    Extension(app_state): Extension<Arc<AppState>>,
    ApiJson(body): ApiJson<BlogIdDto>,
) -> Result<impl IntoResponse> {
    let blog_id = parse_id(&body.id, "Blog")?;
    let blog = app_state.publication_service.toggle(blog_id).await?;

    Ok(Json(Response::with_message(
        "Blog publish status toggled",
        BlogPayload { blog },
    )))
}

async fn generate_content(
    Extension(app_state): Extension<Arc<AppState>>,
    ApiJson(body): ApiJson<GenerateDto>,
) -> Result<impl IntoResponse> {
    let content = app_state
        .publication_service
        .generate_draft_body(&body.prompt)
        .await?;

    Ok(Json(Response::data(ContentPayload { content })))
}

async fn add_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    ApiJson(body): ApiJson<AddCommentDto>,
) -> Result<impl IntoResponse> {
    let blog_id = parse_id(&body.blog, "Blog")?;
    app_state
        .moderation_service
        .submit(blog_id, &body.name, &body.content)
        .await?;

    Ok(Json(Response::message("Comment added for review")))
}

async fn get_blog_comments(
    Extension(app_state): Extension<Arc<AppState>>,
    ApiJson(body): ApiJson<BlogCommentsDto>,
) -> Result<impl IntoResponse> {
    let blog_id = parse_id(&body.blog_id, "Blog")?;
    let comments = app_state
        .moderation_service
        .list_approved_for_post(blog_id)
        .await?;

    Ok(Json(Response::data(CommentsPayload { comments })))
}
