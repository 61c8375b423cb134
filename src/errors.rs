use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Image upload failed: {0}")]
    AssetUpload(String),
    #[error("Image delete failed: {0}")]
    AssetDelete(String),
    #[error("Content generation failed: {0}")]
    Generation(String),
    #[error("Database error")]
    Storage(sqlx::Error),
    #[error("Invalid hash format")]
    InvalidHashFormat(argon2::password_hash::Error),
    #[error("Internal server error")]
    Internal(String),
}

impl Error {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::AssetUpload(_) | Self::AssetDelete(_) | Self::Generation(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Storage(_) | Self::InvalidHashFormat(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if let Self::Internal(ref detail) = self {
            error!("Internal error: {}", detail);
        }

        let body = Json(json!({ "success": false, "message": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        error!("Database error: {:?}", err);
        Self::Storage(err)
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(err: argon2::password_hash::Error) -> Self {
        error!("Invalid hash format");
        Self::InvalidHashFormat(err)
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{field} is invalid"))
                })
            })
            .collect::<Vec<_>>()
            .join(", ");

        Self::Validation(message)
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for Error {
    fn from(err: MultipartError) -> Self {
        Self::Validation(err.body_text())
    }
}
