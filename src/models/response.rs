use serde::Serialize;

use super::{comments::Comment, posts::Post, users::FilterUserDto};

/// Every response body: `{success, message?, ...payload}`.
#[derive(Debug, Serialize)]
pub struct Response<T: Serialize = Empty> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

#[derive(Debug, Serialize, Default)]
pub struct Empty {}

impl Response<Empty> {
    pub fn message(message: impl Into<String>) -> Self {
        Response {
            success: true,
            message: Some(message.into()),
            data: Empty {},
        }
    }
}

impl<T: Serialize> Response<T> {
    pub fn data(data: T) -> Self {
        Response {
            success: true,
            message: None,
            data,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Response {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BlogsPayload {
    pub blogs: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct BlogPayload {
    pub blog: Post,
}

#[derive(Debug, Serialize)]
pub struct CommentsPayload<T: Serialize = Comment> {
    pub comments: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct ContentPayload {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPayload {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionPayload {
    pub user: FilterUserDto,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: FilterUserDto,
}
