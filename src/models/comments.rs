use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, sqlx::FromRow, Clone)]
pub struct Comment {
    pub id: Uuid,
    #[serde(rename = "blog")]
    pub blog_id: Uuid,
    pub name: String,
    pub content: String,
    #[serde(rename = "isApproved")]
    pub is_approved: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow, Clone)]
pub struct CommentWithBlogRow {
    pub id: Uuid,
    pub blog_id: Uuid,
    pub blog_title: String,
    pub name: String,
    pub content: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BlogRef {
    pub id: Uuid,
    pub title: String,
}

/// Admin view of a comment, joined with its parent blog.
#[derive(Debug, Serialize, Clone)]
pub struct AdminComment {
    pub id: Uuid,
    pub blog: BlogRef,
    pub name: String,
    pub content: String,
    #[serde(rename = "isApproved")]
    pub is_approved: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<CommentWithBlogRow> for AdminComment {
    fn from(row: CommentWithBlogRow) -> Self {
        AdminComment {
            id: row.id,
            blog: BlogRef {
                id: row.blog_id,
                title: row.blog_title,
            },
            name: row.name,
            content: row.content,
            is_approved: row.is_approved,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddCommentDto {
    #[serde(default)]
    pub blog: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct BlogCommentsDto {
    #[serde(rename = "blogId")]
    pub blog_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentIdDto {
    pub id: String,
}
