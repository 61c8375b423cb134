use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "blog_category", rename_all = "lowercase")]
pub enum Category {
    Technology,
    Startup,
    Lifestyle,
    Finance,
    Entertainment,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Technology,
        Self::Startup,
        Self::Lifestyle,
        Self::Finance,
        Self::Entertainment,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Technology => "Technology",
            Self::Startup => "Startup",
            Self::Lifestyle => "Lifestyle",
            Self::Finance => "Finance",
            Self::Entertainment => "Entertainment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.to_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown category: {wanted}"))
    }
}

#[derive(Debug, Serialize, sqlx::FromRow, Clone)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "subTitle")]
    pub sub_title: String,
    pub description: String,
    pub category: Category,
    pub image: String,
    #[serde(skip_serializing)]
    pub image_id: String,
    #[serde(rename = "isPublished")]
    pub is_published: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Locator and deletion handle of a hosted image; always stored together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub url: String,
    pub handle: String,
}

/// Validated post fields, minus the image.
#[derive(Debug, Clone, PartialEq)]
pub struct PostFields {
    pub title: String,
    pub sub_title: String,
    pub description: String,
    pub category: Category,
    pub is_published: bool,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub fields: PostFields,
    pub image: StoredImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Published,
}

/// The `blog` JSON part of the add/edit multipart forms.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BlogFormDto {
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "subTitle")]
    pub sub_title: Option<String>,
    #[serde(default, alias = "description")]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(
        default,
        rename = "isPublished",
        deserialize_with = "bool_or_string"
    )]
    pub is_published: bool,
}

#[derive(Debug, Deserialize)]
pub struct BlogIdDto {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateDto {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub blogs: i64,
    pub comments: i64,
    pub drafts: i64,
    #[serde(rename = "recentBlogs")]
    pub recent_blogs: Vec<Post>,
}

/// Multipart forms send `isPublished` as the string "true"; JSON clients send a bool.
fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.trim().eq_ignore_ascii_case("true"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parsing_is_case_insensitive_and_closed() {
        assert_eq!("technology".parse::<Category>(), Ok(Category::Technology));
        assert_eq!(" Finance ".parse::<Category>(), Ok(Category::Finance));
        assert!("Cooking".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn category_json_is_what_the_form_parser_reads() {
        for category in Category::ALL {
            let json = serde_json::to_value(category).unwrap();
            assert_eq!(json, serde_json::json!(category.to_str()));
            assert_eq!(json.as_str().unwrap().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn blog_form_accepts_string_and_bool_publish_flags() {
        let form: BlogFormDto = serde_json::from_str(
            r#"{"title":"T","content":"<p>x</p>","category":"Startup","isPublished":"true"}"#,
        )
        .unwrap();
        assert!(form.is_published);

        let form: BlogFormDto =
            serde_json::from_str(r#"{"title":"T","isPublished":false}"#).unwrap();
        assert!(!form.is_published);
        assert_eq!(form.sub_title, None);
    }

    #[test]
    fn post_json_hides_the_image_handle() {
        let post = Post {
            id: Uuid::now_v7(),
            title: "t".into(),
            sub_title: "s".into(),
            description: "<p>d</p>".into(),
            category: Category::Lifestyle,
            image: "https://img/1.webp".into(),
            image_id: "blogs/1".into(),
            is_published: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&post).unwrap();
        assert!(value.get("image_id").is_none());
        assert_eq!(value["isPublished"], true);
        assert_eq!(value["category"], "Lifestyle");
    }
}
