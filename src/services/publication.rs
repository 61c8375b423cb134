use std::{sync::Arc, time::Duration};

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    ai::{clean_generated, draft_prompt, ContentGenerator},
    media::{AssetRemoval, AssetStore},
    models::posts::{
        BlogFormDto, Category, DashboardData, NewPost, Post, PostFields, PostFilter, StoredImage,
    },
    repositories::{comments_repo::CommentRepository, posts_repo::PostRepository},
    Error, Result,
};

/// What a rich-text editor submits when the user typed nothing.
const EMPTY_EDITOR_BODIES: [&str; 3] = ["<p><br></p>", "<p><br/></p>", "<p><br /></p>"];

const RECENT_POSTS: i64 = 5;

/// Post lifecycle: create, edit, toggle, delete, plus the hosted image that
/// goes with every post.
#[derive(Clone)]
pub struct PublicationService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    assets: Arc<dyn AssetStore>,
    generator: Arc<dyn ContentGenerator>,
    generation_timeout: Duration,
}

impl PublicationService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        assets: Arc<dyn AssetStore>,
        generator: Arc<dyn ContentGenerator>,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            posts,
            comments,
            assets,
            generator,
            generation_timeout,
        }
    }

    /// Uploads the image, then stores the post. Nothing is uploaded when a
    /// field is invalid, and nothing is stored when the upload fails.
    #[instrument(skip_all, fields(title = %form.title))]
    pub async fn create(&self, form: BlogFormDto, image: Option<Vec<u8>>) -> Result<Post> {
        let fields = validate_fields(&form)?;
        let image = image
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| Error::Validation("Image is required".to_string()))?;
        check_image(&image)?;

        let stored = self.assets.upload(image).await?;

        match self
            .posts
            .insert_post(NewPost {
                fields,
                image: stored.clone(),
            })
            .await
        {
            Ok(post) => {
                info!(post_id = %post.id, published = post.is_published, "Blog created");
                Ok(post)
            }
            Err(err) => {
                self.discard_orphan(&stored).await;
                Err(err)
            }
        }
    }

    /// Overwrites every field. With `new_image`, the old image is released
    /// first and the locator/handle pair is replaced in the same write.
    #[instrument(skip(self, form, new_image), fields(replace_image = new_image.is_some()))]
    pub async fn edit(
        &self,
        post_id: Uuid,
        form: BlogFormDto,
        new_image: Option<Vec<u8>>,
    ) -> Result<Post> {
        let existing = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| Error::not_found("Blog"))?;

        let fields = validate_fields(&form)?;
        let new_image = new_image.filter(|bytes| !bytes.is_empty());
        if let Some(bytes) = &new_image {
            check_image(bytes)?;
        }

        let replacement = match new_image {
            Some(bytes) => {
                self.release_image(&existing.image_id).await;
                Some(self.assets.upload(bytes).await?)
            }
            None => None,
        };

        let updated = self
            .posts
            .update_post(post_id, &fields, replacement.as_ref())
            .await
            .and_then(|post| post.ok_or_else(|| Error::not_found("Blog")));

        match updated {
            Ok(post) => {
                info!(post_id = %post.id, "Blog updated");
                Ok(post)
            }
            Err(err) => {
                if let Some(stored) = &replacement {
                    self.discard_orphan(stored).await;
                }
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn toggle(&self, post_id: Uuid) -> Result<Post> {
        let post = self
            .posts
            .toggle_published(post_id)
            .await?
            .ok_or_else(|| Error::not_found("Blog"))?;

        info!(published = post.is_published, "Blog publish status toggled");
        Ok(post)
    }

    /// Removes comments and the hosted image before the post row, so no
    /// dependent row ever points at a missing post.
    #[instrument(skip(self))]
    pub async fn delete(&self, post_id: Uuid) -> Result<()> {
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| Error::not_found("Blog"))?;

        let removed_comments = self.comments.delete_comments_for_post(post_id).await?;
        self.release_image(&post.image_id).await;

        if !self.posts.delete_post(post_id).await? {
            return Err(Error::not_found("Blog"));
        }

        info!(removed_comments, "Blog deleted");
        Ok(())
    }

    pub async fn list_published(&self) -> Result<Vec<Post>> {
        self.posts.list_posts(PostFilter::Published, None).await
    }

    pub async fn list_all(&self) -> Result<Vec<Post>> {
        self.posts.list_posts(PostFilter::All, None).await
    }

    /// Public single read. Drafts are reported as missing.
    pub async fn get_published(&self, post_id: Uuid) -> Result<Post> {
        self.posts
            .find_post(post_id)
            .await?
            .filter(|post| post.is_published)
            .ok_or_else(|| Error::not_found("Blog"))
    }

    pub async fn dashboard(&self) -> Result<DashboardData> {
        let (blogs, drafts, comments, recent_blogs) = tokio::try_join!(
            self.posts.count_posts(None),
            self.posts.count_posts(Some(false)),
            self.comments.count_comments(),
            self.posts.list_posts(PostFilter::All, Some(RECENT_POSTS)),
        )?;

        Ok(DashboardData {
            blogs,
            comments,
            drafts,
            recent_blogs,
        })
    }

    /// Asks the generator for an HTML article body. Nothing is stored and
    /// nothing is retried.
    #[instrument(skip(self))]
    pub async fn generate_draft_body(&self, prompt: &str) -> Result<String> {
        let topic = prompt.trim();
        if topic.is_empty() {
            return Err(Error::Validation("Prompt is required".to_string()));
        }

        let raw = tokio::time::timeout(
            self.generation_timeout,
            self.generator.generate(&draft_prompt(topic)),
        )
        .await
        .map_err(|_| {
            warn!(timeout = ?self.generation_timeout, "Draft generation timed out");
            Error::Generation(format!(
                "timed out after {}s",
                self.generation_timeout.as_secs_f32()
            ))
        })?
        .map_err(|err| match err {
            Error::Generation(_) => err,
            other => Error::Generation(other.to_string()),
        })?;

        let content = clean_generated(&raw);
        if content.is_empty() {
            return Err(Error::Generation("Empty completion".to_string()));
        }

        Ok(content)
    }

    /// Best-effort delete of a hosted image; failures are logged only.
    async fn release_image(&self, handle: &str) {
        match self.assets.delete(handle).await {
            Ok(AssetRemoval::Removed) => debug!(handle, "Image deleted"),
            Ok(AssetRemoval::AlreadyGone) => info!(handle, "Image was already gone"),
            Err(err) => warn!(handle, error = %err, "Could not delete image, continuing"),
        }
    }

    /// An upload whose post was never stored. One cleanup attempt, then it
    /// is logged for operators.
    async fn discard_orphan(&self, image: &StoredImage) {
        match self.assets.delete(&image.handle).await {
            Ok(_) => warn!(handle = %image.handle, "Removed image of a blog that was not saved"),
            Err(err) => error!(
                orphaned_handle = %image.handle,
                url = %image.url,
                error = %err,
                "Uploaded image is orphaned after a storage failure"
            ),
        }
    }
}

fn validate_fields(form: &BlogFormDto) -> Result<PostFields> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(Error::Validation("Title is required".to_string()));
    }

    let description = form.content.trim();
    if description.is_empty()
        || EMPTY_EDITOR_BODIES
            .iter()
            .any(|empty| description.eq_ignore_ascii_case(empty))
    {
        return Err(Error::Validation("Blog content is required".to_string()));
    }

    if form.category.trim().is_empty() {
        return Err(Error::Validation("Category is required".to_string()));
    }
    let category: Category = form.category.parse().map_err(Error::Validation)?;

    Ok(PostFields {
        title: title.to_string(),
        sub_title: form
            .sub_title
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        description: description.to_string(),
        category,
        is_published: form.is_published,
    })
}

fn check_image(bytes: &[u8]) -> Result<()> {
    image::guess_format(bytes)
        .map(|_| ())
        .map_err(|_| Error::Validation("Unsupported image format".to_string()))
}
