//! In-memory repositories and scriptable adapter fakes for tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    ai::ContentGenerator,
    config::Config,
    media::{AssetRemoval, AssetStore},
    models::{
        comments::{AdminComment, BlogRef, Comment},
        posts::{BlogFormDto, Category, NewPost, Post, PostFields, PostFilter, StoredImage},
        users::{User, UserRole},
    },
    repositories::{
        comments_repo::CommentRepository, posts_repo::PostRepository, user_repo::UserRepository,
    },
    services::{auth::AuthService, moderation::ModerationService, publication::PublicationService},
    AppState, Error, Result,
};

pub fn blog_form(title: &str, category: &str, is_published: bool) -> BlogFormDto {
    BlogFormDto {
        id: None,
        title: title.to_string(),
        sub_title: None,
        content: "<p>Body</p>".to_string(),
        category: category.to_string(),
        is_published,
    }
}

/// Enough of a PNG for format sniffing.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&[0, 0, 0, 13, b'I', b'H', b'D', b'R']);
    bytes
}

pub async fn seed_post(posts: &InMemoryPosts, is_published: bool) -> Post {
    let n = posts.len() + 1;
    posts
        .insert_post(NewPost {
            fields: PostFields {
                title: format!("Seeded post {n}"),
                sub_title: String::new(),
                description: "<p>Body</p>".to_string(),
                category: Category::Technology,
                is_published,
            },
            image: StoredImage {
                url: format!("https://images.test/seed-{n}.webp"),
                handle: format!("seed-{n}"),
            },
        })
        .await
        .unwrap()
}

/// Strictly increasing timestamps so "newest first" is deterministic.
#[derive(Default)]
struct Clock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl Clock {
    fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap();
        let mut now = Utc::now();
        if let Some(prev) = *last {
            if now <= prev {
                now = prev + chrono::Duration::microseconds(1);
            }
        }
        *last = Some(now);
        now
    }
}

fn storage_failure() -> Error {
    Error::Storage(sqlx::Error::PoolTimedOut)
}

#[derive(Default)]
pub struct InMemoryPosts {
    rows: Mutex<Vec<Post>>,
    fail_writes: AtomicBool,
    clock: Clock,
}

impl InMemoryPosts {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn get(&self, post_id: Uuid) -> Option<Post> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(storage_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPosts {
    async fn insert_post(&self, new_post: NewPost) -> Result<Post> {
        self.check_writable()?;
        let now = self.clock.now();
        let post = Post {
            id: Uuid::now_v7(),
            title: new_post.fields.title,
            sub_title: new_post.fields.sub_title,
            description: new_post.fields.description,
            category: new_post.fields.category,
            image: new_post.image.url,
            image_id: new_post.image.handle,
            is_published: new_post.fields.is_published,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        Ok(self.get(post_id))
    }

    async fn list_posts(&self, filter: PostFilter, limit: Option<i64>) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| filter == PostFilter::All || p.is_published)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            posts.truncate(limit as usize);
        }
        Ok(posts)
    }

    async fn update_post(
        &self,
        post_id: Uuid,
        fields: &PostFields,
        image: Option<&StoredImage>,
    ) -> Result<Option<Post>> {
        self.check_writable()?;
        let now = self.clock.now();
        let mut rows = self.rows.lock().unwrap();
        let Some(post) = rows.iter_mut().find(|p| p.id == post_id) else {
            return Ok(None);
        };

        post.title = fields.title.clone();
        post.sub_title = fields.sub_title.clone();
        post.description = fields.description.clone();
        post.category = fields.category;
        post.is_published = fields.is_published;
        if let Some(image) = image {
            post.image = image.url.clone();
            post.image_id = image.handle.clone();
        }
        post.updated_at = now;
        Ok(Some(post.clone()))
    }

    async fn toggle_published(&self, post_id: Uuid) -> Result<Option<Post>> {
        self.check_writable()?;
        let now = self.clock.now();
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|p| p.id == post_id).map(|post| {
            post.is_published = !post.is_published;
            post.updated_at = now;
            post.clone()
        }))
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        self.check_writable()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|p| p.id != post_id);
        Ok(rows.len() < before)
    }

    async fn count_posts(&self, is_published: Option<bool>) -> Result<i64> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|p| is_published.map_or(true, |wanted| p.is_published == wanted))
            .count() as i64)
    }
}

pub struct InMemoryComments {
    posts: Arc<InMemoryPosts>,
    rows: Mutex<Vec<Comment>>,
    clock: Clock,
}

impl InMemoryComments {
    pub fn new(posts: Arc<InMemoryPosts>) -> Self {
        Self {
            posts,
            rows: Mutex::new(Vec::new()),
            clock: Clock::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl CommentRepository for InMemoryComments {
    async fn insert_comment(&self, blog_id: Uuid, name: &str, content: &str) -> Result<Comment> {
        // mirrors the foreign key
        if self.posts.get(blog_id).is_none() {
            return Err(Error::not_found("Blog"));
        }
        let comment = Comment {
            id: Uuid::now_v7(),
            blog_id,
            name: name.to_string(),
            content: content.to_string(),
            is_approved: false,
            created_at: self.clock.now(),
        };
        self.rows.lock().unwrap().push(comment.clone());
        Ok(comment)
    }

    async fn list_comments_for_post(
        &self,
        blog_id: Uuid,
        approved_only: bool,
    ) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.blog_id == blog_id && (!approved_only || c.is_approved))
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn list_all_comments(&self) -> Result<Vec<AdminComment>> {
        let mut comments: Vec<AdminComment> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| {
                let post = self.posts.get(c.blog_id)?;
                Some(AdminComment {
                    id: c.id,
                    blog: BlogRef {
                        id: post.id,
                        title: post.title,
                    },
                    name: c.name.clone(),
                    content: c.content.clone(),
                    is_approved: c.is_approved,
                    created_at: c.created_at,
                })
            })
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn approve_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|c| c.id == comment_id).map(|c| {
            c.is_approved = true;
            c.clone()
        }))
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|c| c.id != comment_id);
        Ok(rows.len() < before)
    }

    async fn delete_comments_for_post(&self, blog_id: Uuid) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|c| c.blog_id != blog_id);
        Ok((before - rows.len()) as u64)
    }

    async fn count_comments(&self) -> Result<i64> {
        Ok(self.len() as i64)
    }
}

#[derive(Default)]
pub struct InMemoryUsers {
    rows: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .cloned())
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            name: name.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            role,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(user.clone());
        Ok(user)
    }
}

/// Records every call; handle -> url for images still hosted.
#[derive(Default)]
pub struct FakeAssetStore {
    live: Mutex<HashMap<String, String>>,
    deleted: Mutex<Vec<String>>,
    uploads: AtomicUsize,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FakeAssetStore {
    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Every handle a delete was attempted for, in order.
    pub fn deleted_handles(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn live_handles(&self) -> Vec<String> {
        self.live.lock().unwrap().keys().cloned().collect()
    }

    pub fn url_for(&self, handle: &str) -> Option<String> {
        self.live.lock().unwrap().get(handle).cloned()
    }

    pub fn forget(&self, handle: &str) {
        self.live.lock().unwrap().remove(handle);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AssetStore for FakeAssetStore {
    async fn upload(&self, _bytes: Vec<u8>) -> Result<StoredImage> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(Error::AssetUpload("host unavailable".to_string()));
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = format!("blogs/test-{n}");
        let url = format!("https://images.test/{handle}.webp");
        self.live.lock().unwrap().insert(handle.clone(), url.clone());
        Ok(StoredImage { url, handle })
    }

    async fn delete(&self, handle: &str) -> Result<AssetRemoval> {
        self.deleted.lock().unwrap().push(handle.to_string());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Error::AssetDelete("host unavailable".to_string()));
        }
        Ok(match self.live.lock().unwrap().remove(handle) {
            Some(_) => AssetRemoval::Removed,
            None => AssetRemoval::AlreadyGone,
        })
    }
}

pub struct FakeGenerator {
    response: Mutex<String>,
    prompts: Mutex<Vec<String>>,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl Default for FakeGenerator {
    fn default() -> Self {
        Self {
            response: Mutex::new("<h1>Draft</h1><p>Body</p>".to_string()),
            prompts: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            delay: Mutex::new(None),
        }
    }
}

impl FakeGenerator {
    pub fn respond_with(&self, text: &str) {
        *self.response.lock().unwrap() = text.to_string();
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Generation("model unavailable".to_string()));
        }
        Ok(self.response.lock().unwrap().clone())
    }
}

/// A full application state wired to fakes, with handles to inspect them.
pub struct TestApp {
    pub state: Arc<AppState>,
    pub posts: Arc<InMemoryPosts>,
    pub comments: Arc<InMemoryComments>,
    pub assets: Arc<FakeAssetStore>,
    pub generator: Arc<FakeGenerator>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = Config::for_tests();
        let posts = Arc::new(InMemoryPosts::default());
        let comments = Arc::new(InMemoryComments::new(posts.clone()));
        let users = Arc::new(InMemoryUsers::default());
        let assets = Arc::new(FakeAssetStore::default());
        let generator = Arc::new(FakeGenerator::default());

        let state = AppState {
            auth_service: AuthService::new(
                users,
                config.jwt_secret.clone(),
                config.jwt_maxage,
                config.admin_email.clone(),
                config.admin_password.clone(),
            ),
            publication_service: PublicationService::new(
                posts.clone(),
                comments.clone(),
                assets.clone(),
                generator.clone(),
                config.gemini.timeout,
            ),
            moderation_service: ModerationService::new(comments.clone(), posts.clone()),
            config,
        };

        Self {
            state: Arc::new(state),
            posts,
            comments,
            assets,
            generator,
        }
    }

    pub fn admin_token(&self) -> String {
        let config = &self.state.config;
        self.state
            .auth_service
            .admin_login(&config.admin_email, &config.admin_password)
            .unwrap()
    }
}
