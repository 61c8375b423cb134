use async_trait::async_trait;

use crate::{models::posts::StoredImage, Result};

pub mod cloudinary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetRemoval {
    Removed,
    /// The host no longer knows the handle.
    AlreadyGone,
}

/// Remote image host. Uploads return a locator plus an opaque deletion handle.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>) -> Result<StoredImage>;
    async fn delete(&self, handle: &str) -> Result<AssetRemoval>;
}
