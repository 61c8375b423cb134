use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::{config::CloudinaryConfig, models::posts::StoredImage, Error, Result};

use super::{AssetRemoval, AssetStore};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
/// Incoming transformation applied by the host on upload.
const UPLOAD_TRANSFORMATION: &str = "w_1280/q_auto/f_webp";

#[derive(Clone)]
pub struct CloudinaryStore {
    http: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryStore {
    pub fn from_config(cfg: &CloudinaryConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        info!(cloud = %cfg.cloud_name, folder = %cfg.folder, "Cloudinary client initialized");

        Ok(Self {
            http,
            cloud_name: cfg.cloud_name.clone(),
            api_key: cfg.api_key.clone(),
            api_secret: cfg.api_secret.clone(),
            folder: cfg.folder.clone(),
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{API_BASE}/{}/image/{action}", self.cloud_name)
    }
}

/// SHA-256 request signature: parameters sorted by name, joined as a query
/// string, with the API secret appended.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    hex::encode(Sha256::digest(format!("{to_sign}{api_secret}").as_bytes()))
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(body) => body.error.message,
        Err(_) => format!("{status}: {text}"),
    }
}

#[async_trait]
impl AssetStore for CloudinaryStore {
    async fn upload(&self, bytes: Vec<u8>) -> Result<StoredImage> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[
                ("folder", self.folder.as_str()),
                ("timestamp", timestamp.as_str()),
                ("transformation", UPLOAD_TRANSFORMATION),
            ],
            &self.api_secret,
        );

        let size = bytes.len();
        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name("upload"))
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.folder.clone())
            .text("transformation", UPLOAD_TRANSFORMATION)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::AssetUpload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::AssetUpload(error_message(response).await));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| Error::AssetUpload(format!("Unexpected upload response: {e}")))?;

        debug!(public_id = %uploaded.public_id, size, "Image uploaded");

        Ok(StoredImage {
            url: uploaded.secure_url,
            handle: uploaded.public_id,
        })
    }

    async fn delete(&self, handle: &str) -> Result<AssetRemoval> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[("public_id", handle), ("timestamp", timestamp.as_str())],
            &self.api_secret,
        );

        let response = self
            .http
            .post(self.endpoint("destroy"))
            .form(&[
                ("public_id", handle),
                ("api_key", self.api_key.as_str()),
                ("timestamp", timestamp.as_str()),
                ("signature_algorithm", "sha256"),
                ("signature", signature.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::AssetDelete(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::AssetDelete(error_message(response).await));
        }

        let destroyed: DestroyResponse = response
            .json()
            .await
            .map_err(|e| Error::AssetDelete(format!("Unexpected destroy response: {e}")))?;

        match destroyed.result.as_str() {
            "ok" => Ok(AssetRemoval::Removed),
            "not found" => Ok(AssetRemoval::AlreadyGone),
            other => Err(Error::AssetDelete(format!("Unexpected destroy result: {other}"))),
        }
    }
}
