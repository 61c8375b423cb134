use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{config::GeminiConfig, Error, Result};

use super::ContentGenerator;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Clone)]
pub struct GeminiGenerator {
    http: Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiGenerator {
    /// The request timeout is enforced by the caller, not the HTTP client.
    pub fn from_config(cfg: &GeminiConfig) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        info!(model = %cfg.model, "Gemini client initialized");

        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        })
    }
}

fn first_candidate_text(response: GenerateResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().map(|p| p.text).collect();
    (!text.trim().is_empty()).then_some(text)
}

#[async_trait]
impl ContentGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(format!("{API_BASE}/{}:generateContent", self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("{status}: {error_text}")));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("Parse error: {e}")))?;

        let text = first_candidate_text(result)
            .ok_or_else(|| Error::Generation("Empty completion".to_string()))?;

        debug!(chars = text.len(), "Draft generated");
        Ok(text)
    }
}
