//! Caption API interaction: one vision call per image.
//!
//! This module is intentionally thin — the instruction text lives in
//! [`crate::prompts`] and all policy (failure handling, concurrency) lives in
//! the orchestrator. A caption call either yields the model's first
//! completion verbatim or a typed [`CaptionError`]; there is no retry layer.
//!
//! The [`CaptionProvider`] trait is the seam for tests and alternative
//! backends: the orchestrator only ever sees `Arc<dyn CaptionProvider>`.

use crate::error::CaptionError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default endpoint for the built-in captioner. Any OpenAI-compatible server
/// (vLLM, LiteLLM, Ollama with a vision model) can be substituted via
/// [`OpenAiCaptioner::with_api_base`].
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// A vision captioning capability.
///
/// Two operations, both fallible and both network-bound:
/// * [`verify`](Self::verify) — one lightweight probe confirming the
///   credential is usable, issued exactly once before any per-image work.
/// * [`caption`](Self::caption) — normalised JPEG bytes in, descriptive text
///   out. The text is returned exactly as the model produced it: untrimmed,
///   unvalidated, possibly empty.
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Probe the credential without doing any captioning work.
    async fn verify(&self) -> Result<(), CaptionError>;

    /// Describe one JPEG image.
    async fn caption(&self, jpeg: &[u8]) -> Result<String, CaptionError>;
}

/// Captioner backed by an OpenAI-compatible chat-completions API.
///
/// `caption` issues one `POST /chat/completions` with the image as a base64
/// JPEG data URI; `verify` issues one `GET /models`.
pub struct OpenAiCaptioner {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    prompt: String,
    max_tokens: u32,
}

impl OpenAiCaptioner {
    /// Create a captioner with the default endpoint, model, and prompt.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: "gpt-4o-mini".to_string(),
            prompt: crate::prompts::DEFAULT_ALT_PROMPT.to_string(),
            max_tokens: crate::prompts::MAX_CAPTION_TOKENS,
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = n;
        self
    }

    /// Apply a per-request timeout. Replaces the underlying HTTP client.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl CaptionProvider for OpenAiCaptioner {
    async fn verify(&self) -> Result<(), CaptionError> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| CaptionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(status_error(status, detail, None));
        }
        debug!("Credential probe succeeded against {}", self.api_base);
        Ok(())
    }

    async fn caption(&self, jpeg: &[u8]) -> Result<String, CaptionError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: self.prompt.clone(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_uri(jpeg),
                        },
                    },
                ],
            }],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CaptionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(response.headers());
            let detail = response.text().await.unwrap_or_default();
            warn!("Caption API returned {}: {}", status, detail);
            return Err(status_error(status, detail, retry_after));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| CaptionError::MalformedResponse(e.to_string()))?;

        let first = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CaptionError::MalformedResponse("no choices in response".into()))?;

        // Verbatim, untrimmed; an empty completion is the model's answer.
        Ok(first.message.content.unwrap_or_default())
    }
}

/// Wrap JPEG bytes as the base64 data URI the API expects.
pub fn data_uri(jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg))
}

fn status_error(
    status: reqwest::StatusCode,
    detail: String,
    retry_after_secs: Option<u64>,
) -> CaptionError {
    match status.as_u16() {
        401 | 403 => CaptionError::Auth {
            status: status.as_u16(),
            detail,
        },
        429 => CaptionError::RateLimited { retry_after_secs },
        code => CaptionError::Api {
            status: code,
            detail,
        },
    }
}

fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
