//! Configuration for a deck annotation run.
//!
//! All behaviour is controlled through [`AnnotationConfig`], built via its
//! [`AnnotationConfigBuilder`]. Keeping every knob in one struct keeps runs
//! reproducible: two invocations with equal configs behave identically, and
//! there is no process-wide mutable state anywhere in the library — the
//! credential, the provider, and the progress sink all travel inside the
//! config that the caller passes in.

use crate::error::AltTextError;
use crate::pipeline::caption::CaptionProvider;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// What to do with a picture's description when its caption call fails.
///
/// The default is [`Skip`](FailurePolicy::Skip): an error string inside a
/// customer's deck is worse than a missing description, and the failure is
/// still fully visible in [`crate::output::PictureResult`]. The policy never
/// varies within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Leave the existing description untouched. (default)
    #[default]
    Skip,
    /// Write the failure text into the description so the gap is visible to
    /// anyone opening the file.
    Embed,
}

/// Configuration for annotating one deck.
///
/// Built via [`AnnotationConfig::builder()`] or [`AnnotationConfig::default()`].
///
/// # Example
/// ```rust
/// use slidealt::AnnotationConfig;
///
/// let config = AnnotationConfig::builder()
///     .model("gpt-4o-mini")
///     .concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnnotationConfig {
    /// Vision model identifier. Default: "gpt-4o-mini".
    pub model: String,

    /// API key for the built-in OpenAI-compatible captioner. If `None`,
    /// `OPENAI_API_KEY` is read from the environment. Ignored when
    /// `provider` is set.
    pub api_key: Option<String>,

    /// Base URL for the captioning API. Default: `https://api.openai.com/v1`.
    /// Any OpenAI-compatible endpoint works. Ignored when `provider` is set.
    pub api_base: Option<String>,

    /// Pre-constructed caption provider. Takes precedence over
    /// `api_key`/`api_base`; this is the injection point for tests and for
    /// callers with custom middleware.
    pub provider: Option<Arc<dyn CaptionProvider>>,

    /// Custom captioning instruction. If `None`, uses
    /// [`crate::prompts::DEFAULT_ALT_PROMPT`].
    pub prompt: Option<String>,

    /// Output-token ceiling per caption. Default: 100.
    pub max_tokens: u32,

    /// Number of concurrent caption calls within one slide. Default: 4.
    ///
    /// Caption calls are network-bound and independent, so a small pool cuts
    /// wall-clock time on image-heavy slides. Attribute writes still happen
    /// in shape order once the whole slide has resolved; `1` reproduces the
    /// strictly sequential behaviour.
    pub concurrency: usize,

    /// Maximum image dimension sent to the API, in pixels. Default: 1024.
    ///
    /// Larger payloads cost more tokens without improving captions; images
    /// already within the bound are sent at their original size.
    pub max_image_dim: u32,

    /// JPEG quality (1–100) for the transport re-encode. Default: 85.
    pub jpeg_quality: u8,

    /// What to write when a caption fails. Default: [`FailurePolicy::Skip`].
    pub failure_policy: FailurePolicy,

    /// Per-caption-call HTTP timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Optional progress sink; see [`crate::progress`].
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            api_base: None,
            provider: None,
            prompt: None,
            max_tokens: crate::prompts::MAX_CAPTION_TOKENS,
            concurrency: 4,
            max_image_dim: 1024,
            jpeg_quality: 85,
            failure_policy: FailurePolicy::default(),
            api_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnnotationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn CaptionProvider>"))
            .field("max_tokens", &self.max_tokens)
            .field("concurrency", &self.concurrency)
            .field("max_image_dim", &self.max_image_dim)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("failure_policy", &self.failure_policy)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl AnnotationConfig {
    /// Create a new builder for `AnnotationConfig`.
    pub fn builder() -> AnnotationConfigBuilder {
        AnnotationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnnotationConfig`].
#[derive(Debug)]
pub struct AnnotationConfigBuilder {
    config: AnnotationConfig,
}

impl AnnotationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = Some(base.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn CaptionProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n.max(1);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn max_image_dim(mut self, px: u32) -> Self {
        self.config.max_image_dim = px.max(16);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnnotationConfig, AltTextError> {
        let c = &self.config;
        if c.model.is_empty() {
            return Err(AltTextError::InvalidConfig("Model must not be empty".into()));
        }
        if c.concurrency == 0 {
            return Err(AltTextError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(AltTextError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        Ok(self.config)
    }
}
