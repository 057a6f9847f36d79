//! Annotation entry points: the run orchestrator.
//!
//! The run is a straight line with one early gate:
//!
//! ```text
//! parse ──▶ credential probe ──▶ per-slide captioning ──▶ save
//! (fatal)   (fatal, pre-mutation)  (per-picture errors)    (once)
//! ```
//!
//! Everything before the probe is fatal and returns `Err` without touching
//! the deck, so a bad file or a bad key never produces a half-annotated
//! output. Everything after the probe is per-picture: failures are recorded
//! in [`PictureResult`] and the run carries on.
//!
//! Within a slide, caption calls run concurrently up to
//! [`AnnotationConfig::concurrency`]; attribute writes are applied in shape
//! order once the whole slide has resolved, so output is deterministic for a
//! deterministic provider regardless of completion order.

use crate::config::{AnnotationConfig, FailurePolicy};
use crate::error::{AltTextError, PictureError};
use crate::output::{AnnotationOutput, DeckSummary, PictureResult, RunStats};
use crate::pipeline::caption::{CaptionProvider, OpenAiCaptioner};
use crate::pipeline::{normalize, pptx};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The display name written alongside every generated description.
const PICTURE_DISPLAY_NAME: &str = "Image";

/// Annotate a `.pptx` package held in memory.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(AnnotationOutput)` on success, even if some pictures failed
/// (check `output.stats.pictures_failed`).
///
/// # Errors
/// Returns `Err(AltTextError)` only for fatal errors:
/// - Bytes are not a valid PPTX package, or the deck has no slides
/// - No caption provider configured
/// - The upfront credential probe was rejected
///
/// On `Err`, no captioning work was billed and no output exists.
pub async fn annotate_bytes(
    bytes: &[u8],
    config: &AnnotationConfig,
) -> Result<AnnotationOutput, AltTextError> {
    let total_start = Instant::now();

    // ── Step 1: Parse the package ────────────────────────────────────────
    let mut deck = pptx::Deck::from_bytes(bytes)?;
    let total_slides = deck.slide_count();
    info!(
        "Deck parsed: {} slides, {} pictures",
        total_slides,
        deck.picture_count()
    );

    // ── Step 2: Resolve provider and probe the credential ────────────────
    let provider = resolve_provider(config)?;
    provider
        .verify()
        .await
        .map_err(AltTextError::CredentialRejected)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total_slides);
    }

    // ── Step 3: Caption slide by slide ───────────────────────────────────
    let mut pictures: Vec<PictureResult> = Vec::new();
    let mut fixed = 0usize;
    let mut failed = 0usize;
    let mut caption_duration_ms = 0u64;

    for slide_idx in 0..total_slides {
        let slide_num = slide_idx + 1;

        // Payloads are cloned out so caption tasks borrow nothing from the
        // deck; writes happen strictly after the whole slide resolves.
        let jobs: Vec<(usize, Vec<u8>)> = deck.slides()[slide_idx]
            .shapes()
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_picture().map(|p| (i, p.payload().to_vec())))
            .collect();

        let mut outcomes: Vec<PictureOutcome> = stream::iter(jobs.into_iter().map(
            |(shape_index, payload)| {
                let provider = Arc::clone(&provider);
                let max_dim = config.max_image_dim;
                let quality = config.jpeg_quality;
                async move {
                    caption_one(provider, slide_num, shape_index, payload, max_dim, quality)
                        .await
                }
            },
        ))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;

        // Completion order is arbitrary; writes are not.
        outcomes.sort_by_key(|o| o.shape_index);

        for outcome in outcomes {
            caption_duration_ms += outcome.caption_ms;
            let result = apply_outcome(
                &mut deck,
                slide_idx,
                outcome,
                config.failure_policy,
                &mut fixed,
                &mut failed,
            );

            if let Some(ref cb) = config.progress_callback {
                match &result.error {
                    None if result.written => {
                        cb.on_picture_complete(slide_num, total_slides, result.alt_text.len())
                    }
                    None => {}
                    Some(e) => cb.on_picture_error(slide_num, total_slides, &e.to_string()),
                }
            }

            pictures.push(result);
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_slide_complete(slide_num, total_slides);
        }
    }

    // ── Step 4: Re-serialise ─────────────────────────────────────────────
    let pptx = deck.save()?;

    let stats = RunStats {
        total_slides,
        pictures_fixed: fixed,
        pictures_failed: failed,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        caption_duration_ms,
    };

    info!(
        "Annotation complete: {} fixed, {} failed, {}ms total",
        fixed, failed, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total_slides, fixed, failed);
    }

    Ok(AnnotationOutput {
        pptx,
        pictures,
        stats,
    })
}

/// Annotate a `.pptx` file on disk and write the result to `output_path`.
///
/// Uses atomic write (temp file + rename) so a crash mid-write never leaves
/// a truncated package behind.
pub async fn annotate_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &AnnotationConfig,
) -> Result<RunStats, AltTextError> {
    let input_path = input_path.as_ref();
    let bytes = tokio::fs::read(input_path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AltTextError::FileNotFound {
                path: input_path.to_path_buf(),
            }
        } else {
            AltTextError::Internal(format!("read '{}': {}", input_path.display(), e))
        }
    })?;

    let output = annotate_bytes(&bytes, config).await?;

    let path = output_path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AltTextError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("pptx.tmp");
    tokio::fs::write(&tmp_path, &output.pptx)
        .await
        .map_err(|e| AltTextError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| AltTextError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Synchronous wrapper around [`annotate_bytes`].
///
/// Creates a temporary tokio runtime internally.
pub fn annotate_sync(
    bytes: &[u8],
    config: &AnnotationConfig,
) -> Result<AnnotationOutput, AltTextError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AltTextError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(annotate_bytes(bytes, config))
}

/// Summarise a deck without captioning anything.
///
/// Does not require a provider or API key and makes no network calls.
pub fn inspect(bytes: &[u8]) -> Result<DeckSummary, AltTextError> {
    let deck = pptx::Deck::from_bytes(bytes)?;
    let mut picture_count = 0;
    let mut missing = 0;
    for (_, shape) in deck.walk() {
        if let Some(pic) = shape.as_picture() {
            picture_count += 1;
            if pic.alt().map(|a| a.description().is_empty()).unwrap_or(true) {
                missing += 1;
            }
        }
    }
    Ok(DeckSummary {
        slide_count: deck.slide_count(),
        picture_count,
        pictures_missing_alt: missing,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the caption provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`) — used as-is. The injection
///    point for tests and for callers with custom middleware.
/// 2. **Explicit key** (`config.api_key`) — builds the OpenAI-compatible
///    captioner with the config's model/endpoint/prompt settings.
/// 3. **Environment** (`OPENAI_API_KEY`) — same captioner, key from the
///    execution environment.
fn resolve_provider(config: &AnnotationConfig) -> Result<Arc<dyn CaptionProvider>, AltTextError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let key = config
        .api_key
        .clone()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()))
        .ok_or_else(|| AltTextError::ProviderNotConfigured {
            hint: "Set OPENAI_API_KEY, pass an API key in the configuration, or inject a \
                   CaptionProvider."
                .to_string(),
        })?;

    let mut captioner = OpenAiCaptioner::new(key)
        .with_model(&config.model)
        .with_max_tokens(config.max_tokens)
        .with_timeout(Duration::from_secs(config.api_timeout_secs));
    if let Some(ref base) = config.api_base {
        captioner = captioner.with_api_base(base);
    }
    if let Some(ref prompt) = config.prompt {
        captioner = captioner.with_prompt(prompt);
    }
    Ok(Arc::new(captioner))
}

struct PictureOutcome {
    shape_index: usize,
    slide_num: usize,
    caption: Result<String, PictureError>,
    caption_ms: u64,
    total_ms: u64,
}

/// Normalise and caption one picture payload. Never panics; every failure
/// becomes a [`PictureError`].
async fn caption_one(
    provider: Arc<dyn CaptionProvider>,
    slide_num: usize,
    shape_index: usize,
    payload: Vec<u8>,
    max_dim: u32,
    quality: u8,
) -> PictureOutcome {
    let started = Instant::now();

    let jpeg = match normalize::normalize(&payload, max_dim, quality) {
        Ok(jpeg) => jpeg,
        Err(e) => {
            warn!("Slide {}: payload did not decode: {}", slide_num, e);
            return PictureOutcome {
                shape_index,
                slide_num,
                caption: Err(PictureError::DecodeFailed {
                    slide: slide_num,
                    detail: e.to_string(),
                }),
                caption_ms: 0,
                total_ms: started.elapsed().as_millis() as u64,
            };
        }
    };

    let caption_start = Instant::now();
    let caption = provider
        .caption(&jpeg)
        .await
        .map_err(|e| PictureError::CaptionFailed {
            slide: slide_num,
            detail: e.to_string(),
        });
    let caption_ms = caption_start.elapsed().as_millis() as u64;

    PictureOutcome {
        shape_index,
        slide_num,
        caption,
        caption_ms,
        total_ms: started.elapsed().as_millis() as u64,
    }
}

/// Write one resolved caption (or failure) into the deck and fold it into
/// the run counters.
fn apply_outcome(
    deck: &mut pptx::Deck,
    slide_idx: usize,
    outcome: PictureOutcome,
    policy: FailurePolicy,
    fixed: &mut usize,
    failed: &mut usize,
) -> PictureResult {
    let picture = deck.slides_mut()[slide_idx]
        .shapes_mut()
        .get_mut(outcome.shape_index)
        .and_then(|s| s.as_picture_mut());

    let (alt_text, written, error) = match (picture, outcome.caption) {
        (Some(pic), Ok(text)) => {
            let wrote = pic.set_description(&text) && pic.set_display_name(PICTURE_DISPLAY_NAME);
            if wrote {
                *fixed += 1;
            } else {
                // No attribute node to write to; neither fixed nor failed.
                debug!(
                    "Slide {}: picture has no attribute node, caption discarded",
                    outcome.slide_num
                );
            }
            (text, wrote, None)
        }
        (Some(pic), Err(e)) => {
            *failed += 1;
            let wrote = match policy {
                FailurePolicy::Skip => false,
                FailurePolicy::Embed => {
                    pic.set_description(&format!("Alt text generation failed: {}", e))
                        && pic.set_display_name(PICTURE_DISPLAY_NAME)
                }
            };
            (String::new(), wrote, Some(e))
        }
        // Shape index no longer resolves to a picture; cannot happen with
        // the walker above, kept total rather than panicking.
        (None, caption) => {
            let error = caption.err();
            if error.is_some() {
                *failed += 1;
            }
            (String::new(), false, error)
        }
    };

    PictureResult {
        slide_num: outcome.slide_num,
        shape_index: outcome.shape_index,
        alt_text,
        written,
        duration_ms: outcome.total_ms,
        error,
    }
}
