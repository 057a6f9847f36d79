//! The captioning instruction sent with every image.
//!
//! Centralised so the default behaviour can be changed in exactly one place
//! and unit tests can inspect the prompt without a live API. Callers override
//! it via [`crate::config::AnnotationConfig::prompt`]; the constant here is
//! used only when no override is provided.

/// Default instruction for generating alt text from a slide image.
///
/// Screen readers announce "image" before reading the description, so the
/// model is told not to open with a generic image-reference phrase.
pub const DEFAULT_ALT_PROMPT: &str =
    "Generate a concise, objective alt text for this image. Do not start with 'Image of'.";

/// Output-length ceiling for a caption completion, in tokens.
///
/// Alt text longer than a sentence or two stops being useful to assistive
/// technology; 100 tokens is plenty and keeps per-image cost flat.
pub const MAX_CAPTION_TOKENS: u32 = 100;
