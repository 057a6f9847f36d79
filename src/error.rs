//! Error types for the slidealt library.
//!
//! Three distinct error types reflect three distinct failure modes:
//!
//! * [`AltTextError`] — **Fatal**: the run cannot proceed at all (file is not
//!   a pptx, deck has no slides, credential rejected by the upfront probe).
//!   Returned as `Err(AltTextError)` from the top-level `annotate*` functions.
//!   The deck is never mutated and no output is produced.
//!
//! * [`PictureError`] — **Non-fatal**: a single picture failed (payload did
//!   not decode, caption API call errored) but every other picture is fine.
//!   Stored inside [`crate::output::PictureResult`] so callers can inspect
//!   partial success rather than losing the whole deck to one bad image.
//!
//! * [`CaptionError`] — the caption API failure taxonomy (transport, auth,
//!   rate limit, malformed response). Produced by
//!   [`crate::pipeline::caption::CaptionProvider`] implementations and folded
//!   into a [`PictureError`] by the orchestrator.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the slidealt library.
///
/// Picture-level failures use [`PictureError`] and are stored in
/// [`crate::output::PictureResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum AltTextError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PPTX file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The bytes are not a readable zip container / OOXML package.
    #[error("File is not a valid PPTX package: {detail}")]
    NotAPptx { detail: String },

    /// A required package part is missing from the archive.
    #[error("PPTX package is missing required part '{part}'")]
    MissingPart { part: String },

    /// A package part exists but its XML could not be parsed.
    #[error("Failed to parse '{part}': {detail}")]
    MalformedXml { part: String, detail: String },

    /// The deck parsed but contains no slides; there is nothing to annotate.
    #[error("Presentation contains no slides")]
    EmptyDeck,

    // ── Caption API errors ────────────────────────────────────────────────
    /// No provider was injected and no API key could be found.
    #[error("No caption provider configured.\n{hint}")]
    ProviderNotConfigured { hint: String },

    /// The upfront credential probe failed; no captioning was attempted.
    #[error("Caption API credential rejected: {0}")]
    CredentialRejected(#[source] CaptionError),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single picture shape.
///
/// Stored in [`crate::output::PictureResult`] when a picture fails.
/// The run always continues to the next picture.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PictureError {
    /// The embedded payload is not a decodable raster image.
    #[error("Slide {slide}: image payload did not decode: {detail}")]
    DecodeFailed { slide: usize, detail: String },

    /// The caption API call failed.
    #[error("Slide {slide}: caption request failed: {detail}")]
    CaptionFailed { slide: usize, detail: String },
}

/// Failure taxonomy for one caption API call.
///
/// Returned by [`crate::pipeline::caption::CaptionProvider`] methods. There
/// is no retry layer: a failed call surfaces here immediately and the
/// orchestrator converts it to metrics (and optionally embedded text).
#[derive(Debug, Clone, Error)]
pub enum CaptionError {
    /// Request never got a response (connect failure, timeout, TLS, DNS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The API rejected the credential (HTTP 401/403).
    #[error("authentication rejected ({status}): {detail}")]
    Auth { status: u16, detail: String },

    /// HTTP 429 from the API.
    #[error("rate limit exceeded")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Any other non-success status or API-level error payload.
    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    /// A 2xx response that did not contain a completion.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}
