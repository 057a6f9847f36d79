//! Progress-callback trait for per-slide annotation events.
//!
//! Inject an [`Arc<dyn AnnotationProgressCallback>`] via
//! [`crate::config::AnnotationConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through the deck.
//!
//! The unit of progress is the **slide**, not the picture: captioning within
//! a slide may run concurrently, but a slide only completes once every one of
//! its pictures has been resolved and written, so
//! `slides_done / total_slides` is always an honest fraction. Per-picture
//! events are emitted as well for log-line style reporting.

use std::sync::Arc;

/// Called by the annotation pipeline as it processes the deck.
///
/// Implementations must be `Send + Sync`: picture events within one slide may
/// fire concurrently from different tasks. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait AnnotationProgressCallback: Send + Sync {
    /// Called once after the credential probe succeeds, before any captioning.
    fn on_run_start(&self, total_slides: usize) {
        let _ = total_slides;
    }

    /// Called when a picture has been captioned and its attributes written.
    ///
    /// `alt_len` is the byte length of the generated description.
    fn on_picture_complete(&self, slide_num: usize, total_slides: usize, alt_len: usize) {
        let _ = (slide_num, total_slides, alt_len);
    }

    /// Called when a picture's normalisation or caption call failed.
    fn on_picture_error(&self, slide_num: usize, total_slides: usize, error: &str) {
        let _ = (slide_num, total_slides, error);
    }

    /// Called after every picture on a slide has been resolved and written.
    ///
    /// `slide_num` is 1-indexed; `slide_num / total_slides` is the completed
    /// fraction of the run.
    fn on_slide_complete(&self, slide_num: usize, total_slides: usize) {
        let _ = (slide_num, total_slides);
    }

    /// Called once after the deck has been re-serialised.
    fn on_run_complete(&self, total_slides: usize, fixed: usize, failed: usize) {
        let _ = (total_slides, fixed, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnnotationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnnotationConfig`].
pub type ProgressCallback = Arc<dyn AnnotationProgressCallback>;
