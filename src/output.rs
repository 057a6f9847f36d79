//! Output types: annotated deck bytes, per-picture results, run metrics.

use crate::error::PictureError;
use serde::{Deserialize, Serialize};

/// The result of annotating one deck.
///
/// Returned by [`crate::annotate_bytes`] even when some pictures failed —
/// check [`RunStats::pictures_failed`] and the per-picture `error` fields.
#[derive(Debug)]
pub struct AnnotationOutput {
    /// The re-serialised `.pptx` package, ready to write to disk.
    pub pptx: Vec<u8>,
    /// One entry per picture shape visited, in slide/shape order.
    pub pictures: Vec<PictureResult>,
    /// Aggregate counters for the run.
    pub stats: RunStats,
}

/// Outcome for a single picture shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PictureResult {
    /// 1-indexed slide number.
    pub slide_num: usize,
    /// 0-indexed position of the shape within its slide.
    pub shape_index: usize,
    /// The generated description. Empty when the caption failed.
    pub alt_text: String,
    /// Whether the description was actually written into the deck.
    ///
    /// `false` when the caption failed under [`crate::config::FailurePolicy::Skip`],
    /// or when the shape lacks an accessibility-attribute node (structural
    /// tolerance — such shapes count as neither fixed nor failed).
    pub written: bool,
    /// Wall-clock time spent normalising and captioning this picture.
    pub duration_ms: u64,
    /// Set when the picture failed; `None` on success.
    pub error: Option<PictureError>,
}

/// What [`crate::inspect`] reports about a deck without any API traffic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckSummary {
    /// Slides in the deck.
    pub slide_count: usize,
    /// Picture shapes across all slides.
    pub picture_count: usize,
    /// Pictures whose description is absent or empty — the work remaining.
    pub pictures_missing_alt: usize,
}

/// Per-run counters, reported once at completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Slides in the deck (all are scanned).
    pub total_slides: usize,
    /// Pictures whose description and display name were written.
    pub pictures_fixed: usize,
    /// Pictures whose normalisation or caption call failed.
    pub pictures_failed: usize,
    /// Total wall-clock duration of the run.
    pub total_duration_ms: u64,
    /// Time spent inside caption API calls (summed across pictures).
    pub caption_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_serialise_round_trip() {
        let stats = RunStats {
            total_slides: 3,
            pictures_fixed: 2,
            pictures_failed: 1,
            total_duration_ms: 1200,
            caption_duration_ms: 900,
        };
        let json = serde_json::to_string(&stats).expect("serialise");
        let back: RunStats = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back.total_slides, 3);
        assert_eq!(back.pictures_fixed, 2);
        assert_eq!(back.pictures_failed, 1);
    }

    #[test]
    fn picture_result_keeps_error() {
        let r = PictureResult {
            slide_num: 2,
            shape_index: 0,
            alt_text: String::new(),
            written: false,
            duration_ms: 10,
            error: Some(PictureError::DecodeFailed {
                slide: 2,
                detail: "not an image".into(),
            }),
        };
        let json = serde_json::to_string(&r).expect("serialise");
        assert!(json.contains("DecodeFailed"));
    }
}
