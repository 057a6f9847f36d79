//! Image normalisation: embedded payload → RGB JPEG ready for the API.
//!
//! Decks embed images in whatever format the author pasted — PNG with alpha,
//! palette GIFs, BMP screenshots, multi-megapixel photos. The caption API
//! needs none of that fidelity, so every payload is flattened to the one
//! transport format: three-channel RGB JPEG, larger dimension capped.
//!
//! Alpha is discarded, not blended: alt text describes content, and a
//! transparent background carries none.

use image::imageops::FilterType;
use image::codecs::jpeg::JpegEncoder;
use std::io::Cursor;
use tracing::debug;

/// Normalise one embedded image payload for transport.
///
/// * Decodes `raw` with format auto-detection; any unrecognised payload
///   (including vector metafiles) fails here.
/// * Converts to RGB, dropping alpha and expanding palette indices.
/// * Downscales proportionally when either dimension exceeds `max_dim`, so
///   the larger dimension equals `max_dim`; smaller images keep their size.
/// * Re-encodes as JPEG at `quality` (1–100).
///
/// Pure function over its input; the only output is the returned bytes.
pub fn normalize(raw: &[u8], max_dim: u32, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let img = image::load_from_memory(raw)?;
    let (w, h) = (img.width(), img.height());

    let img = if w > max_dim || h > max_dim {
        // resize() preserves aspect ratio within the bounding box
        img.resize(max_dim, max_dim, FilterType::Lanczos3)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);
    let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
    encoder.encode_image(&rgb)?;

    debug!(
        "Normalised image {}x{} → {}x{}, {} bytes JPEG",
        w,
        h,
        rgb.width(),
        rgb.height(),
        buf.len()
    );

    Ok(buf)
}
