//! # slidealt
//!
//! Add accessibility alt text to PowerPoint decks using vision language
//! models.
//!
//! ## Why this crate?
//!
//! Most decks ship with no alt text at all: screen readers announce each
//! embedded image as "Picture 3" and move on. Writing descriptions by hand
//! across hundreds of slides is exactly the kind of work a vision model does
//! well. This crate opens a `.pptx`, finds every embedded raster image,
//! captions it with one vision API call, writes the result into the shape's
//! accessibility attributes, and re-serialises the package — everything else
//! in the file is preserved byte for byte.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .pptx
//!  │
//!  ├─ 1. Parse      unzip, order slides via p:sldIdLst, walk each p:spTree
//!  ├─ 2. Probe      one GET /models confirming the credential before any work
//!  ├─ 3. Normalise  embedded payload → bounded RGB JPEG
//!  ├─ 4. Caption    concurrent vision calls per slide (gpt-4o-mini by default)
//!  ├─ 5. Write      descr + name attributes on each picture's p:cNvPr
//!  └─ 6. Save       rewrite touched slides, copy everything else verbatim
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slidealt::{annotate_file, AnnotationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key read from OPENAI_API_KEY when not set explicitly
//!     let config = AnnotationConfig::default();
//!     let stats = annotate_file("deck.pptx", "Fixed_deck.pptx", &config).await?;
//!     eprintln!("{} pictures fixed, {} failed",
//!         stats.pictures_fixed, stats.pictures_failed);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `slidealt` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! slidealt = { version = "0.1", default-features = false }
//! ```
//!
//! ## Failure model
//!
//! Fatal problems (unreadable package, empty deck, rejected credential)
//! return `Err(`[`AltTextError`]`)` before any captioning is billed.
//! Per-picture problems (undecodable payload, one failed API call) never
//! abort the run: they surface as [`PictureResult::error`] entries and the
//! [`RunStats::pictures_failed`] counter, and the affected picture keeps its
//! existing description under the default [`FailurePolicy::Skip`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod annotate;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use annotate::{annotate_bytes, annotate_file, annotate_sync, inspect};
pub use config::{AnnotationConfig, AnnotationConfigBuilder, FailurePolicy};
pub use error::{AltTextError, CaptionError, PictureError};
pub use output::{AnnotationOutput, DeckSummary, PictureResult, RunStats};
pub use pipeline::caption::{CaptionProvider, OpenAiCaptioner};
pub use pipeline::pptx::{AltText, Deck, Picture, Shape, Slide};
pub use progress::{AnnotationProgressCallback, NoopProgressCallback, ProgressCallback};
