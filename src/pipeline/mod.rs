//! Pipeline stages for deck annotation.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap
//! implementations (e.g. a different caption backend) without touching the
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! pptx ──▶ pptx::Deck ──▶ normalize ──▶ caption ──▶ pptx::Deck::save
//! (zip)    (walk shapes)  (RGB JPEG)    (VLM call)   (rewrite + rezip)
//! ```
//!
//! 1. [`pptx`]      — open the zipped-XML package, enumerate slides and
//!    shapes in document order, expose picture payloads and their mutable
//!    accessibility attributes, re-serialise once at the end
//! 2. [`normalize`] — decode an embedded payload, flatten to RGB, bound the
//!    dimensions, re-encode as the JPEG transport format
//! 3. [`caption`]   — the only stage with network I/O: one vision API call
//!    per image behind the injectable [`caption::CaptionProvider`] trait

pub mod caption;
pub mod normalize;
pub mod pptx;
