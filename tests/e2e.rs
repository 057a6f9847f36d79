//! End-to-end integration tests for slidealt.
//!
//! No live API calls: every test builds a minimal `.pptx` package in memory
//! and injects a stub [`CaptionProvider`], so the whole pipeline — zip parse,
//! slide ordering, shape walk, normalisation, concurrent captioning, XML
//! rewrite, re-zip — is exercised offline.

use async_trait::async_trait;
use slidealt::{
    annotate_bytes, annotate_file, annotate_sync, inspect, AltTextError, AnnotationConfig,
    AnnotationProgressCallback, CaptionError, CaptionProvider, Deck, FailurePolicy,
};
use std::io::{Cursor, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

// ── Deck fixture builder ─────────────────────────────────────────────────────

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

#[derive(Clone, Copy)]
struct SlidePlan {
    /// Number of pictures on the slide (after one leading text box).
    pics: usize,
    /// Whether pictures carry a `p:cNvPr` attribute node.
    with_cnvpr: bool,
}

impl SlidePlan {
    fn pics(n: usize) -> Self {
        SlidePlan {
            pics: n,
            with_cnvpr: true,
        }
    }
}

/// A small PNG whose dimensions encode its identity: the `n`-th picture in
/// the deck is `8(n+1)` pixels square, so a test provider can tell payloads
/// apart after JPEG transcoding.
fn png_bytes(global_pic_idx: usize) -> Vec<u8> {
    let side = 8 * (global_pic_idx as u32 + 1);
    let img = image::RgbImage::from_pixel(side, side, image::Rgb([180, 40, 40]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("encode fixture png");
    buf
}

fn slide_xml(plan: &SlidePlan, slide_no: usize) -> String {
    let mut shapes = String::from(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="1" name="Title"/></p:nvSpPr><p:txBody><a:p><a:r><a:t>Hello</a:t></a:r></a:p></p:txBody></p:sp>"#,
    );
    for i in 0..plan.pics {
        let cnvpr = if plan.with_cnvpr {
            format!(
                r#"<p:nvPicPr><p:cNvPr id="{}" name="Picture {}" descr="original {}-{}"/></p:nvPicPr>"#,
                i + 2,
                i + 2,
                slide_no,
                i
            )
        } else {
            String::new()
        };
        shapes.push_str(&format!(
            r#"<p:pic>{}<p:blipFill><a:blip r:embed="rId{}"/></p:blipFill><p:spPr/></p:pic>"#,
            cnvpr,
            i + 1
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {NS}><p:cSld><p:spTree>{shapes}</p:spTree></p:cSld></p:sld>"#
    )
}

/// Assemble a complete minimal `.pptx` package in memory.
fn build_deck(slides: &[SlidePlan]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = FileOptions::default();
    let mut add = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, body: &[u8]| {
        zip.start_file(name, opts).expect("start_file");
        zip.write_all(body).expect("write part");
    };

    let overrides: String = (1..=slides.len())
        .map(|i| {
            format!(
                r#"<Override PartName="/ppt/slides/slide{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
            )
        })
        .collect();
    add(
        &mut zip,
        "[Content_Types].xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>{overrides}</Types>"#
        )
        .as_bytes(),
    );

    add(
        &mut zip,
        "_rels/.rels",
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#,
    );

    let sld_ids: String = (1..=slides.len())
        .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + i, i))
        .collect();
    add(
        &mut zip,
        "ppt/presentation.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {NS}><p:sldIdLst>{sld_ids}</p:sldIdLst></p:presentation>"#
        )
        .as_bytes(),
    );

    let pres_rels: String = (1..=slides.len())
        .map(|i| {
            format!(
                r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{i}.xml"/>"#
            )
        })
        .collect();
    add(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{pres_rels}</Relationships>"#
        )
        .as_bytes(),
    );

    let mut global_pic = 0usize;
    for (si, plan) in slides.iter().enumerate() {
        let slide_no = si + 1;
        add(
            &mut zip,
            &format!("ppt/slides/slide{slide_no}.xml"),
            slide_xml(plan, slide_no).as_bytes(),
        );

        if plan.pics > 0 {
            let rels: String = (0..plan.pics)
                .map(|i| {
                    format!(
                        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image{}.png"/>"#,
                        i + 1,
                        global_pic + i + 1
                    )
                })
                .collect();
            add(
                &mut zip,
                &format!("ppt/slides/_rels/slide{slide_no}.xml.rels"),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
                )
                .as_bytes(),
            );
            for _ in 0..plan.pics {
                add(
                    &mut zip,
                    &format!("ppt/media/image{}.png", global_pic + 1),
                    &png_bytes(global_pic),
                );
                global_pic += 1;
            }
        }
    }

    zip.finish().expect("finish zip").into_inner()
}

// ── Stub providers ───────────────────────────────────────────────────────────

/// Always succeeds with a fixed reply.
struct StubCaptioner {
    reply: String,
    calls: AtomicUsize,
}

impl StubCaptioner {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl CaptionProvider for StubCaptioner {
    async fn verify(&self) -> Result<(), CaptionError> {
        Ok(())
    }
    async fn caption(&self, jpeg: &[u8]) -> Result<String, CaptionError> {
        assert!(
            jpeg.starts_with(&[0xFF, 0xD8]),
            "payload sent to the provider must be JPEG"
        );
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Replies with the image's dimensions, after a delay inversely proportional
/// to its size — larger images finish first, forcing out-of-order completion.
struct DimensionCaptioner;

#[async_trait]
impl CaptionProvider for DimensionCaptioner {
    async fn verify(&self) -> Result<(), CaptionError> {
        Ok(())
    }
    async fn caption(&self, jpeg: &[u8]) -> Result<String, CaptionError> {
        let img = image::load_from_memory(jpeg)
            .map_err(|e| CaptionError::MalformedResponse(e.to_string()))?;
        let delay = 40u64.saturating_sub(img.width() as u64);
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        Ok(format!("{}x{}", img.width(), img.height()))
    }
}

/// Fails the `fail_on`-th caption call (1-based), succeeds otherwise.
struct FailingCaptioner {
    fail_on: usize,
    calls: AtomicUsize,
}

impl FailingCaptioner {
    fn new(fail_on: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_on,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl CaptionProvider for FailingCaptioner {
    async fn verify(&self) -> Result<(), CaptionError> {
        Ok(())
    }
    async fn caption(&self, _jpeg: &[u8]) -> Result<String, CaptionError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            Err(CaptionError::Api {
                status: 500,
                detail: "upstream exploded".to_string(),
            })
        } else {
            Ok(format!("caption {n}"))
        }
    }
}

/// Rejects the credential probe; captioning must never be reached.
struct RejectingProbe {
    caption_calls: AtomicUsize,
}

#[async_trait]
impl CaptionProvider for RejectingProbe {
    async fn verify(&self) -> Result<(), CaptionError> {
        Err(CaptionError::Auth {
            status: 401,
            detail: "bad key".to_string(),
        })
    }
    async fn caption(&self, _jpeg: &[u8]) -> Result<String, CaptionError> {
        self.caption_calls.fetch_add(1, Ordering::SeqCst);
        Err(CaptionError::Auth {
            status: 401,
            detail: "bad key".to_string(),
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn config_with(provider: Arc<dyn CaptionProvider>) -> AnnotationConfig {
    AnnotationConfig::builder()
        .provider(provider)
        .build()
        .expect("valid config")
}

/// `(slide index, descr, name)` for every picture in a serialised deck.
fn picture_alts(bytes: &[u8]) -> Vec<(usize, String, String)> {
    let deck = Deck::from_bytes(bytes).expect("output must parse as a deck");
    deck.walk()
        .filter_map(|(slide, shape)| {
            shape.as_picture().map(|p| {
                let (descr, name) = p
                    .alt()
                    .map(|a| (a.description().to_string(), a.name().to_string()))
                    .unwrap_or_default();
                (slide, descr, name)
            })
        })
        .collect()
}

fn archive_parts(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("zip");
    let mut parts = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).expect("entry");
        let name = file.name().to_string();
        let mut data = Vec::new();
        file.read_to_end(&mut data).expect("read entry");
        parts.push((name, data));
    }
    parts
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn annotates_the_only_picture_in_a_three_slide_deck() {
    let deck = build_deck(&[SlidePlan::pics(0), SlidePlan::pics(1), SlidePlan::pics(0)]);
    let stub = StubCaptioner::new("A red circle.");
    let output = annotate_bytes(&deck, &config_with(stub.clone()))
        .await
        .expect("run succeeds");

    assert_eq!(output.stats.total_slides, 3);
    assert_eq!(output.stats.pictures_fixed, 1);
    assert_eq!(output.stats.pictures_failed, 0);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);

    let alts = picture_alts(&output.pptx);
    assert_eq!(alts.len(), 1);
    let (slide, descr, name) = &alts[0];
    assert_eq!(*slide, 1, "picture lives on the second slide (index 1)");
    assert_eq!(descr, "A red circle.");
    assert_eq!(name, "Image");

    assert_eq!(output.pictures.len(), 1);
    assert_eq!(output.pictures[0].slide_num, 2);
    assert_eq!(output.pictures[0].shape_index, 1);
    assert!(output.pictures[0].written);
    assert!(output.pictures[0].error.is_none());
}

#[tokio::test]
async fn one_failure_does_not_abort_the_slide() {
    let deck = build_deck(&[SlidePlan::pics(2)]);
    let provider = FailingCaptioner::new(2);
    // concurrency 1 makes "second call" mean "second picture"
    let config = AnnotationConfig::builder()
        .provider(provider)
        .concurrency(1)
        .build()
        .unwrap();

    let output = annotate_bytes(&deck, &config).await.expect("run succeeds");
    assert_eq!(output.stats.pictures_fixed, 1);
    assert_eq!(output.stats.pictures_failed, 1);

    let alts = picture_alts(&output.pptx);
    assert_eq!(alts[0].1, "caption 1");
    // Skip policy leaves the failed picture's original description alone
    assert_eq!(alts[1].1, "original 1-1");

    assert!(output.pictures[0].written);
    assert!(!output.pictures[1].written);
    assert!(output.pictures[1].error.is_some());
}

#[tokio::test]
async fn embed_policy_writes_the_failure_into_the_deck() {
    let deck = build_deck(&[SlidePlan::pics(2)]);
    let config = AnnotationConfig::builder()
        .provider(FailingCaptioner::new(2))
        .concurrency(1)
        .failure_policy(FailurePolicy::Embed)
        .build()
        .unwrap();

    let output = annotate_bytes(&deck, &config).await.expect("run succeeds");
    assert_eq!(output.stats.pictures_failed, 1);

    let alts = picture_alts(&output.pptx);
    assert!(
        alts[1].1.starts_with("Alt text generation failed"),
        "got: {}",
        alts[1].1
    );
    assert!(output.pictures[1].written);
}

#[tokio::test]
async fn failures_stay_isolated_across_slides() {
    let deck = build_deck(&[SlidePlan::pics(1), SlidePlan::pics(1), SlidePlan::pics(1)]);
    let config = AnnotationConfig::builder()
        .provider(FailingCaptioner::new(2))
        .concurrency(1)
        .build()
        .unwrap();

    let output = annotate_bytes(&deck, &config).await.expect("run succeeds");
    assert_eq!(output.stats.pictures_fixed, 2);
    assert_eq!(output.stats.pictures_failed, 1);

    let alts = picture_alts(&output.pptx);
    assert_eq!(alts[0].1, "caption 1");
    assert_eq!(alts[1].1, "original 2-0");
    assert_eq!(alts[2].1, "caption 3");
}

#[tokio::test]
async fn concurrent_captions_land_on_the_right_shapes() {
    // Three pictures of 8, 16, and 24 px; the provider finishes the largest
    // first, so completion order is the reverse of shape order.
    let deck = build_deck(&[SlidePlan::pics(3)]);
    let config = AnnotationConfig::builder()
        .provider(Arc::new(DimensionCaptioner))
        .concurrency(3)
        .build()
        .unwrap();

    let output = annotate_bytes(&deck, &config).await.expect("run succeeds");
    assert_eq!(output.stats.pictures_fixed, 3);

    let alts = picture_alts(&output.pptx);
    assert_eq!(alts[0].1, "8x8");
    assert_eq!(alts[1].1, "16x16");
    assert_eq!(alts[2].1, "24x24");

    // results are reported in shape order too
    let indices: Vec<usize> = output.pictures.iter().map(|p| p.shape_index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
}

#[tokio::test]
async fn rejected_credential_aborts_before_any_captioning() {
    let deck = build_deck(&[SlidePlan::pics(2)]);
    let probe = Arc::new(RejectingProbe {
        caption_calls: AtomicUsize::new(0),
    });
    let config = config_with(probe.clone());

    let err = annotate_bytes(&deck, &config).await.expect_err("must fail");
    assert!(
        matches!(err, AltTextError::CredentialRejected(_)),
        "got: {err}"
    );
    assert_eq!(probe.caption_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn deck_without_pictures_round_trips_unchanged() {
    let deck = build_deck(&[SlidePlan::pics(0), SlidePlan::pics(0)]);
    let stub = StubCaptioner::new("unused");
    let output = annotate_bytes(&deck, &config_with(stub.clone()))
        .await
        .expect("run succeeds");

    assert_eq!(output.stats.total_slides, 2);
    assert_eq!(output.stats.pictures_fixed, 0);
    assert_eq!(output.stats.pictures_failed, 0);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);

    // every part survives byte for byte, in order
    assert_eq!(archive_parts(&deck), archive_parts(&output.pptx));
}

#[tokio::test]
async fn untouched_parts_survive_annotation_byte_for_byte() {
    let deck = build_deck(&[SlidePlan::pics(1), SlidePlan::pics(0)]);
    let output = annotate_bytes(&deck, &config_with(StubCaptioner::new("A chart.")))
        .await
        .expect("run succeeds");

    let before = archive_parts(&deck);
    let after = archive_parts(&output.pptx);
    assert_eq!(
        before.iter().map(|(n, _)| n).collect::<Vec<_>>(),
        after.iter().map(|(n, _)| n).collect::<Vec<_>>(),
        "part names and order must be preserved"
    );
    for ((name, b), (_, a)) in before.iter().zip(after.iter()) {
        if name == "ppt/slides/slide1.xml" {
            assert_ne!(b, a, "annotated slide must change");
        } else {
            assert_eq!(b, a, "untouched part '{name}' must not change");
        }
    }
}

#[tokio::test]
async fn picture_without_attribute_node_is_tolerated() {
    let deck = build_deck(&[SlidePlan {
        pics: 1,
        with_cnvpr: false,
    }]);
    let stub = StubCaptioner::new("A diagram.");
    let output = annotate_bytes(&deck, &config_with(stub.clone()))
        .await
        .expect("run succeeds");

    // captioned but nowhere to write: neither fixed nor failed
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    assert_eq!(output.stats.pictures_fixed, 0);
    assert_eq!(output.stats.pictures_failed, 0);
    assert_eq!(output.pictures.len(), 1);
    assert!(!output.pictures[0].written);
    assert!(output.pictures[0].error.is_none());

    Deck::from_bytes(&output.pptx).expect("output still parses");
}

#[tokio::test]
async fn annotated_output_can_be_annotated_again() {
    let deck = build_deck(&[SlidePlan::pics(1)]);
    let first = annotate_bytes(&deck, &config_with(StubCaptioner::new("First pass.")))
        .await
        .expect("first run");
    let second = annotate_bytes(&first.pptx, &config_with(StubCaptioner::new("Second pass.")))
        .await
        .expect("second run");

    assert_eq!(second.stats.pictures_fixed, 1);
    assert_eq!(picture_alts(&second.pptx)[0].1, "Second pass.");
}

#[tokio::test]
async fn empty_deck_is_fatal() {
    let deck = build_deck(&[]);
    let err = annotate_bytes(&deck, &config_with(StubCaptioner::new("unused")))
        .await
        .expect_err("must fail");
    assert!(matches!(err, AltTextError::EmptyDeck), "got: {err}");
}

#[tokio::test]
async fn garbage_bytes_are_not_a_pptx() {
    let err = annotate_bytes(b"not a zip at all", &config_with(StubCaptioner::new("x")))
        .await
        .expect_err("must fail");
    assert!(matches!(err, AltTextError::NotAPptx { .. }), "got: {err}");
}

#[test]
fn inspect_counts_without_a_provider() {
    let deck = build_deck(&[
        SlidePlan::pics(2),
        SlidePlan::pics(0),
        SlidePlan {
            pics: 1,
            with_cnvpr: false,
        },
    ]);
    let summary = inspect(&deck).expect("inspect");
    assert_eq!(summary.slide_count, 3);
    assert_eq!(summary.picture_count, 3);
    // fixture pictures carry a non-empty descr; the node-less one is missing
    assert_eq!(summary.pictures_missing_alt, 1);
}

#[test]
fn sync_wrapper_runs_the_whole_pipeline() {
    let deck = build_deck(&[SlidePlan::pics(1)]);
    let output =
        annotate_sync(&deck, &config_with(StubCaptioner::new("A logo."))).expect("sync run");
    assert_eq!(output.stats.pictures_fixed, 1);
    assert_eq!(picture_alts(&output.pptx)[0].1, "A logo.");
}

#[tokio::test]
async fn annotate_file_writes_atomically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("deck.pptx");
    let output = dir.path().join("out/Fixed_deck.pptx");
    std::fs::write(&input, build_deck(&[SlidePlan::pics(1)])).expect("write fixture");

    let stats = annotate_file(&input, &output, &config_with(StubCaptioner::new("A map.")))
        .await
        .expect("file run");
    assert_eq!(stats.pictures_fixed, 1);

    let written = std::fs::read(&output).expect("output exists");
    assert_eq!(picture_alts(&written)[0].1, "A map.");
    assert!(
        !output.with_extension("pptx.tmp").exists(),
        "temp file must be renamed away"
    );
}

#[tokio::test]
async fn missing_input_file_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = annotate_file(
        dir.path().join("nope.pptx"),
        dir.path().join("out.pptx"),
        &config_with(StubCaptioner::new("x")),
    )
    .await
    .expect_err("must fail");
    assert!(matches!(err, AltTextError::FileNotFound { .. }), "got: {err}");
}

#[tokio::test]
async fn progress_events_cover_the_whole_run() {
    struct Tracking {
        started: AtomicUsize,
        slides: AtomicUsize,
        pictures: AtomicUsize,
        errors: AtomicUsize,
        completed_fixed: AtomicUsize,
    }

    impl AnnotationProgressCallback for Tracking {
        fn on_run_start(&self, total: usize) {
            self.started.store(total, Ordering::SeqCst);
        }
        fn on_picture_complete(&self, _s: usize, _t: usize, _len: usize) {
            self.pictures.fetch_add(1, Ordering::SeqCst);
        }
        fn on_picture_error(&self, _s: usize, _t: usize, _e: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
        fn on_slide_complete(&self, _s: usize, _t: usize) {
            self.slides.fetch_add(1, Ordering::SeqCst);
        }
        fn on_run_complete(&self, _t: usize, fixed: usize, _failed: usize) {
            self.completed_fixed.store(fixed, Ordering::SeqCst);
        }
    }

    let tracking = Arc::new(Tracking {
        started: AtomicUsize::new(0),
        slides: AtomicUsize::new(0),
        pictures: AtomicUsize::new(0),
        errors: AtomicUsize::new(0),
        completed_fixed: AtomicUsize::new(0),
    });

    let deck = build_deck(&[SlidePlan::pics(1), SlidePlan::pics(0), SlidePlan::pics(1)]);
    let config = AnnotationConfig::builder()
        .provider(FailingCaptioner::new(2))
        .concurrency(1)
        .progress_callback(tracking.clone())
        .build()
        .unwrap();

    annotate_bytes(&deck, &config).await.expect("run succeeds");

    assert_eq!(tracking.started.load(Ordering::SeqCst), 3);
    assert_eq!(tracking.slides.load(Ordering::SeqCst), 3);
    assert_eq!(tracking.pictures.load(Ordering::SeqCst), 1);
    assert_eq!(tracking.errors.load(Ordering::SeqCst), 1);
    assert_eq!(tracking.completed_fixed.load(Ordering::SeqCst), 1);
}
