//! PPTX container handling: parse, walk, mutate alt text, re-serialise.
//!
//! A `.pptx` file is a zip archive of XML parts. The pieces that matter here:
//!
//! ```text
//! ppt/presentation.xml             p:sldIdLst — slide order as r:id refs
//! ppt/_rels/presentation.xml.rels  r:id → slides/slideN.xml
//! ppt/slides/slideN.xml            p:spTree — the slide's shape tree
//! ppt/slides/_rels/slideN.xml.rels r:embed → ../media/imageM.ext
//! ppt/media/imageM.ext             embedded image payloads
//! ```
//!
//! [`Deck::from_bytes`] loads every part into memory and builds an ordered
//! [`Slide`]/[`Shape`] model. Only the top-level children of `p:spTree` are
//! walked; shapes nested inside groups are classified under the group.
//!
//! Mutation is deferred: [`Picture::set_description`] and
//! [`Picture::set_display_name`] update the in-memory [`AltText`] record, and
//! [`Deck::save`] rewrites the `descr`/`name` attributes on each mutated
//! picture's `p:cNvPr` node while streaming the slide XML through unchanged.
//! Untouched parts are copied into the output archive byte for byte, so a run
//! that writes nothing produces a structurally identical package.

use crate::error::AltTextError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use tracing::{debug, warn};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

/// An in-memory presentation package.
pub struct Deck {
    /// Every archive part in original order, so re-serialisation preserves
    /// the package layout.
    parts: Vec<(String, Vec<u8>)>,
    part_index: HashMap<String, usize>,
    slides: Vec<Slide>,
}

/// One slide: its part name and its ordered top-level shapes.
pub struct Slide {
    part_name: String,
    shapes: Vec<Shape>,
}

/// A top-level element of a slide's shape tree.
///
/// The walker exposes the discriminant and leaves filtering to the caller;
/// only [`Shape::Picture`] carries data this crate acts on.
pub enum Shape {
    /// `p:pic` — an embedded raster image.
    Picture(Picture),
    /// `p:sp` — a text box or placeholder.
    TextBox,
    /// Anything else (`p:graphicFrame`, `p:grpSp`, `p:cxnSp`, ...).
    Other,
}

/// The accessibility-attribute record on a picture's `p:cNvPr` node.
#[derive(Debug, Clone)]
pub struct AltText {
    description: String,
    name: String,
    dirty: bool,
}

impl AltText {
    /// The `descr` attribute (descriptive text read by screen readers).
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The `name` attribute (display name shown in the selection pane).
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A picture shape: immutable payload plus its mutable alt-text record.
pub struct Picture {
    payload: Vec<u8>,
    content_type: String,
    /// `None` when the slide XML lacks the `p:cNvPr` node — such shapes
    /// tolerate writes as silent no-ops rather than erroring.
    alt: Option<AltText>,
}

impl Picture {
    /// The raw embedded image bytes, exactly as stored in the package.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Declared encoding of the payload, derived from the media extension.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The alt-text record, or `None` when the shape has no `p:cNvPr` node.
    pub fn alt(&self) -> Option<&AltText> {
        self.alt.as_ref()
    }

    /// Set the descriptive text. Returns `false` (and does nothing) when the
    /// shape has no attribute node to write to.
    pub fn set_description(&mut self, text: &str) -> bool {
        match self.alt.as_mut() {
            Some(alt) => {
                alt.description = text.to_string();
                alt.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Set the display name. Returns `false` (and does nothing) when the
    /// shape has no attribute node to write to.
    pub fn set_display_name(&mut self, text: &str) -> bool {
        match self.alt.as_mut() {
            Some(alt) => {
                alt.name = text.to_string();
                alt.dirty = true;
                true
            }
            None => false,
        }
    }
}

impl Shape {
    pub fn as_picture(&self) -> Option<&Picture> {
        match self {
            Shape::Picture(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_picture_mut(&mut self) -> Option<&mut Picture> {
        match self {
            Shape::Picture(p) => Some(p),
            _ => None,
        }
    }
}

impl Slide {
    /// Archive part name, e.g. `ppt/slides/slide1.xml`.
    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shapes_mut(&mut self) -> &mut [Shape] {
        &mut self.shapes
    }
}

impl Deck {
    /// Parse a `.pptx` byte stream into an in-memory deck.
    ///
    /// Fails when the bytes are not a zip archive, when required parts are
    /// missing or malformed, or when the deck contains no slides.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AltTextError> {
        let mut archive =
            ZipArchive::new(Cursor::new(bytes)).map_err(|e| AltTextError::NotAPptx {
                detail: e.to_string(),
            })?;

        let mut parts: Vec<(String, Vec<u8>)> = Vec::with_capacity(archive.len());
        let mut part_index = HashMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).map_err(|e| AltTextError::NotAPptx {
                detail: e.to_string(),
            })?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| AltTextError::NotAPptx {
                    detail: format!("failed to read '{}': {}", name, e),
                })?;
            part_index.insert(name.clone(), parts.len());
            parts.push((name, data));
        }

        let mut deck = Deck {
            parts,
            part_index,
            slides: Vec::new(),
        };

        let slide_parts = deck.slide_part_order()?;
        if slide_parts.is_empty() {
            return Err(AltTextError::EmptyDeck);
        }

        for part_name in slide_parts {
            let slide = deck.parse_slide(&part_name)?;
            deck.slides.push(slide);
        }

        debug!(
            "Parsed deck: {} slides, {} pictures",
            deck.slides.len(),
            deck.picture_count()
        );

        Ok(deck)
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slides_mut(&mut self) -> &mut [Slide] {
        &mut self.slides
    }

    /// Lazily walk all shapes as `(slide index, shape)` pairs, ordered by
    /// slide position then shape position within the slide.
    pub fn walk(&self) -> impl Iterator<Item = (usize, &Shape)> + '_ {
        self.slides
            .iter()
            .enumerate()
            .flat_map(|(i, slide)| slide.shapes.iter().map(move |s| (i, s)))
    }

    /// Mutable variant of [`walk`](Self::walk).
    pub fn walk_mut(&mut self) -> impl Iterator<Item = (usize, &mut Shape)> + '_ {
        self.slides
            .iter_mut()
            .enumerate()
            .flat_map(|(i, slide)| slide.shapes.iter_mut().map(move |s| (i, s)))
    }

    /// Number of picture shapes across all slides.
    pub fn picture_count(&self) -> usize {
        self.walk()
            .filter(|(_, s)| matches!(s, Shape::Picture(_)))
            .count()
    }

    /// Re-serialise the deck to a `.pptx` byte stream.
    ///
    /// Slides with mutated alt records are rewritten; every other part is
    /// copied verbatim in its original archive order. Call once, after all
    /// writes.
    pub fn save(self) -> Result<Vec<u8>, AltTextError> {
        let mut replaced: HashMap<String, Vec<u8>> = HashMap::new();

        for slide in &self.slides {
            // One entry per top-level pic, in order; None = leave untouched.
            let alts: Vec<Option<(&str, &str)>> = slide
                .shapes
                .iter()
                .filter_map(|s| s.as_picture())
                .map(|p| match &p.alt {
                    Some(alt) if alt.dirty => {
                        Some((alt.description.as_str(), alt.name.as_str()))
                    }
                    _ => None,
                })
                .collect();

            if alts.iter().all(Option::is_none) {
                continue;
            }

            let xml = part_str(self.part(&slide.part_name)?, &slide.part_name)?;
            let rewritten =
                rewrite_slide_xml(xml, &alts).map_err(|e| AltTextError::MalformedXml {
                    part: slide.part_name.clone(),
                    detail: e.to_string(),
                })?;
            replaced.insert(slide.part_name.clone(), rewritten);
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in &self.parts {
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| AltTextError::Internal(format!("zip write '{}': {}", name, e)))?;
            let body = replaced.get(name).map(|v| v.as_slice()).unwrap_or(data);
            writer
                .write_all(body)
                .map_err(|e| AltTextError::Internal(format!("zip write '{}': {}", name, e)))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| AltTextError::Internal(format!("zip finish: {}", e)))?;
        Ok(cursor.into_inner())
    }

    // ── Parsing internals ────────────────────────────────────────────────

    fn part(&self, name: &str) -> Result<&[u8], AltTextError> {
        self.part_index
            .get(name)
            .map(|&i| self.parts[i].1.as_slice())
            .ok_or_else(|| AltTextError::MissingPart {
                part: name.to_string(),
            })
    }

    /// Ordered slide part names: `p:sldIdLst` order when present, otherwise
    /// the relationship targets sorted by their trailing number.
    fn slide_part_order(&self) -> Result<Vec<String>, AltTextError> {
        const PRESENTATION: &str = "ppt/presentation.xml";
        const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

        let rels_xml = part_str(self.part(PRESENTATION_RELS)?, PRESENTATION_RELS)?;
        let rels = parse_relationships(rels_xml).map_err(|e| AltTextError::MalformedXml {
            part: PRESENTATION_RELS.to_string(),
            detail: e.to_string(),
        })?;

        let slide_rels: HashMap<&str, &str> = rels
            .iter()
            .filter(|r| {
                r.rel_type.contains("/slide")
                    && !r.rel_type.contains("slideLayout")
                    && !r.rel_type.contains("slideMaster")
            })
            .map(|r| (r.id.as_str(), r.target.as_str()))
            .collect();

        let pres_xml = part_str(self.part(PRESENTATION)?, PRESENTATION)?;
        let rid_order =
            parse_slide_id_list(pres_xml).map_err(|e| AltTextError::MalformedXml {
                part: PRESENTATION.to_string(),
                detail: e.to_string(),
            })?;

        let mut ordered: Vec<String> = rid_order
            .iter()
            .filter_map(|rid| slide_rels.get(rid.as_str()))
            .map(|target| resolve_target("ppt", target))
            .collect();

        if ordered.is_empty() {
            // No usable sldIdLst; fall back to the rel targets sorted by
            // their trailing slide number.
            let mut targets: Vec<(Option<usize>, String)> = slide_rels
                .values()
                .map(|t| (trailing_number(t), resolve_target("ppt", t)))
                .collect();
            targets.sort_by(|a, b| match (a.0, b.0) {
                (Some(na), Some(nb)) => na.cmp(&nb),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.1.cmp(&b.1),
            });
            ordered = targets.into_iter().map(|(_, t)| t).collect();
        }

        Ok(ordered)
    }

    fn parse_slide(&self, part_name: &str) -> Result<Slide, AltTextError> {
        let xml = part_str(self.part(part_name)?, part_name)?;

        // Embedded-image relationships live next to the slide part; a slide
        // with no rels part simply has no resolvable payloads.
        let rels_name = rels_part_for(part_name);
        let embeds: HashMap<String, String> = match self.part(&rels_name) {
            Ok(bytes) => {
                let rels_xml = part_str(bytes, &rels_name)?;
                let rels =
                    parse_relationships(rels_xml).map_err(|e| AltTextError::MalformedXml {
                        part: rels_name.clone(),
                        detail: e.to_string(),
                    })?;
                let base = parent_dir(part_name);
                rels.into_iter()
                    .map(|r| (r.id, resolve_target(base, &r.target)))
                    .collect()
            }
            Err(_) => HashMap::new(),
        };

        let raw_shapes = parse_slide_shapes(xml).map_err(|e| AltTextError::MalformedXml {
            part: part_name.to_string(),
            detail: e.to_string(),
        })?;

        let shapes = raw_shapes
            .into_iter()
            .map(|raw| match raw {
                RawShape::TextBox => Shape::TextBox,
                RawShape::Other => Shape::Other,
                RawShape::Picture { embed_id, alt } => {
                    let resolved = embed_id
                        .and_then(|id| embeds.get(&id).cloned())
                        .and_then(|path| self.part(&path).ok().map(|b| (b.to_vec(), path)));
                    let (payload, content_type) = match resolved {
                        Some((bytes, path)) => (bytes, content_type_for(&path)),
                        None => {
                            warn!("Picture in '{}' has no resolvable payload", part_name);
                            (Vec::new(), "application/octet-stream".to_string())
                        }
                    };
                    Shape::Picture(Picture {
                        payload,
                        content_type,
                        alt,
                    })
                }
            })
            .collect();

        Ok(Slide {
            part_name: part_name.to_string(),
            shapes,
        })
    }
}

// ── Shape-tree scanning ──────────────────────────────────────────────────

enum RawShape {
    Picture {
        embed_id: Option<String>,
        alt: Option<AltText>,
    },
    TextBox,
    Other,
}

/// Scan a slide's XML and classify the top-level children of `p:spTree`.
///
/// For pictures, the first `cNvPr` inside the shape supplies the alt record
/// and the first `blip`'s `r:embed` supplies the payload relationship.
fn parse_slide_shapes(xml: &str) -> Result<Vec<RawShape>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut shapes = Vec::new();

    let mut in_tree = false;
    // (is_pic, remaining element depth inside the current top-level shape)
    let mut current: Option<(bool, usize)> = None;
    let mut embed_id: Option<String> = None;
    let mut alt: Option<AltText> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let local = local_name(e.name().as_ref()).to_vec();
                match &mut current {
                    None => {
                        if !in_tree && local == b"spTree" {
                            in_tree = true;
                        } else if in_tree {
                            if local == b"pic" {
                                current = Some((true, 1));
                                embed_id = None;
                                alt = None;
                            } else {
                                // non-picture shapes are classified up front
                                // and their subtree skipped
                                current = Some((false, 1));
                                shapes.push(if local == b"sp" {
                                    RawShape::TextBox
                                } else {
                                    RawShape::Other
                                });
                            }
                        }
                    }
                    Some((is_pic, depth)) => {
                        *depth += 1;
                        if *is_pic {
                            scan_pic_child(&e, &local, &mut embed_id, &mut alt);
                        }
                    }
                }
            }
            Event::Empty(e) => {
                let local = local_name(e.name().as_ref()).to_vec();
                match &mut current {
                    None => {
                        if in_tree {
                            // self-closed top-level element; nothing to annotate
                            shapes.push(if local == b"sp" {
                                RawShape::TextBox
                            } else {
                                RawShape::Other
                            });
                        }
                    }
                    Some((is_pic, _)) => {
                        if *is_pic {
                            scan_pic_child(&e, &local, &mut embed_id, &mut alt);
                        }
                    }
                }
            }
            Event::End(e) => {
                let local = local_name(e.name().as_ref()).to_vec();
                match &mut current {
                    None => {
                        if in_tree && local == b"spTree" {
                            in_tree = false;
                        }
                    }
                    Some((is_pic, depth)) => {
                        *depth -= 1;
                        if *depth == 0 {
                            if *is_pic {
                                shapes.push(RawShape::Picture {
                                    embed_id: embed_id.take(),
                                    alt: alt.take(),
                                });
                            }
                            current = None;
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(shapes)
}

/// Pull alt attributes and the embed id out of a pic's child element.
fn scan_pic_child(
    e: &BytesStart<'_>,
    local: &[u8],
    embed_id: &mut Option<String>,
    alt: &mut Option<AltText>,
) {
    if local == b"cNvPr" && alt.is_none() {
        let mut description = String::new();
        let mut name = String::new();
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"descr" => {
                    description = attr
                        .unescape_value()
                        .map(|v| v.into_owned())
                        .unwrap_or_default()
                }
                b"name" => {
                    name = attr
                        .unescape_value()
                        .map(|v| v.into_owned())
                        .unwrap_or_default()
                }
                _ => {}
            }
        }
        *alt = Some(AltText {
            description,
            name,
            dirty: false,
        });
    } else if local == b"blip" && embed_id.is_none() {
        for attr in e.attributes().flatten() {
            let key = attr.key.as_ref();
            // r:embed, whatever the bound prefix
            if key != b"embed" && local_name(key) == b"embed" {
                *embed_id = Some(String::from_utf8_lossy(&attr.value).into_owned());
            }
        }
    }
}

/// Stream a slide's XML through, replacing `descr`/`name` on the `cNvPr`
/// node of each top-level pic whose entry in `alts` is `Some`.
///
/// Everything else — ordering, non-picture shapes, untouched pics — passes
/// through as-is.
fn rewrite_slide_xml(
    xml: &str,
    alts: &[Option<(&str, &str)>],
) -> Result<Vec<u8>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut in_tree = false;
    // (is_pic, depth, pic ordinal, cNvPr already rewritten)
    let mut current: Option<(bool, usize, usize, bool)> = None;
    let mut pic_ordinal = 0usize;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                let local = local_name(e.name().as_ref()).to_vec();
                match &mut current {
                    None => {
                        if !in_tree && local == b"spTree" {
                            in_tree = true;
                        } else if in_tree {
                            let is_pic = local == b"pic";
                            let ordinal = if is_pic {
                                let o = pic_ordinal;
                                pic_ordinal += 1;
                                o
                            } else {
                                0
                            };
                            current = Some((is_pic, 1, ordinal, false));
                        }
                        writer.write_event(Event::Start(e))?;
                    }
                    Some((is_pic, depth, ordinal, done)) => {
                        *depth += 1;
                        if *is_pic && !*done && local == b"cNvPr" {
                            if let Some(Some((descr, name))) = alts.get(*ordinal) {
                                *done = true;
                                writer.write_event(Event::Start(replace_alt_attrs(
                                    &e, descr, name,
                                )))?;
                                continue;
                            }
                        }
                        writer.write_event(Event::Start(e))?;
                    }
                }
            }
            Event::Empty(e) => {
                if let Some((is_pic, _, ordinal, done)) = &mut current {
                    let local = local_name(e.name().as_ref()).to_vec();
                    if *is_pic && !*done && local == b"cNvPr" {
                        if let Some(Some((descr, name))) = alts.get(*ordinal) {
                            *done = true;
                            writer
                                .write_event(Event::Empty(replace_alt_attrs(&e, descr, name)))?;
                            continue;
                        }
                    }
                }
                writer.write_event(Event::Empty(e))?;
            }
            Event::End(e) => {
                let local = local_name(e.name().as_ref()).to_vec();
                match &mut current {
                    None => {
                        if in_tree && local == b"spTree" {
                            in_tree = false;
                        }
                    }
                    Some((_, depth, _, _)) => {
                        *depth -= 1;
                        if *depth == 0 {
                            current = None;
                        }
                    }
                }
                writer.write_event(Event::End(e))?;
            }
            other => writer.write_event(other)?,
        }
    }

    Ok(writer.into_inner().into_inner())
}

/// Copy an element, dropping any existing `descr`/`name` attributes and
/// appending the replacements (escaped on write).
fn replace_alt_attrs(e: &BytesStart<'_>, descr: &str, name: &str) -> BytesStart<'static> {
    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut elem = BytesStart::new(tag);
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"descr" | b"name" => {}
            _ => elem.push_attribute(attr),
        }
    }
    elem.push_attribute(("name", name));
    elem.push_attribute(("descr", descr));
    elem
}

// ── Relationship / path helpers ──────────────────────────────────────────

struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

fn parse_relationships(xml: &str) -> Result<Vec<Relationship>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut rels = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Empty(ref e) | Event::Start(ref e)
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut id = String::new();
                let mut rel_type = String::new();
                let mut target = String::new();
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).into_owned();
                    match attr.key.as_ref() {
                        b"Id" => id = value,
                        b"Type" => rel_type = value,
                        b"Target" => target = value,
                        _ => {}
                    }
                }
                rels.push(Relationship {
                    id,
                    rel_type,
                    target,
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rels)
}

/// Ordered `r:id` references from `p:sldIdLst`.
fn parse_slide_id_list(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut rids = Vec::new();
    let mut in_list = false;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) if local_name(e.name().as_ref()) == b"sldIdLst" => {
                in_list = true;
            }
            Event::End(ref e) if local_name(e.name().as_ref()) == b"sldIdLst" => {
                in_list = false;
            }
            Event::Empty(ref e) | Event::Start(ref e)
                if in_list && local_name(e.name().as_ref()) == b"sldId" =>
            {
                for attr in e.attributes().flatten() {
                    let key = attr.key.as_ref();
                    // the prefixed r:id, not the unprefixed numeric id
                    if key != b"id" && local_name(key) == b"id" {
                        rids.push(String::from_utf8_lossy(&attr.value).into_owned());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rids)
}

/// Extract the local name from a potentially namespaced XML name.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// `ppt/slides/slide1.xml` → `ppt/slides/_rels/slide1.xml.rels`
fn rels_part_for(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_name),
    }
}

fn parent_dir(part_name: &str) -> &str {
    part_name.rsplit_once('/').map(|(d, _)| d).unwrap_or("")
}

/// Resolve a relationship target against its source part's directory.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for seg in target.split('/') {
        match seg {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            s => segments.push(s),
        }
    }
    segments.join("/")
}

fn trailing_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml");
    let digits: String = s
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    digits.parse().ok()
}

fn content_type_for(path: &str) -> String {
    let ext = path.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("emf") => "image/x-emf",
        Some("wmf") => "image/x-wmf",
        _ => "application/octet-stream",
    }
    .to_string()
}

fn part_str<'a>(bytes: &'a [u8], part: &str) -> Result<&'a str, AltTextError> {
    std::str::from_utf8(bytes).map_err(|e| AltTextError::MalformedXml {
        part: part.to_string(),
        detail: e.to_string(),
    })
}
