use std::collections::HashMap;
use std::io::{Read, Seek};

use tracing::debug;
use zip::ZipArchive;

use crate::error::PptxError;
use crate::geometry::Rect;
use crate::parts::{self, REL_OFFICE_DOCUMENT, REL_SLIDE};

/// The picture on a slide together with its placement.
#[derive(Debug, Clone)]
pub struct SlidePicture {
    pub data: Vec<u8>,
    pub rect: Rect,
}

/// Reads picture slides back out of a package, in presentation order.
///
/// Follows the relationship graph (root rels -> presentation -> slides ->
/// media) rather than assuming part names, but only understands the subset
/// of PresentationML that [`crate::Presentation`] writes.
pub struct DeckReader<R> {
    archive: ZipArchive<R>,
    slides: Vec<String>,
}

impl<R: Read + Seek> DeckReader<R> {
    pub fn new(reader: R) -> Result<Self, PptxError> {
        let mut archive = ZipArchive::new(reader)?;

        let root_rels = relationships(&read_text(&mut archive, parts::ROOT_RELS)?);
        let presentation_part = root_rels
            .values()
            .find(|(kind, _)| kind == REL_OFFICE_DOCUMENT)
            .map(|(_, target)| resolve("", target))
            .ok_or_else(|| PptxError::MissingPart("officeDocument relationship".into()))?;

        let presentation = read_text(&mut archive, &presentation_part)?;
        let rels_part = rels_part_for(&presentation_part);
        let rels = relationships(&read_text(&mut archive, &rels_part)?);
        let base = parent_dir(&presentation_part);

        let mut slides = Vec::new();
        for tag in elements(&presentation, "p:sldId") {
            let id = attribute(tag, "r:id").ok_or_else(|| malformed(&presentation_part, "sldId without r:id"))?;
            let (kind, target) = rels
                .get(id)
                .ok_or_else(|| malformed(&rels_part, &format!("no relationship {id}")))?;
            if kind != REL_SLIDE {
                return Err(malformed(&rels_part, &format!("{id} is not a slide")));
            }
            slides.push(resolve(base, target));
        }

        debug!(slide_count = slides.len(), "presentation package opened");
        Ok(Self { archive, slides })
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// The first picture on the 0-based `slide`, or `None` if it has none.
    pub fn picture(&mut self, slide: usize) -> Result<Option<SlidePicture>, PptxError> {
        let part = self
            .slides
            .get(slide)
            .cloned()
            .ok_or_else(|| PptxError::MissingPart(format!("slide {slide}")))?;
        let xml = read_text(&mut self.archive, &part)?;

        let Some(pic) = xml.split("<p:pic>").nth(1) else {
            return Ok(None);
        };

        let embed = elements(pic, "a:blip")
            .next()
            .and_then(|tag| attribute(tag, "r:embed"))
            .ok_or_else(|| malformed(&part, "picture without a:blip r:embed"))?;
        let rect = picture_rect(pic).ok_or_else(|| malformed(&part, "picture without a:xfrm"))?;

        let rels_part = rels_part_for(&part);
        let rels = relationships(&read_text(&mut self.archive, &rels_part)?);
        let (_, target) = rels
            .get(embed)
            .ok_or_else(|| malformed(&rels_part, &format!("no relationship {embed}")))?;
        let media_part = resolve(parent_dir(&part), target);

        let mut data = Vec::new();
        self.archive
            .by_name(&media_part)
            .map_err(|_| PptxError::MissingPart(media_part.clone()))?
            .read_to_end(&mut data)?;

        Ok(Some(SlidePicture { data, rect }))
    }

    /// All slide pictures in presentation order.
    pub fn pictures(&mut self) -> Result<Vec<SlidePicture>, PptxError> {
        let mut out = Vec::with_capacity(self.slides.len());
        for slide in 0..self.slides.len() {
            let picture = self
                .picture(slide)?
                .ok_or_else(|| malformed(&self.slides[slide], "slide has no picture"))?;
            out.push(picture);
        }
        Ok(out)
    }
}

fn malformed(part: &str, reason: &str) -> PptxError {
    PptxError::Malformed {
        part: part.to_owned(),
        reason: reason.to_owned(),
    }
}

fn read_text<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String, PptxError> {
    let mut file = archive
        .by_name(name)
        .map_err(|_| PptxError::MissingPart(name.to_owned()))?;
    let mut body = String::new();
    file.read_to_string(&mut body)?;
    Ok(body)
}

/// Relationship id -> (type, target).
fn relationships(xml: &str) -> HashMap<String, (String, String)> {
    elements(xml, "Relationship")
        .filter_map(|tag| {
            let id = attribute(tag, "Id")?;
            let kind = attribute(tag, "Type")?;
            let target = attribute(tag, "Target")?;
            Some((id.to_owned(), (kind.to_owned(), target.to_owned())))
        })
        .collect()
}

/// Start tags named `name`, each returned without the surrounding `<` `>`.
fn elements<'a>(xml: &'a str, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    let open = format!("<{name}");
    xml.match_indices(open.as_str())
        .map(|(start, _)| &xml[start..])
        .filter(move |rest| {
            // Reject longer names sharing the prefix, e.g. sldIdLst for sldId.
            rest[name.len() + 1..]
                .chars()
                .next()
                .is_some_and(|c| c.is_whitespace() || c == '/' || c == '>')
        })
        .filter_map(|rest| rest.find('>').map(|end| &rest[1..end]))
        .collect::<Vec<_>>()
        .into_iter()
}

fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!(" {name}=\"");
    let start = tag.find(&needle)? + needle.len();
    let len = tag[start..].find('"')?;
    Some(&tag[start..start + len])
}

fn picture_rect(pic: &str) -> Option<Rect> {
    let off = elements(pic, "a:off").next()?;
    let ext = elements(pic, "a:ext").next()?;
    Some(Rect {
        x: attribute(off, "x")?.parse().ok()?,
        y: attribute(off, "y")?.parse().ok()?,
        cx: attribute(ext, "cx")?.parse().ok()?,
        cy: attribute(ext, "cy")?.parse().ok()?,
    })
}

fn parent_dir(part: &str) -> &str {
    part.rfind('/').map_or("", |i| &part[..i])
}

fn rels_part_for(part: &str) -> String {
    let dir = parent_dir(part);
    let file = part[dir.len()..].trim_start_matches('/');
    if dir.is_empty() {
        format!("_rels/{file}.rels")
    } else {
        format!("{dir}/_rels/{file}.rels")
    }
}

/// Resolve a relationship target against the directory of its source part.
fn resolve(base: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_owned();
    }
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
