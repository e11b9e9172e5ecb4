use std::io::{Seek, Write};

use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::PptxError;
use crate::geometry::{Rect, SlideSize};
use crate::parts;

/// Raster formats that can be embedded without re-encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Identify the format from the file signature.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if data.starts_with(PNG_MAGIC) {
            Some(Self::Png)
        } else {
            None
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

struct PictureSlide {
    name: String,
    data: Vec<u8>,
    format: ImageFormat,
    rect: Rect,
}

/// An in-memory deck of picture slides.
///
/// Slides are appended in order and the whole package is produced by a
/// single call to [`Presentation::write`], which consumes the builder.
pub struct Presentation {
    size: SlideSize,
    title: Option<String>,
    slides: Vec<PictureSlide>,
}

impl Presentation {
    pub fn new() -> Self {
        Self {
            size: SlideSize::default(),
            title: None,
            slides: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn slide_size(&self) -> SlideSize {
        self.size
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Append a slide holding a single picture at `rect`.
    ///
    /// `data` must be an encoded JPEG or PNG; it is embedded verbatim.
    /// Returns the 0-based position of the new slide.
    pub fn add_picture_slide(
        &mut self,
        name: &str,
        data: Vec<u8>,
        rect: Rect,
    ) -> Result<usize, PptxError> {
        let position = self.slides.len();
        let format =
            ImageFormat::sniff(&data).ok_or(PptxError::UnsupportedImage { slide: position })?;

        debug!(
            slide = position,
            name,
            ?format,
            bytes = data.len(),
            "picture slide added"
        );

        self.slides.push(PictureSlide {
            name: name.to_owned(),
            data,
            format,
            rect,
        });
        Ok(position)
    }

    /// Serialize the package into `writer` and return it.
    pub fn write<W: Write + Seek>(self, writer: W) -> Result<W, PptxError> {
        let slide_count = self.slides.len();
        info!(slide_count, "writing presentation package");

        let xml = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        // Media is already compressed.
        let media = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        let mut zip = ZipWriter::new(writer);
        put_part(&mut zip, parts::CONTENT_TYPES, parts::content_types(slide_count).as_bytes(), xml)?;
        put_part(&mut zip, parts::ROOT_RELS, parts::root_rels().as_bytes(), xml)?;
        put_part(&mut zip, parts::CORE_PROPS, parts::core_props(self.title.as_deref()).as_bytes(), xml)?;
        put_part(&mut zip, parts::APP_PROPS, parts::app_props(slide_count).as_bytes(), xml)?;
        put_part(&mut zip, parts::PRESENTATION, parts::presentation(self.size, slide_count).as_bytes(), xml)?;
        put_part(&mut zip, parts::PRESENTATION_RELS, parts::presentation_rels(slide_count).as_bytes(), xml)?;
        put_part(&mut zip, parts::PRES_PROPS, parts::pres_props().as_bytes(), xml)?;
        put_part(&mut zip, parts::VIEW_PROPS, parts::view_props().as_bytes(), xml)?;
        put_part(&mut zip, parts::TABLE_STYLES, parts::table_styles().as_bytes(), xml)?;
        put_part(&mut zip, parts::SLIDE_MASTER, parts::slide_master().as_bytes(), xml)?;
        put_part(&mut zip, parts::SLIDE_MASTER_RELS, parts::slide_master_rels().as_bytes(), xml)?;
        put_part(&mut zip, parts::SLIDE_LAYOUT, parts::slide_layout().as_bytes(), xml)?;
        put_part(&mut zip, parts::SLIDE_LAYOUT_RELS, parts::slide_layout_rels().as_bytes(), xml)?;
        put_part(&mut zip, parts::THEME, parts::theme().as_bytes(), xml)?;

        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            put_part(&mut zip, &parts::slide_part(n), parts::slide(&slide.name, slide.rect).as_bytes(), xml)?;
            put_part(&mut zip, &parts::slide_rels_part(n), parts::slide_rels(n, slide.format).as_bytes(), xml)?;
            put_part(&mut zip, &parts::media_part(n, slide.format), &slide.data, media)?;
        }

        let writer = zip.finish()?;
        info!(slide_count, "presentation package written");
        Ok(writer)
    }
}

fn put_part<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    body: &[u8],
    options: SimpleFileOptions,
) -> Result<(), PptxError> {
    zip.start_file(name, options)?;
    zip.write_all(body)?;
    Ok(())
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use tracing_test::traced_test;
    use zip::ZipArchive;

    use super::*;

    const JPEG_STUB: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    const PNG_STUB: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00";

    fn read_part(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut body = String::new();
        archive
            .by_name(name)
            .unwrap_or_else(|e| panic!("missing {name}: {e}"))
            .read_to_string(&mut body)
            .unwrap();
        body
    }

    #[test]
    fn sniff_recognizes_jpeg_and_png() {
        assert_eq!(ImageFormat::sniff(JPEG_STUB), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::sniff(PNG_STUB), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::sniff(b"GIF89a"), None);
        assert_eq!(ImageFormat::sniff(&[]), None);
    }

    #[test]
    fn add_picture_slide_rejects_unknown_data() {
        let mut deck = Presentation::new();
        deck.add_picture_slide("a", JPEG_STUB.to_vec(), Rect::from_inches(1.0, 1.0, 8.0, 4.5))
            .unwrap();
        let err = deck
            .add_picture_slide("b", b"not an image".to_vec(), Rect::from_inches(1.0, 1.0, 8.0, 4.5))
            .unwrap_err();
        assert!(matches!(err, PptxError::UnsupportedImage { slide: 1 }));
        assert_eq!(deck.slide_count(), 1);
    }

    #[test]
    #[traced_test]
    fn write_produces_every_required_part() {
        let rect = Rect::from_inches(1.0, 1.0, 8.0, 4.5);
        let mut deck = Presentation::new().with_title("demo & co");
        deck.add_picture_slide("first", JPEG_STUB.to_vec(), rect).unwrap();
        deck.add_picture_slide("second", PNG_STUB.to_vec(), rect).unwrap();

        let buf = deck.write(Cursor::new(Vec::new())).unwrap().into_inner();
        let mut archive = ZipArchive::new(Cursor::new(buf)).unwrap();

        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "docProps/app.xml",
            "ppt/presentation.xml",
            "ppt/_rels/presentation.xml.rels",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/theme/theme1.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/media/image1.jpeg",
            "ppt/media/image2.png",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing part {name}");
        }

        assert!(read_part(&mut archive, "docProps/core.xml").contains("<dc:title>demo &amp; co</dc:title>"));
        assert!(read_part(&mut archive, "docProps/app.xml").contains("<Slides>2</Slides>"));
        assert!(logs_contain("presentation package written"));
    }

    #[test]
    fn empty_presentation_is_still_a_package() {
        let buf = Presentation::new()
            .write(Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();
        let mut archive = ZipArchive::new(Cursor::new(buf)).unwrap();
        let presentation = read_part(&mut archive, "ppt/presentation.xml");
        assert!(!presentation.contains("<p:sldId "));
        assert!(archive.by_name("ppt/slides/slide1.xml").is_err());
    }
}
