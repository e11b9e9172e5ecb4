use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use framedeck_pptx::{Presentation, Rect};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

use crate::error::AssemblyError;
use crate::persist::PersistedImage;

/// Where every picture goes: 1in from the top-left corner, 8in x 4.5in,
/// whatever the aspect ratio of the frame.
pub fn picture_rect() -> Rect {
    Rect::from_inches(1.0, 1.0, 8.0, 4.5)
}

/// What was written by [`assemble`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckSummary {
    pub path: PathBuf,
    pub slide_count: usize,
}

/// Build a deck with one slide per image, in the given order, and write it
/// to `output`.
///
/// Every image is decoded before anything is written; one bad image fails
/// the whole deck. The file appears at `output` only once it is complete.
pub fn assemble(images: &[PersistedImage], output: &Path) -> Result<DeckSummary, AssemblyError> {
    assemble_titled(images, output, None)
}

/// [`assemble`] with a document title stored in the deck's properties.
pub fn assemble_titled(
    images: &[PersistedImage],
    output: &Path,
    title: Option<&str>,
) -> Result<DeckSummary, AssemblyError> {
    info!(?output, image_count = images.len(), "assembling deck");

    let mut deck = Presentation::new();
    if let Some(title) = title {
        deck = deck.with_title(title);
    }
    let rect = picture_rect();
    debug_assert!(rect.fits_within(deck.slide_size()));

    for image in images {
        let data = fs::read(&image.path).map_err(|source| AssemblyError::ReadImage {
            path: image.path.clone(),
            source,
        })?;

        image::load_from_memory(&data).map_err(|e| {
            error!(path = ?image.path, ordinal = image.ordinal, %e, "image cannot be decoded");
            AssemblyError::DecodeImage {
                path: image.path.clone(),
                reason: e.to_string(),
            }
        })?;

        let name = image
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let slide = deck.add_picture_slide(&name, data, rect).map_err(|e| {
            // Decodable but not embeddable as-is, e.g. a BMP.
            error!(path = ?image.path, %e, "image cannot be embedded");
            AssemblyError::DecodeImage {
                path: image.path.clone(),
                reason: e.to_string(),
            }
        })?;
        debug!(slide, ordinal = image.ordinal, path = ?image.path, "slide added");
    }

    let slide_count = deck.slide_count();
    write_atomically(deck, output)?;

    info!(?output, slide_count, "deck written");
    Ok(DeckSummary {
        path: output.to_path_buf(),
        slide_count,
    })
}

/// Write into a temporary file next to `output`, then rename it into place.
/// The temporary file is removed on any failure.
fn write_atomically(deck: Presentation, output: &Path) -> Result<(), AssemblyError> {
    let output_error = |source| AssemblyError::Output {
        path: output.to_path_buf(),
        source,
    };

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(output_error)?;

    let tmp = NamedTempFile::new_in(dir).map_err(output_error)?;
    let writer = deck.write(BufWriter::new(tmp))?;
    let tmp = writer
        .into_inner()
        .map_err(|e| output_error(e.into_error()))?;
    tmp.as_file().sync_all().map_err(output_error)?;
    tmp.persist(output).map_err(|e| output_error(e.error))?;
    Ok(())
}
