use thiserror::Error;

/// Errors raised while writing or reading a presentation package.
#[derive(Debug, Error)]
pub enum PptxError {
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("zip archive error")]
    Zip(#[from] zip::result::ZipError),

    /// The picture bytes are neither JPEG nor PNG.
    #[error("unsupported image data for slide {slide}, expected JPEG or PNG")]
    UnsupportedImage { slide: usize },

    #[error("package part missing: {0}")]
    MissingPart(String),

    #[error("malformed package part {part}: {reason}")]
    Malformed { part: String, reason: String },
}
