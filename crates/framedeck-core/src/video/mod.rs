pub mod decoder;
pub mod frame;

use std::path::Path;

use image::RgbImage;

use crate::error::StreamError;

/// An ordered, finite sequence of decoded frames with a nominal frame rate.
pub trait FrameSource {
    /// Frames per second as reported by the container.
    fn frame_rate(&self) -> f64;

    /// Decode the next frame, or `None` once the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<RgbImage>, StreamError>;
}

/// Opens a local video file as a [`FrameSource`].
pub trait SourceOpener {
    type Source: FrameSource;

    fn open(&self, path: &Path) -> Result<Self::Source, StreamError>;
}

/// Opens videos with the ffmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegOpener {
    pub ffprobe: String,
    pub ffmpeg: String,
}

impl Default for FfmpegOpener {
    fn default() -> Self {
        Self {
            ffprobe: "ffprobe".into(),
            ffmpeg: "ffmpeg".into(),
        }
    }
}

impl SourceOpener for FfmpegOpener {
    type Source = decoder::VideoDecoder;

    fn open(&self, path: &Path) -> Result<Self::Source, StreamError> {
        decoder::VideoDecoder::open_with(path, self)
    }
}
