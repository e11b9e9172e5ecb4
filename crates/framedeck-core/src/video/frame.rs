use image::RgbImage;

/// A frame selected by the sampler.
pub struct SampledFrame {
    /// Position of the frame in the decoded stream (0-based).
    pub index: u64,
    /// Elapsed seconds from the start of the stream.
    pub timestamp_seconds: f64,
    pub image: RgbImage,
}
