use tracing::{debug, info, warn};

use crate::error::StreamError;
use crate::video::frame::SampledFrame;
use crate::video::FrameSource;

/// How the frame rate enters the stride computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StridePolicy {
    /// `round(interval * fps)` with the exact, possibly fractional, rate.
    #[default]
    Exact,
    /// `round(interval * trunc(fps))`. A 29.97 fps video is treated as 29 fps.
    TruncatedRate,
}

/// Number of decoded frames between two emitted frames.
///
/// Fails if the interval is not a positive finite number or if the rate
/// (after truncation, for [`StridePolicy::TruncatedRate`]) is not positive.
pub fn stride(interval_seconds: f64, fps: f64, policy: StridePolicy) -> Result<u64, StreamError> {
    if !interval_seconds.is_finite() || interval_seconds <= 0.0 {
        return Err(StreamError::InvalidInterval(interval_seconds));
    }
    if !fps.is_finite() || fps <= 0.0 {
        return Err(StreamError::InvalidFrameRate(fps));
    }

    let rate = match policy {
        StridePolicy::Exact => fps,
        StridePolicy::TruncatedRate => fps.trunc(),
    };
    if rate <= 0.0 {
        return Err(StreamError::InvalidFrameRate(rate));
    }

    let k = (interval_seconds * rate).round();
    if k < 1.0 {
        warn!(
            interval_seconds,
            fps, "interval is shorter than one frame, sampling every frame"
        );
        return Ok(1);
    }
    Ok(k as u64)
}

/// Lazily selects every `stride`-th frame of a [`FrameSource`].
///
/// Owns the source; once exhausted (or after the first error) it yields
/// nothing more, and sampling again requires reopening the video.
pub struct FrameSampler<S> {
    source: S,
    stride: u64,
    fps: f64,
    counter: u64,
    emitted: u64,
    done: bool,
}

/// Start sampling `source` every `interval_seconds`.
pub fn sample<S: FrameSource>(
    source: S,
    interval_seconds: f64,
    policy: StridePolicy,
) -> Result<FrameSampler<S>, StreamError> {
    let fps = source.frame_rate();
    let stride = stride(interval_seconds, fps, policy)?;
    info!(interval_seconds, fps, stride, ?policy, "frame sampler ready");
    Ok(FrameSampler {
        source,
        stride,
        fps,
        counter: 0,
        emitted: 0,
        done: false,
    })
}

impl<S> FrameSampler<S> {
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Frames decoded so far, sampled or not.
    pub fn frames_decoded(&self) -> u64 {
        self.counter
    }
}

impl<S: FrameSource> Iterator for FrameSampler<S> {
    type Item = Result<SampledFrame, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let image = match self.source.next_frame() {
                Ok(Some(image)) => image,
                Ok(None) => {
                    self.done = true;
                    info!(
                        frames_decoded = self.counter,
                        frames_sampled = self.emitted,
                        "sampling finished"
                    );
                    break;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            let index = self.counter;
            self.counter += 1;
            if index % self.stride != 0 {
                continue;
            }

            self.emitted += 1;
            let timestamp_seconds = index as f64 / self.fps;
            debug!(index, timestamp_seconds, "frame sampled");
            return Some(Ok(SampledFrame {
                index,
                timestamp_seconds,
                image,
            }));
        }
        None
    }
}
