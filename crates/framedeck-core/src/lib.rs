//! Turn a video into a slide deck: sample frames at a fixed cadence, save
//! them as images, and put each one on its own slide.

pub mod assemble;
pub mod error;
pub mod fetch;
pub mod persist;
pub mod pipeline;
pub mod sampler;
pub mod video;

pub use error::{AssemblyError, FetchError, PersistenceError, PipelineError, Stage, StreamError};
pub use pipeline::{NoProgress, Pipeline, PipelineConfig, PipelineObserver, RunSummary};
pub use sampler::StridePolicy;
