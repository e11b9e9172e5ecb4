use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The video could not be fetched to local storage.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid video locator {0:?}")]
    InvalidLocator(String),

    #[error("failed to prepare download directory {}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run {program}, is it installed?")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("no video file was produced for {locator:?}")]
    NoOutput { locator: String },
}

/// The video stream cannot be opened, has no usable frame rate, or failed to decode.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to open video {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("failed to probe video {}: {reason}", path.display())]
    Probe { path: PathBuf, reason: String },

    #[error("invalid frame rate {0}, sampling cadence cannot be computed")]
    InvalidFrameRate(f64),

    #[error("sampling interval must be a positive number of seconds, got {0}")]
    InvalidInterval(f64),

    #[error("failed to decode frame {frame}: {reason}")]
    Decode { frame: u64, reason: String },
}

/// A sampled frame could not be written to disk.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to create frames directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write frame image {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// The deck could not be built or written.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("failed to read image {}", path.display())]
    ReadImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {}: {reason}", path.display())]
    DecodeImage { path: PathBuf, reason: String },

    #[error("failed to build presentation")]
    Package(#[from] framedeck_pptx::PptxError),

    #[error("failed to write deck {}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pipeline stage, used when reporting progress and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Sample,
    Persist,
    Assemble,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Sample => write!(f, "sample"),
            Stage::Persist => write!(f, "persist"),
            Stage::Assemble => write!(f, "assemble"),
        }
    }
}

/// A pipeline run failed. Each variant wraps the error of the stage that stopped it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("fetch stage failed")]
    Fetch(#[from] FetchError),

    #[error("sample stage failed")]
    UnreadableStream(#[from] StreamError),

    #[error("persist stage failed")]
    Persistence(#[from] PersistenceError),

    #[error("assemble stage failed")]
    Assembly(#[from] AssemblyError),
}

impl PipelineError {
    /// The stage that failed, or `None` for errors raised before any stage ran.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Config(_) => None,
            PipelineError::Fetch(_) => Some(Stage::Fetch),
            PipelineError::UnreadableStream(_) => Some(Stage::Sample),
            PipelineError::Persistence(_) => Some(Stage::Persist),
            PipelineError::Assembly(_) => Some(Stage::Assemble),
        }
    }

    /// Process exit code for this kind of failure. 0 and 1 are never returned.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Config(_) => 2,
            PipelineError::Fetch(_) => 3,
            PipelineError::UnreadableStream(_) => 4,
            PipelineError::Persistence(_) => 5,
            PipelineError::Assembly(_) => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let errors = [
            PipelineError::Config("x".into()),
            PipelineError::Fetch(FetchError::InvalidLocator(String::new())),
            PipelineError::UnreadableStream(StreamError::InvalidFrameRate(0.0)),
            PipelineError::Persistence(PersistenceError::CreateDir {
                path: PathBuf::from("x"),
                source: std::io::Error::other("denied"),
            }),
            PipelineError::Assembly(AssemblyError::DecodeImage {
                path: PathBuf::from("x"),
                reason: "bad".into(),
            }),
        ];
        let mut codes: Vec<u8> = errors.iter().map(PipelineError::exit_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(codes.iter().all(|&c| c > 1));
    }

    /// Every message in the source chain, outermost first.
    fn chain(err: &dyn std::error::Error) -> Vec<String> {
        let mut messages = vec![err.to_string()];
        let mut source = err.source();
        while let Some(cause) = source {
            messages.push(cause.to_string());
            source = cause.source();
        }
        messages
    }

    #[test]
    fn message_names_stage_and_cause() {
        let err = PipelineError::from(StreamError::InvalidFrameRate(0.0));
        assert_eq!(err.stage(), Some(Stage::Sample));
        let messages = chain(&err);
        assert_eq!(messages[0], "sample stage failed");
        assert!(messages[1].contains("invalid frame rate 0"), "{messages:?}");
    }

    #[test]
    fn each_cause_is_reported_once() {
        let err = PipelineError::from(FetchError::Spawn {
            program: "yt-dlp".into(),
            source: std::io::Error::other("permission denied"),
        });
        let joined = chain(&err).join(": ");
        assert_eq!(
            joined,
            "fetch stage failed: failed to run yt-dlp, is it installed?: permission denied"
        );
    }
}
