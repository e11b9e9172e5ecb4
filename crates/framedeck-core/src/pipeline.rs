use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::assemble::{assemble_titled, DeckSummary};
use crate::error::{PipelineError, Stage};
use crate::fetch::VideoFetcher;
use crate::persist::{ImagePersister, PersistedImage};
use crate::sampler::{sample, StridePolicy};
use crate::video::SourceOpener;

/// Parameters for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Seconds of video between two sampled frames.
    pub interval_seconds: f64,
    pub stride_policy: StridePolicy,
    /// Where the video is downloaded and the frames are written.
    pub frames_dir: PathBuf,
    /// The deck file to produce.
    pub output: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 5.0,
            stride_policy: StridePolicy::Exact,
            frames_dir: PathBuf::from("extracted_frames"),
            output: PathBuf::from("youtube_video_slides.pptx"),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.interval_seconds.is_finite() || self.interval_seconds <= 0.0 {
            return Err(PipelineError::Config(format!(
                "interval must be a positive number of seconds, got {}",
                self.interval_seconds
            )));
        }
        if self.output.as_os_str().is_empty() {
            return Err(PipelineError::Config("output path is empty".into()));
        }
        Ok(())
    }
}

/// Receives progress notifications from a running pipeline. All methods
/// default to doing nothing.
pub trait PipelineObserver {
    fn stage_started(&self, _stage: Stage) {}

    fn frame_persisted(&self, _image: &PersistedImage) {}

    fn stage_finished(&self, _stage: Stage) {}
}

/// An observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl PipelineObserver for NoProgress {}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub video: PathBuf,
    pub frames_decoded: u64,
    pub images: Vec<PersistedImage>,
    pub deck: DeckSummary,
}

/// fetch -> sample -> persist -> assemble, stopping at the first failure.
pub struct Pipeline<F, O> {
    fetcher: F,
    opener: O,
    config: PipelineConfig,
}

impl<F: VideoFetcher, O: SourceOpener> Pipeline<F, O> {
    pub fn new(fetcher: F, opener: O, config: PipelineConfig) -> Self {
        Self {
            fetcher,
            opener,
            config,
        }
    }

    /// Run every stage once for `locator`. Nothing is retried.
    pub fn run(
        &self,
        locator: &str,
        observer: &dyn PipelineObserver,
    ) -> Result<RunSummary, PipelineError> {
        self.config.validate()?;
        let config = &self.config;
        info!(
            locator,
            interval_seconds = config.interval_seconds,
            frames_dir = ?config.frames_dir,
            output = ?config.output,
            "pipeline starting"
        );

        observer.stage_started(Stage::Fetch);
        let video = self.fetcher.fetch(locator, &config.frames_dir)?;
        observer.stage_finished(Stage::Fetch);
        info!(?video, "video available");

        let (images, frames_decoded) = self.sample_and_persist(&video, observer)?;

        observer.stage_started(Stage::Assemble);
        let deck = assemble_titled(&images, &config.output, Some(locator.trim()))?;
        observer.stage_finished(Stage::Assemble);

        info!(
            frames_decoded,
            slide_count = deck.slide_count,
            output = ?deck.path,
            "pipeline complete"
        );
        Ok(RunSummary {
            video,
            frames_decoded,
            images,
            deck,
        })
    }

    /// Stream sampled frames straight to disk so only one decoded frame is
    /// held at a time. The decoder is dropped, and its process released,
    /// before this returns on every path.
    fn sample_and_persist(
        &self,
        video: &Path,
        observer: &dyn PipelineObserver,
    ) -> Result<(Vec<PersistedImage>, u64), PipelineError> {
        let config = &self.config;

        observer.stage_started(Stage::Sample);
        let source = self.opener.open(video)?;
        let mut sampler = sample(source, config.interval_seconds, config.stride_policy)?;

        observer.stage_started(Stage::Persist);
        let mut persister = ImagePersister::create(&config.frames_dir)?;
        for frame in sampler.by_ref() {
            let frame = frame?;
            let image = persister.write(&frame)?;
            observer.frame_persisted(image);
        }
        let frames_decoded = sampler.frames_decoded();
        drop(sampler);
        observer.stage_finished(Stage::Sample);

        if persister.is_empty() {
            warn!(frames_decoded, "no frames were sampled, the deck will be empty");
        }
        let images = persister.finish();
        observer.stage_finished(Stage::Persist);
        Ok((images, frames_decoded))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs::File;

    use framedeck_pptx::DeckReader;
    use tracing_test::traced_test;

    use super::*;
    use crate::error::{FetchError, StreamError};
    use crate::sampler::tests::SyntheticSource;

    /// Writes a placeholder video file, or fails like an unreachable locator.
    struct FakeFetcher {
        fail: bool,
    }

    impl VideoFetcher for FakeFetcher {
        fn fetch(&self, locator: &str, destination: &Path) -> Result<PathBuf, FetchError> {
            if self.fail {
                return Err(FetchError::Failed {
                    program: "fake".into(),
                    status: "exit status: 1".into(),
                    stderr: format!("unable to reach {locator}"),
                });
            }
            std::fs::create_dir_all(destination).unwrap();
            let path = destination.join("video.mp4");
            std::fs::write(&path, b"placeholder").unwrap();
            Ok(path)
        }
    }

    /// Opens every path as a synthetic stream of `total` frames.
    struct FakeOpener {
        total: u64,
        fps: f64,
        fail_at: Option<u64>,
    }

    impl SourceOpener for FakeOpener {
        type Source = SyntheticSource;

        fn open(&self, path: &Path) -> Result<Self::Source, StreamError> {
            assert!(path.is_file());
            let mut source = SyntheticSource::new(self.total, self.fps);
            source.fail_at = self.fail_at;
            Ok(source)
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl PipelineObserver for Recorder {
        fn stage_started(&self, stage: Stage) {
            self.events.borrow_mut().push(format!("start {stage}"));
        }

        fn frame_persisted(&self, image: &PersistedImage) {
            self.events.borrow_mut().push(format!("frame {}", image.ordinal));
        }

        fn stage_finished(&self, stage: Stage) {
            self.events.borrow_mut().push(format!("end {stage}"));
        }
    }

    fn config(root: &Path) -> PipelineConfig {
        PipelineConfig {
            frames_dir: root.join("extracted_frames"),
            output: root.join("slides.pptx"),
            ..PipelineConfig::default()
        }
    }

    #[test]
    #[traced_test]
    fn end_to_end_two_slides() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(
            FakeFetcher { fail: false },
            FakeOpener { total: 300, fps: 30.0, fail_at: None },
            config(tmp.path()),
        );
        let recorder = Recorder::default();

        let summary = pipeline.run("https://example.com/v", &recorder).unwrap();

        assert_eq!(summary.frames_decoded, 300);
        let indices: Vec<u64> = summary.images.iter().map(|i| i.index).collect();
        assert_eq!(indices, [0, 150]);
        assert_eq!(summary.deck.slide_count, 2);

        let mut reader = DeckReader::new(File::open(&summary.deck.path).unwrap()).unwrap();
        let pictures = reader.pictures().unwrap();
        assert_eq!(pictures.len(), 2);
        for (picture, image) in pictures.iter().zip(&summary.images) {
            assert_eq!(picture.data, std::fs::read(&image.path).unwrap());
        }

        assert_eq!(
            *recorder.events.borrow(),
            [
                "start fetch", "end fetch",
                "start sample", "start persist",
                "frame 0", "frame 1",
                "end sample", "end persist",
                "start assemble", "end assemble",
            ]
        );
        assert!(logs_contain("pipeline complete"));
    }

    #[test]
    fn fetch_failure_creates_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());
        let pipeline = Pipeline::new(
            FakeFetcher { fail: true },
            FakeOpener { total: 300, fps: 30.0, fail_at: None },
            config.clone(),
        );

        let err = pipeline.run("https://unreachable.invalid/v", &NoProgress).unwrap_err();

        assert!(matches!(err, PipelineError::Fetch(_)));
        assert_eq!(err.stage(), Some(Stage::Fetch));
        assert!(std::error::Error::source(&err).unwrap().to_string().contains("unable to reach"));
        assert!(!config.frames_dir.exists());
        assert!(!config.output.exists());
    }

    #[test]
    #[traced_test]
    fn zero_frame_video_gives_empty_deck() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(
            FakeFetcher { fail: false },
            FakeOpener { total: 0, fps: 30.0, fail_at: None },
            config(tmp.path()),
        );

        let summary = pipeline.run("https://example.com/empty", &NoProgress).unwrap();

        assert!(summary.images.is_empty());
        assert_eq!(summary.deck.slide_count, 0);
        assert!(summary.deck.path.is_file());
        assert!(logs_contain("the deck will be empty"));
    }

    #[test]
    fn zero_frame_rate_is_unreadable_stream() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());
        let pipeline = Pipeline::new(
            FakeFetcher { fail: false },
            FakeOpener { total: 300, fps: 0.0, fail_at: None },
            config.clone(),
        );

        let err = pipeline.run("https://example.com/v", &NoProgress).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::UnreadableStream(StreamError::InvalidFrameRate(_))
        ));
        assert_eq!(err.exit_code(), 4);
        assert!(!config.output.exists());
    }

    #[test]
    fn decode_failure_stops_before_assembly() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path());
        let pipeline = Pipeline::new(
            FakeFetcher { fail: false },
            FakeOpener { total: 300, fps: 30.0, fail_at: Some(200) },
            config.clone(),
        );
        let recorder = Recorder::default();

        let err = pipeline.run("https://example.com/v", &recorder).unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Sample));
        assert!(!config.output.exists());
        // Frames written before the failure stay on disk for inspection.
        assert!(config.frames_dir.join("frame_00000150.jpg").is_file());
        assert!(!recorder.events.borrow().iter().any(|e| e == "start assemble"));
    }

    #[test]
    fn invalid_interval_is_rejected_before_fetching() {
        let tmp = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            interval_seconds: 0.0,
            ..config(tmp.path())
        };
        let pipeline = Pipeline::new(
            FakeFetcher { fail: false },
            FakeOpener { total: 10, fps: 30.0, fail_at: None },
            config.clone(),
        );

        let err = pipeline.run("https://example.com/v", &NoProgress).unwrap_err();

        assert!(matches!(err, PipelineError::Config(_)));
        assert_eq!(err.stage(), None);
        assert!(!config.frames_dir.exists());
    }
}
