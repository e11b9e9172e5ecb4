use std::time::Duration;

use framedeck_core::persist::PersistedImage;
use framedeck_core::{PipelineObserver, Stage};
use indicatif::{ProgressBar, ProgressStyle};

/// Terminal spinner that follows the pipeline stages.
pub struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress bar template"),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

impl PipelineObserver for SpinnerProgress {
    fn stage_started(&self, stage: Stage) {
        let message = match stage {
            Stage::Fetch => "Downloading video...",
            Stage::Sample => "Extracting frames from video...",
            Stage::Persist => return,
            Stage::Assemble => "Creating PowerPoint presentation...",
        };
        self.bar.set_message(message);
    }

    fn frame_persisted(&self, image: &PersistedImage) {
        self.bar.set_message(format!(
            "Extracting frames from video... {} saved (frame {})",
            image.ordinal + 1,
            image.index
        ));
    }

    fn stage_finished(&self, stage: Stage) {
        match stage {
            Stage::Fetch => self.bar.println("Video downloaded"),
            Stage::Persist => self.bar.println("Frames extracted"),
            Stage::Sample | Stage::Assemble => {}
        }
    }
}
