use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "framedeck", about = "Turn a video into a slide deck, one sampled frame per slide")]
pub struct Cli {
    /// Video URL, or path to a local video file. Prompted for when omitted.
    pub locator: Option<String>,

    /// Seconds of video between two sampled frames.
    #[arg(short, long, default_value_t = 5.0)]
    pub interval: f64,

    /// Directory for the downloaded video and the extracted frames.
    #[arg(long, default_value = "extracted_frames")]
    pub frames_dir: PathBuf,

    /// Path of the presentation to write.
    #[arg(short, long, default_value = "youtube_video_slides.pptx")]
    pub output: PathBuf,

    /// Truncate fractional frame rates (29.97 -> 29) when computing the
    /// frame stride, as older versions of this tool did.
    #[arg(long)]
    pub truncate_frame_rate: bool,

    /// yt-dlp executable used to download remote videos.
    #[arg(long, default_value = "yt-dlp")]
    pub yt_dlp: String,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_pipeline_defaults() {
        let cli = Cli::try_parse_from(["framedeck"]).unwrap();
        let defaults = framedeck_core::PipelineConfig::default();
        assert!(cli.locator.is_none());
        assert_eq!(cli.interval, defaults.interval_seconds);
        assert_eq!(cli.frames_dir, defaults.frames_dir);
        assert_eq!(cli.output, defaults.output);
        assert!(!cli.truncate_frame_rate);
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "framedeck",
            "https://example.com/watch?v=abc",
            "--interval",
            "2.5",
            "-o",
            "out/deck.pptx",
            "--truncate-frame-rate",
        ])
        .unwrap();
        assert_eq!(cli.locator.as_deref(), Some("https://example.com/watch?v=abc"));
        assert_eq!(cli.interval, 2.5);
        assert_eq!(cli.output, PathBuf::from("out/deck.pptx"));
        assert!(cli.truncate_frame_rate);
    }
}
