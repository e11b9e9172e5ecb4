mod cli;
mod progress;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Input;
use tracing::{error, info};

use framedeck_core::fetch::fetcher_for;
use framedeck_core::video::FfmpegOpener;
use framedeck_core::{Pipeline, PipelineConfig, StridePolicy};

use progress::SpinnerProgress;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let locator = match resolve_locator(cli.locator.as_deref()) {
        Ok(locator) => locator,
        Err(e) => {
            error!(error = %format!("{e:#}"), "no video locator");
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let config = PipelineConfig {
        interval_seconds: cli.interval,
        stride_policy: if cli.truncate_frame_rate {
            StridePolicy::TruncatedRate
        } else {
            StridePolicy::Exact
        },
        frames_dir: cli.frames_dir,
        output: cli.output,
    };
    info!(%locator, ?config, "starting");

    let pipeline = Pipeline::new(fetcher_for(&locator, &cli.yt_dlp), FfmpegOpener::default(), config);
    let progress = SpinnerProgress::new();

    match pipeline.run(&locator, &progress) {
        Ok(summary) => {
            progress.finish();
            println!("Video: {}", summary.video.display());
            println!("Extracted {} frames.", summary.images.len());
            println!(
                "Slide deck created: {} ({} slides)",
                summary.deck.path.display(),
                summary.deck.slide_count
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            progress.abandon();
            let code = e.exit_code();
            let stage = e.stage();
            let e = anyhow::Error::new(e);
            error!(?stage, error = %format!("{e:#}"), "pipeline failed");
            eprintln!("Error: {e:#}");
            ExitCode::from(code)
        }
    }
}

/// The locator from the command line, or interactively from the user.
fn resolve_locator(arg: Option<&str>) -> Result<String> {
    if let Some(locator) = arg {
        return Ok(locator.trim().to_owned());
    }

    let locator: String = Input::new()
        .with_prompt("Enter video URL")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("the video URL cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .context("failed to read video URL")?;
    Ok(locator.trim().to_owned())
}
