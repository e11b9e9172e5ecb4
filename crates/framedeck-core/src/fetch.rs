use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, error, info, warn};

use crate::error::FetchError;

/// Turns a video locator into a playable local file.
pub trait VideoFetcher {
    /// Fetch `locator` into `destination` and return the path of the video file.
    fn fetch(&self, locator: &str, destination: &Path) -> Result<PathBuf, FetchError>;
}

impl<T: VideoFetcher + ?Sized> VideoFetcher for Box<T> {
    fn fetch(&self, locator: &str, destination: &Path) -> Result<PathBuf, FetchError> {
        (**self).fetch(locator, destination)
    }
}

fn check_locator(locator: &str) -> Result<&str, FetchError> {
    let trimmed = locator.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return Err(FetchError::InvalidLocator(locator.to_owned()));
    }
    Ok(trimmed)
}

/// Downloads with the `yt-dlp` CLI.
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    program: String,
}

impl YtDlpFetcher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl VideoFetcher for YtDlpFetcher {
    fn fetch(&self, locator: &str, destination: &Path) -> Result<PathBuf, FetchError> {
        let locator = check_locator(locator)?;
        // yt-dlp creates the directory itself; remember whether it did.
        let existed = destination.exists();
        if existed && !destination.is_dir() {
            return Err(FetchError::Destination {
                path: destination.to_path_buf(),
                source: std::io::Error::other("not a directory"),
            });
        }

        let template = destination.join("%(title)s.%(ext)s");
        info!(locator, program = %self.program, ?destination, "downloading video");

        // yt-dlp prints the final path once post-processing has moved the file.
        let output = Command::new(&self.program)
            .args(["--no-playlist", "--no-simulate", "--no-progress"])
            .args(["--print", "after_move:filepath"])
            .arg("-o")
            .arg(&template)
            .arg("--")
            .arg(locator)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| FetchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            error!(%stderr, status = %output.status, locator, "download failed");
            discard_partial_download(destination, existed);
            return Err(FetchError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .map(PathBuf::from)
            .filter(|p| p.is_file())
            .ok_or_else(|| {
                error!(%stdout, locator, "download reported no usable file");
                discard_partial_download(destination, existed);
                FetchError::NoOutput {
                    locator: locator.to_owned(),
                }
            })?;

        info!(?path, "video downloaded");
        Ok(path)
    }
}

/// Undo what a failed download left in `destination`: the whole directory
/// if yt-dlp created it, otherwise only its partial and temporary files.
fn discard_partial_download(destination: &Path, existed: bool) {
    if !existed {
        if let Err(e) = std::fs::remove_dir_all(destination) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(?destination, %e, "failed to remove download directory");
            }
        }
        return;
    }

    let Ok(entries) = std::fs::read_dir(destination) else {
        return;
    };
    for path in entries.filter_map(|entry| entry.ok().map(|e| e.path())) {
        let partial = path
            .extension()
            .is_some_and(|ext| ext == "part" || ext == "ytdl");
        if partial && path.is_file() {
            debug!(?path, "removing partial download");
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(?path, %e, "failed to remove partial download");
            }
        }
    }
}

/// Accepts locators that already name a local file; nothing is copied.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileFetcher;

impl VideoFetcher for LocalFileFetcher {
    fn fetch(&self, locator: &str, _destination: &Path) -> Result<PathBuf, FetchError> {
        let path = PathBuf::from(check_locator(locator)?);
        if !path.is_file() {
            return Err(FetchError::NoOutput {
                locator: locator.to_owned(),
            });
        }
        info!(?path, "using local video file");
        Ok(path)
    }
}

/// The local fetcher when `locator` names an existing file, yt-dlp otherwise.
pub fn fetcher_for(locator: &str, yt_dlp: &str) -> Box<dyn VideoFetcher> {
    if Path::new(locator.trim()).is_file() {
        Box::new(LocalFileFetcher)
    } else {
        Box::new(YtDlpFetcher::new(yt_dlp))
    }
}
