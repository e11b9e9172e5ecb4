use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;

use image::RgbImage;
use tracing::{debug, error, info, warn};

use super::{FfmpegOpener, FrameSource};
use crate::error::StreamError;

/// How much of ffmpeg's stderr is kept for error reports.
const STDERR_TAIL_BYTES: usize = 16 * 1024;

/// Video metadata obtained by probing with ffprobe.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ProbeResult {
    width: u32,
    height: u32,
    fps: f64,
}

fn probe(ffprobe: &str, path: &Path) -> Result<ProbeResult, StreamError> {
    info!(?path, "probing video metadata with ffprobe");

    let output = Command::new(ffprobe)
        .args([
            "-v", "error",
            "-select_streams", "v:0",
            "-show_entries", "stream=width,height,r_frame_rate",
            "-of", "csv=p=0",
        ])
        .arg(path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| StreamError::Open {
            path: path.to_path_buf(),
            reason: format!("failed to run ffprobe, is ffmpeg installed? ({e})"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(%stderr, ?path, "ffprobe failed");
        return Err(StreamError::Open {
            path: path.to_path_buf(),
            reason: stderr.trim().to_owned(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_probe_line(&stdout).map_err(|reason| {
        error!(%stdout, %reason, "unexpected ffprobe output");
        StreamError::Probe {
            path: path.to_path_buf(),
            reason,
        }
    })
}

/// Parse `width,height,num/den` as printed by ffprobe's csv writer.
fn parse_probe_line(stdout: &str) -> Result<ProbeResult, String> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or("no video stream found")?;

    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 3 {
        return Err(format!("expected width,height,fps, got {line:?}"));
    }

    let width: u32 = parts[0]
        .parse()
        .map_err(|e| format!("failed to parse width {:?}: {e}", parts[0]))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|e| format!("failed to parse height {:?}: {e}", parts[1]))?;

    let fps = if let Some((num, den)) = parts[2].split_once('/') {
        let num: f64 = num
            .parse()
            .map_err(|e| format!("failed to parse fps numerator {num:?}: {e}"))?;
        let den: f64 = den
            .parse()
            .map_err(|e| format!("failed to parse fps denominator {den:?}: {e}"))?;
        if den > 0.0 { num / den } else { 0.0 }
    } else {
        parts[2]
            .parse()
            .map_err(|e| format!("failed to parse fps {:?}: {e}", parts[2]))?
    };

    if width == 0 || height == 0 {
        return Err(format!("invalid video dimensions: {width}x{height}"));
    }

    Ok(ProbeResult { width, height, fps })
}

/// ffmpeg invocation writing raw RGB24 frames to stdout.
///
/// Autorotation is disabled so frames keep the coded dimensions reported by
/// ffprobe; a rotated stream would otherwise come out transposed.
fn decode_command(ffmpeg: &str, path: &Path) -> Command {
    let mut command = Command::new(ffmpeg);
    command
        .args(["-nostdin", "-noautorotate", "-i"])
        .arg(path)
        .args([
            "-an", "-sn",
            "-f", "rawvideo",
            "-pix_fmt", "rgb24",
            "-v", "error",
            "pipe:1",
        ]);
    command
}

/// Read `pipe` to the end, keeping only the last [`STDERR_TAIL_BYTES`].
fn drain_tail(mut pipe: impl Read) -> String {
    let mut tail = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        match pipe.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                tail.extend_from_slice(&buf[..n]);
                if tail.len() > STDERR_TAIL_BYTES {
                    let excess = tail.len() - STDERR_TAIL_BYTES;
                    tail.drain(..excess);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&tail).into_owned()
}

/// Decodes video frames by piping raw RGB24 data from the ffmpeg CLI.
///
/// ffmpeg's stderr is drained on a separate thread so a chatty decoder never
/// blocks on a full pipe. The child is killed and reaped on drop, so the
/// decoder releases its process on every exit path.
pub struct VideoDecoder {
    path: PathBuf,
    child: Child,
    stderr: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    fps: f64,
    frame_count: u64,
    frame_bytes: usize,
    finished: bool,
}

impl VideoDecoder {
    /// Open a video file for decoding with `ffprobe` and `ffmpeg` from `PATH`.
    pub fn open(path: &Path) -> Result<Self, StreamError> {
        Self::open_with(path, &FfmpegOpener::default())
    }

    /// Open a video file for decoding with the programs named by `tools`.
    pub fn open_with(path: &Path, tools: &FfmpegOpener) -> Result<Self, StreamError> {
        if !path.is_file() {
            return Err(StreamError::Open {
                path: path.to_path_buf(),
                reason: "file does not exist".into(),
            });
        }

        let info = probe(&tools.ffprobe, path)?;
        if info.fps <= 0.0 {
            warn!(fps = info.fps, ?path, "video reports a non-positive frame rate");
        }

        info!(?path, "spawning ffmpeg decoder process");

        let mut child = decode_command(&tools.ffmpeg, path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| StreamError::Open {
                path: path.to_path_buf(),
                reason: format!("failed to spawn ffmpeg, is ffmpeg installed? ({e})"),
            })?;
        let stderr = child
            .stderr
            .take()
            .map(|pipe| std::thread::spawn(move || drain_tail(pipe)));

        let frame_bytes = (info.width as usize) * (info.height as usize) * 3;

        info!(
            width = info.width,
            height = info.height,
            fps = info.fps,
            frame_bytes,
            "video decoder opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            child,
            stderr,
            width: info.width,
            height: info.height,
            fps: info.fps,
            frame_count: 0,
            frame_bytes,
            finished: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn decode_error(&self, reason: String) -> StreamError {
        StreamError::Decode {
            frame: self.frame_count,
            reason,
        }
    }

    /// Collected stderr. Only call once ffmpeg has exited.
    fn stderr_tail(&mut self) -> String {
        self.stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }

    /// Reap ffmpeg after its stdout closed and surface a non-zero exit.
    fn finish(&mut self) -> Result<(), StreamError> {
        self.finished = true;
        let status = self
            .child
            .wait()
            .map_err(|e| self.decode_error(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr = self.stderr_tail();
        let stderr = stderr.trim();
        if status.success() {
            if !stderr.is_empty() {
                warn!(%stderr, path = ?self.path, "ffmpeg reported errors while decoding");
            }
            return Ok(());
        }

        error!(%status, %stderr, path = ?self.path, "ffmpeg exited with an error");
        Err(self.decode_error(format!("ffmpeg exited with {status}: {stderr}")))
    }
}

impl FrameSource for VideoDecoder {
    fn frame_rate(&self) -> f64 {
        self.fps
    }

    /// Read the next frame from the ffmpeg pipe, or `None` if the video is finished.
    fn next_frame(&mut self) -> Result<Option<RgbImage>, StreamError> {
        if self.finished {
            return Ok(None);
        }

        let frame_bytes = self.frame_bytes;
        let frame_count = self.frame_count;
        let stdout = self
            .child
            .stdout
            .as_mut()
            .ok_or_else(|| StreamError::Decode {
                frame: frame_count,
                reason: "ffmpeg stdout not available".into(),
            })?;

        let mut buf = vec![0u8; frame_bytes];
        let mut read = 0;

        while read < frame_bytes {
            match stdout.read(&mut buf[read..]) {
                Ok(0) => {
                    if read == 0 {
                        info!(total_frames = frame_count, "video stream ended");
                        self.finish()?;
                        return Ok(None);
                    }
                    error!(
                        read_bytes = read,
                        expected_bytes = frame_bytes,
                        frame = frame_count,
                        "ffmpeg stream ended mid-frame"
                    );
                    self.finished = true;
                    let _ = self.child.wait();
                    let stderr = self.stderr_tail();
                    return Err(self.decode_error(format!(
                        "ffmpeg stream ended mid-frame (read {read}/{frame_bytes} bytes): {}",
                        stderr.trim()
                    )));
                }
                Ok(n) => read += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    error!(frame = frame_count, %e, "failed to read from ffmpeg pipe");
                    self.finished = true;
                    return Err(self.decode_error(format!("failed to read from ffmpeg pipe: {e}")));
                }
            }
        }

        let image = RgbImage::from_raw(self.width, self.height, buf)
            .ok_or_else(|| self.decode_error("frame buffer does not match dimensions".into()))?;
        self.frame_count += 1;

        debug!(frame_number = frame_count, "decoded frame");

        Ok(Some(image))
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        info!(total_frames = self.frame_count, "closing video decoder");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
