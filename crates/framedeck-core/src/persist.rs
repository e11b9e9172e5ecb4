use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::{debug, info};

use crate::error::PersistenceError;
use crate::video::frame::SampledFrame;

/// A sampled frame written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedImage {
    pub path: PathBuf,
    /// Position in emission order, starting at 0.
    pub ordinal: usize,
    /// Index of the source frame in the video stream.
    pub index: u64,
}

/// File name for the frame at `index`. Zero padded so that name order and
/// index order agree.
pub fn frame_file_name(index: u64) -> String {
    format!("frame_{index:08}.jpg")
}

/// Writes sampled frames as JPEG files into one directory, assigning ordinals
/// in the order frames are written.
pub struct ImagePersister {
    dir: PathBuf,
    written: Vec<PersistedImage>,
}

impl ImagePersister {
    /// Prepare `dir`, creating it (and parents) if missing.
    pub fn create(dir: &Path) -> Result<Self, PersistenceError> {
        std::fs::create_dir_all(dir).map_err(|source| PersistenceError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        info!(?dir, "frames directory ready");
        Ok(Self {
            dir: dir.to_path_buf(),
            written: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one frame. A failed write leaves any partial file in place.
    pub fn write(&mut self, frame: &SampledFrame) -> Result<&PersistedImage, PersistenceError> {
        let path = self.dir.join(frame_file_name(frame.index));
        frame
            .image
            .save_with_format(&path, ImageFormat::Jpeg)
            .map_err(|source| PersistenceError::Write {
                path: path.clone(),
                source,
            })?;

        let ordinal = self.written.len();
        debug!(?path, ordinal, index = frame.index, "saved frame");
        self.written.push(PersistedImage {
            path,
            ordinal,
            index: frame.index,
        });
        Ok(&self.written[ordinal])
    }

    pub fn len(&self) -> usize {
        self.written.len()
    }

    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }

    /// The images written so far, in ordinal order.
    pub fn finish(self) -> Vec<PersistedImage> {
        info!(count = self.written.len(), dir = ?self.dir, "frames persisted");
        self.written
    }
}

/// Write every frame into `dir`, in iteration order.
pub fn persist(
    frames: impl IntoIterator<Item = SampledFrame>,
    dir: &Path,
) -> Result<Vec<PersistedImage>, PersistenceError> {
    let mut persister = ImagePersister::create(dir)?;
    for frame in frames {
        persister.write(&frame)?;
    }
    Ok(persister.finish())
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use tracing_test::traced_test;

    use super::*;

    fn frame(index: u64) -> SampledFrame {
        let mut image = RgbImage::new(32, 24);
        for (x, y, px) in image.enumerate_pixels_mut() {
            *px = Rgb([(index * 40 % 256) as u8, (x * 8) as u8, (y * 10) as u8]);
        }
        SampledFrame {
            index,
            timestamp_seconds: index as f64 / 30.0,
            image,
        }
    }

    #[test]
    fn names_sort_like_indices() {
        let mut names: Vec<String> = [10u64, 9, 150, 1500, 0].iter().map(|&i| frame_file_name(i)).collect();
        names.sort();
        assert_eq!(
            names,
            ["frame_00000000.jpg", "frame_00000009.jpg", "frame_00000010.jpg", "frame_00000150.jpg", "frame_00001500.jpg"]
        );
    }

    #[test]
    #[traced_test]
    fn ordinals_follow_input_order() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested/frames");
        // Deliberately not in index order: ordinals must follow emission, not names.
        let images = persist([300, 0, 150].map(frame), &dir).unwrap();

        assert_eq!(images.len(), 3);
        let ordinals: Vec<usize> = images.iter().map(|i| i.ordinal).collect();
        assert_eq!(ordinals, [0, 1, 2]);
        let indices: Vec<u64> = images.iter().map(|i| i.index).collect();
        assert_eq!(indices, [300, 0, 150]);
        for image in &images {
            assert!(image.path.is_file());
            assert_eq!(image.path.parent().unwrap(), dir);
        }
        assert!(logs_contain("frames persisted"));
    }

    #[test]
    fn written_files_decode_as_jpeg() {
        let tmp = tempfile::tempdir().unwrap();
        let images = persist([frame(0)], tmp.path()).unwrap();
        let data = std::fs::read(&images[0].path).unwrap();
        assert_eq!(image::guess_format(&data).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn persisting_twice_is_deterministic() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let first = persist([0, 150, 300].map(frame), a.path()).unwrap();
        let second = persist([0, 150, 300].map(frame), b.path()).unwrap();

        assert_eq!(first.len(), second.len());
        for (x, y) in first.iter().zip(&second) {
            assert_eq!(x.ordinal, y.ordinal);
            assert_eq!(x.path.file_name(), y.path.file_name());
            assert_eq!(std::fs::read(&x.path).unwrap(), std::fs::read(&y.path).unwrap());
        }
    }

    #[test]
    fn leaves_unrelated_files_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let video = tmp.path().join("My Video.mp4");
        std::fs::write(&video, b"not really a video").unwrap();

        persist([frame(0), frame(150)], tmp.path()).unwrap();

        assert_eq!(std::fs::read(&video).unwrap(), b"not really a video");
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 3);
    }

    #[test]
    fn empty_input_creates_directory_only() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("frames");
        let images = persist(std::iter::empty(), &dir).unwrap();
        assert!(images.is_empty());
        assert!(dir.is_dir());
    }

    #[test]
    fn directory_that_is_a_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("frames");
        std::fs::write(&blocker, b"").unwrap();

        let err = persist([frame(0)], &blocker).unwrap_err();
        assert!(matches!(err, PersistenceError::CreateDir { .. }), "{err}");
    }

    #[test]
    fn write_failure_stops_and_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        let mut persister = ImagePersister::create(tmp.path()).unwrap();
        persister.write(&frame(0)).unwrap();

        // A directory squatting on the next file name makes the write fail.
        std::fs::create_dir(persister.dir().join(frame_file_name(150))).unwrap();
        let err = persister.write(&frame(150)).unwrap_err();
        match err {
            PersistenceError::Write { path, .. } => assert!(path.ends_with("frame_00000150.jpg")),
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(persister.len(), 1);
    }
}
