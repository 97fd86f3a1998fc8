//! Frames read from image files.
//!
//! Recorded launches are replayed by extracting the video into numbered
//! frames (e.g. `ffmpeg -i launch.mp4 frames/%06d.png`) and pointing the
//! source at the directory.

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use super::FrameSource;

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Replays image files in file-name order.
pub struct ImageSequenceSource {
    pending: VecDeque<PathBuf>,
}

impl ImageSequenceSource {
    /// Opens a directory of frames, or a single image file.
    ///
    /// `max_frames` limits how many frames are replayed.
    pub fn open(path: &Path, max_frames: Option<usize>) -> Result<Self> {
        let mut frames = if path.is_dir() {
            list_frames(path)?
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            return Err(anyhow!("Frame source not found: {}", path.display()));
        };

        if frames.is_empty() {
            return Err(anyhow!("No image files in {}", path.display()));
        }
        if let Some(max) = max_frames {
            frames.truncate(max);
        }

        Ok(Self {
            pending: frames.into(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<RgbaImage>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        let img = image::open(&path)
            .with_context(|| format!("Failed to load frame {}", path.display()))?;
        Ok(Some(img.to_rgba8()))
    }
}

fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_frame_file(p))
        .collect();
    frames.sort();
    Ok(frames)
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    fn write_frame(dir: &Path, name: &str, shade: u8) {
        let img = RgbaImage::from_pixel(4, 3, Rgba([shade, shade, shade, 255]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_frames_replay_in_name_order() {
        let dir = tempdir().unwrap();
        write_frame(dir.path(), "000002.png", 20);
        write_frame(dir.path(), "000001.png", 10);
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageSequenceSource::open(dir.path(), None).unwrap();
        assert_eq!(source.remaining(), 2);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.dimensions(), (4, 3));
        assert_eq!(first.get_pixel(0, 0)[0], 10);
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.get_pixel(0, 0)[0], 20);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_max_frames_limits_replay() {
        let dir = tempdir().unwrap();
        for i in 0..5 {
            write_frame(dir.path(), &format!("{:06}.png", i), 0);
        }
        let source = ImageSequenceSource::open(dir.path(), Some(3)).unwrap();
        assert_eq!(source.remaining(), 3);
    }

    #[test]
    fn test_single_file_source() {
        let dir = tempdir().unwrap();
        write_frame(dir.path(), "frame.png", 0);
        let mut source = ImageSequenceSource::open(&dir.path().join("frame.png"), None).unwrap();
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_empty_or_missing_source_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(ImageSequenceSource::open(dir.path(), None).is_err());
        assert!(ImageSequenceSource::open(&dir.path().join("missing"), None).is_err());
    }
}
