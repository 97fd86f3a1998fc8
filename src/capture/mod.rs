//! Frame sources for the polling loop.
//!
//! This module provides:
//! - The `FrameSource` trait the session pulls frames from
//! - Desktop region capture (`screen`, Windows only)
//! - Replay of extracted video frames (`sequence`)

pub mod screen;
pub mod sequence;

pub use screen::ScreenSource;
pub use sequence::ImageSequenceSource;

use anyhow::Result;
use image::RgbaImage;

/// Produces frames until the feed ends.
pub trait FrameSource {
    /// Returns the next frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<RgbaImage>>;
}
