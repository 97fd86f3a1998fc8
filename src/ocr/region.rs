use image::RgbaImage;

use super::engine::TextRecognizer;
use super::preprocess::prepare_region;
use crate::session::config::{OcrConfig, PixelRect};

/// Characters a speed or altitude readout may contain.
pub const NUMBER_ALLOWLIST: &str = ".0123456789";

/// Characters the mission clock may contain.
pub const CLOCK_ALLOWLIST: &str = "T+-:0123456789";

/// A fixed screen region holding one readout.
#[derive(Clone, Debug)]
pub struct TextRegion {
    pub rect: PixelRect,
    pub allowlist: &'static str,
}

impl TextRegion {
    pub fn new(rect: PixelRect, allowlist: &'static str) -> Self {
        Self { rect, allowlist }
    }

    /// Reads the region and returns the first recognized line with all
    /// whitespace removed.
    ///
    /// Returns `None` when nothing was recognized. Recognizer failures are
    /// logged and treated the same way.
    pub fn detect(
        &self,
        frame: &RgbaImage,
        recognizer: &dyn TextRecognizer,
        options: &OcrConfig,
    ) -> Option<String> {
        let prepared = prepare_region(frame, &self.rect, options)?;

        let lines = match recognizer.recognize(&prepared, self.allowlist) {
            Ok(lines) => lines,
            Err(e) => {
                crate::log(&format!("OCR failed for region {:?}: {}", self.rect, e));
                return None;
            }
        };

        lines
            .into_iter()
            .map(|line| line.chars().filter(|c| !c.is_whitespace()).collect::<String>())
            .find(|line| !line.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use image::GrayImage;

    struct FixedRecognizer(Vec<&'static str>);

    impl TextRecognizer for FixedRecognizer {
        fn recognize(&self, _img: &GrayImage, _allowlist: &str) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct FailingRecognizer;

    impl TextRecognizer for FailingRecognizer {
        fn recognize(&self, _img: &GrayImage, _allowlist: &str) -> Result<Vec<String>> {
            Err(anyhow!("engine crashed"))
        }
    }

    fn region() -> TextRegion {
        TextRegion::new(PixelRect { x1: 0, y1: 0, x2: 10, y2: 10 }, NUMBER_ALLOWLIST)
    }

    #[test]
    fn test_detect_returns_first_line_without_spaces() {
        let frame = RgbaImage::new(20, 20);
        let recognizer = FixedRecognizer(vec!["12 345", "999"]);
        assert_eq!(
            region().detect(&frame, &recognizer, &OcrConfig::default()),
            Some("12345".to_string())
        );
    }

    #[test]
    fn test_detect_empty_result_is_none() {
        let frame = RgbaImage::new(20, 20);
        let recognizer = FixedRecognizer(vec![]);
        assert_eq!(region().detect(&frame, &recognizer, &OcrConfig::default()), None);
    }

    #[test]
    fn test_detect_failure_is_none() {
        let frame = RgbaImage::new(20, 20);
        assert_eq!(
            region().detect(&frame, &FailingRecognizer, &OcrConfig::default()),
            None
        );
    }

    #[test]
    fn test_detect_region_outside_frame_is_none() {
        let frame = RgbaImage::new(5, 5);
        let far = TextRegion::new(PixelRect { x1: 50, y1: 50, x2: 60, y2: 60 }, NUMBER_ALLOWLIST);
        let recognizer = FixedRecognizer(vec!["1"]);
        assert_eq!(far.detect(&frame, &recognizer, &OcrConfig::default()), None);
    }
}
