use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::TesseractPaths;

/// Recognizes text lines in a preprocessed crop.
///
/// `allowlist` restricts the characters the engine may output.
/// Lines are returned in reading order, trimmed, without empty lines.
pub trait TextRecognizer {
    fn recognize(&self, img: &GrayImage, allowlist: &str) -> Result<Vec<String>>;
}

/// Runs the Tesseract CLI once per crop.
#[derive(Clone, Debug)]
pub struct TesseractRecognizer {
    executable: PathBuf,
    tessdata: PathBuf,
}

impl TesseractRecognizer {
    pub fn new(paths: TesseractPaths) -> Self {
        Self {
            executable: paths.executable,
            tessdata: paths.tessdata,
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, img: &GrayImage, allowlist: &str) -> Result<Vec<String>> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write OCR input image")?;

        let output = Command::new(&self.executable)
            .arg(temp_input.path())
            .arg("stdout")
            .arg("--tessdata-dir")
            .arg(&self.tessdata)
            .arg("-l")
            .arg("eng")
            .arg("--psm")
            .arg("7") // Treat the image as a single text line
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={}", allowlist))
            .output()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(parse_lines(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Splits plain-text OCR output into trimmed, non-empty lines.
fn parse_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
