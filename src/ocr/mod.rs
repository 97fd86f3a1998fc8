//! Text recognition for fixed overlay regions.
//!
//! This module provides:
//! - Tesseract discovery and model download (`setup`)
//! - Crop, binarize and upscale of a region (`preprocess`)
//! - The recognizer seam and its Tesseract implementation (`engine`)
//! - Readout regions with a character allowlist (`region`)

pub mod engine;
pub mod preprocess;
pub mod region;
pub mod setup;

pub use engine::{TesseractRecognizer, TextRecognizer};
pub use region::{TextRegion, CLOCK_ALLOWLIST, NUMBER_ALLOWLIST};
pub use setup::ensure_tesseract;
