//! Telemetry extraction from noisy OCR text.
//!
//! This module provides:
//! - Mission clock parsing (`clock`)
//! - Plausibility gates for speed and altitude (`filter`)
//! - Per-stage state (`stage`)
//! - Per-vehicle tracking with sub-second interpolation (`tracker`)
//! - Column-wise series for charts (`series`)

pub mod clock;
pub mod filter;
pub mod series;
pub mod stage;
pub mod tracker;

pub use series::{Field, TelemetrySeries};
pub use stage::StageReading;
pub use tracker::{Sample, Tracker};
