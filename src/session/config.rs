//! Configuration types for a tracking session.
//!
//! Loads screen layouts and filter thresholds from setting.json. Every
//! section except `rockets` falls back to defaults when absent.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up next to the executable and in the working directory.
pub const CONFIG_FILE_NAME: &str = "setting.json";

/// A screen region in absolute pixels, written as `[x1, y1, x2, y2]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct PixelRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl From<[u32; 4]> for PixelRect {
    fn from([x1, y1, x2, y2]: [u32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<PixelRect> for [u32; 4] {
    fn from(r: PixelRect) -> Self {
        [r.x1, r.y1, r.x2, r.y2]
    }
}

impl PixelRect {
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }
}

/// Speed and altitude readouts of one stage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageLayout {
    pub speed: PixelRect,
    pub altitude: PixelRect,
}

/// Overlay layout of one vehicle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RocketLayout {
    /// Mission clock (`T+HH:MM:SS`)
    pub time: PixelRect,
    #[serde(rename = "Stage1")]
    pub stage1: StageLayout,
    /// Present for vehicles whose overlay shows a second stage
    #[serde(rename = "Stage2", default, skip_serializing_if = "Option::is_none")]
    pub stage2: Option<StageLayout>,
}

impl RocketLayout {
    /// Stage layouts in stage order.
    pub fn stages(&self) -> Vec<StageLayout> {
        std::iter::once(self.stage1).chain(self.stage2).collect()
    }
}

/// Desktop region grabbed by the screen source.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 1920,
            height: 1080,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Binarize bright text: pixels with R, G, B all above this become text.
    /// `None` feeds the grayscale crop as-is.
    pub threshold: Option<u8>,
    /// Crops shorter than this are upscaled before recognition
    pub min_height: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            threshold: None,
            min_height: 48,
        }
    }
}

/// Plausibility thresholds for the per-field filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Frames per clock second, used to interpolate between clock ticks
    pub frame_rate: f64,
    /// Speed may grow by less than this per frame (`null` disables the cap)
    pub speed_max_step: Option<f64>,
    pub altitude_offset: f64,
    pub altitude_factor: f64,
    /// Altitudes at or above this are always misreads
    pub altitude_ceiling: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            speed_max_step: Some(1000.0),
            altitude_offset: 5.0,
            altitude_factor: 20.0,
            altitude_ceiling: 6000.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    /// The chart PNG is rewritten every this many frames (0 = only at the end)
    pub refresh_frames: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            refresh_frames: 60,
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    /// Overlay layouts by vehicle name
    #[serde(default)]
    pub rockets: BTreeMap<String, RocketLayout>,
}

impl AppConfig {
    /// Parses a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Loads the configuration.
    ///
    /// An explicit path must exist. Otherwise setting.json is looked up next
    /// to the executable, then in the working directory; when neither exists
    /// the defaults are used (with no vehicle layouts).
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            crate::log(&format!("Loading config from {}", path.display()));
            return Self::from_file(path);
        }

        for path in default_config_paths() {
            crate::log(&format!("Looking for config at: {}", path.display()));
            if path.exists() {
                let config = Self::from_file(&path)?;
                crate::log(&format!(
                    "Config loaded from {} ({} vehicle layouts)",
                    path.display(),
                    config.rockets.len()
                ));
                return Ok(config);
            }
        }

        crate::log("setting.json not found. Using default config.");
        Ok(Self::default())
    }

    /// Looks up the layout of a vehicle by name.
    pub fn rocket(&self, name: &str) -> Result<&RocketLayout> {
        self.rockets.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.rockets.keys().map(String::as_str).collect();
            anyhow!(
                "No layout for \"{}\" in {} (known: {})",
                name,
                CONFIG_FILE_NAME,
                if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                }
            )
        })
    }
}

fn default_config_paths() -> Vec<PathBuf> {
    vec![
        crate::paths::get_exe_dir().join(CONFIG_FILE_NAME),
        PathBuf::from(CONFIG_FILE_NAME),
    ]
}
