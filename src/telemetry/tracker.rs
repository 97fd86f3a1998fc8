//! Per-vehicle tracking: clock, stages and sub-second interpolation.

use anyhow::{anyhow, Result};
use image::RgbaImage;

use super::clock::{normalize_clock_text, update_clock};
use super::filter::{AltitudeGate, SpeedGate};
use super::stage::{Stage, StageReading};
use crate::ocr::{TextRecognizer, TextRegion, CLOCK_ALLOWLIST, NUMBER_ALLOWLIST};
use crate::session::config::{FilterConfig, OcrConfig, RocketLayout};

/// Raw OCR text for one frame of one vehicle. `None` means nothing was read.
#[derive(Clone, Debug, Default)]
pub struct FrameReadings {
    pub time: Option<String>,
    /// `(speed, altitude)` per stage, in stage order.
    pub stages: Vec<(Option<String>, Option<String>)>,
}

/// Filtered telemetry for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub rocket: String,
    /// Mission time in seconds, interpolated between clock ticks.
    pub time: f64,
    pub stages: Vec<StageReading>,
}

struct StageRegions {
    speed: TextRegion,
    altitude: TextRegion,
}

/// Tracks one vehicle's overlay.
pub struct Tracker {
    name: String,
    time_region: TextRegion,
    stage_regions: Vec<StageRegions>,
    stages: Vec<Stage>,
    time_text: String,
    clock: i64,
    last_clock: i64,
    frames_at_clock: u32,
    frame_rate: f64,
}

impl Tracker {
    /// Builds a tracker from a vehicle layout.
    pub fn new(name: &str, layout: &RocketLayout, filter: &FilterConfig) -> Result<Self> {
        if filter.frame_rate <= 0.0 {
            return Err(anyhow!("frame_rate must be positive, got {}", filter.frame_rate));
        }

        let speed_gate = SpeedGate {
            max_step: filter.speed_max_step,
        };
        let altitude_gate = AltitudeGate {
            offset: filter.altitude_offset,
            factor: filter.altitude_factor,
            ceiling: filter.altitude_ceiling,
        };

        let mut stage_regions = Vec::new();
        let mut stages = Vec::new();
        for (idx, stage_layout) in layout.stages().into_iter().enumerate() {
            stage_regions.push(StageRegions {
                speed: TextRegion::new(stage_layout.speed, NUMBER_ALLOWLIST),
                altitude: TextRegion::new(stage_layout.altitude, NUMBER_ALLOWLIST),
            });
            stages.push(Stage::new((idx + 1) as u8, speed_gate, altitude_gate));
        }

        Ok(Self {
            name: name.to_string(),
            time_region: TextRegion::new(layout.time, CLOCK_ALLOWLIST),
            stage_regions,
            stages,
            time_text: String::new(),
            clock: 0,
            last_clock: 0,
            frames_at_clock: 0,
            frame_rate: filter.frame_rate,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Reads every region of `frame` and feeds the result to [`Tracker::observe`].
    pub fn update(
        &mut self,
        frame: &RgbaImage,
        recognizer: &dyn TextRecognizer,
        options: &OcrConfig,
    ) -> Sample {
        let time = self.time_region.detect(frame, recognizer, options);

        let stages = self
            .stage_regions
            .iter()
            .map(|regions| {
                (
                    regions.speed.detect(frame, recognizer, options),
                    regions.altitude.detect(frame, recognizer, options),
                )
            })
            .collect();

        self.observe(FrameReadings { time, stages })
    }

    /// Applies one frame of OCR text and returns the filtered sample.
    pub fn observe(&mut self, readings: FrameReadings) -> Sample {
        if let Some(text) = readings.time {
            self.time_text = text;
        }
        self.clock = update_clock(self.clock, &normalize_clock_text(&self.time_text));

        if self.clock == self.last_clock {
            self.frames_at_clock += 1;
        } else {
            self.frames_at_clock = 0;
        }
        self.last_clock = self.clock;

        let mut inputs = readings.stages.into_iter();
        let mut stage_readings = Vec::with_capacity(self.stages.len());
        for idx in 0..self.stages.len() {
            let (speed, mut altitude) = inputs.next().unwrap_or((None, None));
            // Upper stages share the first stage's altitude readout
            if idx > 0 && altitude.is_none() {
                altitude = Some(self.stages[0].altitude_text().to_string());
            }
            stage_readings.push(self.stages[idx].update(speed.as_deref(), altitude.as_deref()));
        }

        Sample {
            rocket: self.name.clone(),
            time: self.clock as f64 + self.frames_at_clock as f64 / self.frame_rate,
            stages: stage_readings,
        }
    }
}
