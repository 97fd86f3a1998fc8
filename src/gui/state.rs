//! Live view state management.
//!
//! Tracks the session status and one telemetry series per vehicle.

use std::path::PathBuf;
use std::time::Instant;

use eframe::egui::TextureHandle;

use crate::session::VehicleInfo;
use crate::telemetry::{Sample, TelemetrySeries};

/// Session status for display in the live view.
#[derive(Clone, Debug)]
pub enum SessionStatus {
    Running { start_time: Instant },
    /// The source ran out or capture stopped
    Finished { frames: u64 },
    /// Stopped by the user
    Aborted { frames: u64 },
}

impl SessionStatus {
    pub fn status_text(&self) -> String {
        match self {
            Self::Running { .. } => "Recording".to_string(),
            Self::Finished { frames } => format!("Finished ({} frames)", frames),
            Self::Aborted { frames } => format!("Stopped ({} frames)", frames),
        }
    }

    /// Elapsed time as `MM:SS` while running.
    pub fn elapsed_text(&self) -> Option<String> {
        match self {
            Self::Running { start_time } => {
                let secs = start_time.elapsed().as_secs();
                Some(format!("{:02}:{:02}", secs / 60, secs % 60))
            }
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

/// One vehicle's chart panel.
pub struct VehiclePanel {
    pub info: VehicleInfo,
    pub series: TelemetrySeries,
    /// Last sample, shown as text under the chart
    pub latest: Option<Sample>,
    pub texture: Option<TextureHandle>,
    /// Set when new samples arrived since the texture was drawn
    pub dirty: bool,
}

impl VehiclePanel {
    pub fn new(info: VehicleInfo) -> Self {
        let series = TelemetrySeries::new(info.stage_count);
        Self {
            info,
            series,
            latest: None,
            texture: None,
            dirty: true,
        }
    }
}

/// Live view state.
pub struct GuiState {
    pub status: SessionStatus,
    pub session_dir: PathBuf,
    pub panels: Vec<VehiclePanel>,
    pub stop_requested: bool,
}

impl GuiState {
    pub fn new(session_dir: PathBuf, vehicles: Vec<VehicleInfo>) -> Self {
        Self {
            status: SessionStatus::Running {
                start_time: Instant::now(),
            },
            session_dir,
            panels: vehicles.into_iter().map(VehiclePanel::new).collect(),
            stop_requested: false,
        }
    }

    /// Routes samples to their vehicle panels. Samples for unknown vehicles
    /// are dropped.
    pub fn apply_samples(&mut self, samples: Vec<Sample>) {
        for sample in samples {
            if let Some(panel) = self
                .panels
                .iter_mut()
                .find(|p| p.info.name == sample.rocket)
            {
                panel.series.push(&sample);
                panel.latest = Some(sample);
                panel.dirty = true;
            }
        }
    }

    /// Marks the session as over once the polling loop has hung up.
    pub fn finish(&mut self, frames: u64) {
        if self.status.is_running() {
            self.status = if self.stop_requested {
                SessionStatus::Aborted { frames }
            } else {
                SessionStatus::Finished { frames }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::StageReading;

    fn info(name: &str, stage_count: usize) -> VehicleInfo {
        VehicleInfo {
            name: name.to_string(),
            stage_count,
        }
    }

    fn sample(rocket: &str, time: f64) -> Sample {
        Sample {
            rocket: rocket.to_string(),
            time,
            stages: vec![StageReading {
                altitude: 1.0,
                speed: 100.0,
            }],
        }
    }

    #[test]
    fn test_apply_samples_routes_by_vehicle() {
        let mut state = GuiState::new(PathBuf::from("out"), vec![info("H3", 2), info("F9", 1)]);
        for panel in &mut state.panels {
            panel.dirty = false;
        }

        state.apply_samples(vec![sample("F9", 1.0), sample("F9", 2.0), sample("X", 3.0)]);

        assert_eq!(state.panels[0].series.len(), 0);
        assert!(!state.panels[0].dirty);
        assert_eq!(state.panels[1].series.len(), 2);
        assert!(state.panels[1].dirty);
        assert_eq!(state.panels[1].latest.as_ref().unwrap().time, 2.0);
    }

    #[test]
    fn test_finish_reports_abort() {
        let mut state = GuiState::new(PathBuf::from("out"), vec![info("H3", 1)]);
        state.stop_requested = true;
        state.finish(42);
        assert_eq!(state.status.status_text(), "Stopped (42 frames)");
        assert!(state.status.elapsed_text().is_none());

        // A second call keeps the first result
        state.stop_requested = false;
        state.finish(50);
        assert_eq!(state.status.status_text(), "Stopped (42 frames)");
    }

    #[test]
    fn test_running_status() {
        let state = GuiState::new(PathBuf::from("out"), vec![]);
        assert!(state.status.is_running());
        assert_eq!(state.status.elapsed_text().as_deref(), Some("00:00"));
    }
}
