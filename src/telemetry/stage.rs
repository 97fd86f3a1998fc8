//! Per-stage speed and altitude state.

use super::filter::{AltitudeGate, FieldFilter, FilterOutcome, SpeedGate};

/// Latest filtered values of one stage.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageReading {
    pub altitude: f64,
    pub speed: f64,
}

/// One rocket stage as seen on the broadcast overlay.
///
/// The OCR text of each field is sticky: a frame where nothing was read
/// reuses the previous text, so the filter sees the last reading again.
#[derive(Clone, Debug)]
pub struct Stage {
    pub number: u8,
    speed: FieldFilter<SpeedGate>,
    altitude: FieldFilter<AltitudeGate>,
    speed_text: String,
    altitude_text: String,
    /// Last rejected candidate per field that was logged
    speed_rejected: Option<f64>,
    altitude_rejected: Option<f64>,
}

impl Stage {
    pub fn new(number: u8, speed_gate: SpeedGate, altitude_gate: AltitudeGate) -> Self {
        Self {
            number,
            speed: FieldFilter::new(speed_gate),
            altitude: FieldFilter::new(altitude_gate),
            speed_text: "0".to_string(),
            altitude_text: "0".to_string(),
            speed_rejected: None,
            altitude_rejected: None,
        }
    }

    /// Applies this frame's OCR results. `None` means nothing was recognized.
    pub fn update(&mut self, speed_text: Option<&str>, altitude_text: Option<&str>) -> StageReading {
        if let Some(text) = speed_text {
            self.speed_text = text.to_string();
        }
        if let Some(text) = altitude_text {
            self.altitude_text = text.to_string();
        }

        let outcome = self.speed.update(&self.speed_text);
        if let Some((candidate, kept)) = new_rejection(&mut self.speed_rejected, outcome) {
            crate::log(&format!(
                "Stage {}: speed {} rejected, keeping {}",
                self.number, candidate, kept
            ));
        }
        let outcome = self.altitude.update(&self.altitude_text);
        if let Some((candidate, kept)) = new_rejection(&mut self.altitude_rejected, outcome) {
            crate::log(&format!(
                "Stage {}: altitude {} rejected, keeping {}",
                self.number, candidate, kept
            ));
        }

        self.reading()
    }

    pub fn reading(&self) -> StageReading {
        StageReading {
            altitude: self.altitude.value(),
            speed: self.speed.value(),
        }
    }

    /// Current (sticky) altitude text, shared with an upper stage that has
    /// no altitude readout of its own.
    pub fn altitude_text(&self) -> &str {
        &self.altitude_text
    }
}

/// Returns `(candidate, kept)` when a rejection should be logged.
///
/// A candidate stuck across frames is reported once; acceptance clears it.
fn new_rejection(last: &mut Option<f64>, outcome: FilterOutcome) -> Option<(f64, f64)> {
    match outcome {
        FilterOutcome::Accepted(_) => {
            *last = None;
            None
        }
        FilterOutcome::Rejected { candidate, kept } => {
            if *last == Some(candidate) {
                return None;
            }
            *last = Some(candidate);
            Some((candidate, kept))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage() -> Stage {
        Stage::new(1, SpeedGate { max_step: None }, AltitudeGate::default())
    }

    #[test]
    fn test_initial_reading_is_zero() {
        let s = stage();
        assert_eq!(s.reading(), StageReading::default());
        assert_eq!(s.altitude_text(), "0");
    }

    #[test]
    fn test_update_applies_both_fields() {
        let mut s = stage();
        let r = s.update(Some("1200"), Some("12"));
        assert_eq!(r, StageReading { altitude: 12.0, speed: 1200.0 });
    }

    #[test]
    fn test_missing_text_reuses_previous() {
        let mut s = stage();
        s.update(Some("1200"), Some("12"));
        let r = s.update(None, None);
        assert_eq!(r, StageReading { altitude: 12.0, speed: 1200.0 });
        assert_eq!(s.altitude_text(), "12");
    }

    #[test]
    fn test_altitude_outlier_is_dropped() {
        let mut s = stage();
        s.update(Some("1200"), Some("12"));
        // (12 + 5) * 20 = 340, so 1234 is a misread
        let r = s.update(Some("1250"), Some("1234"));
        assert_eq!(r.altitude, 12.0);
        assert_eq!(r.speed, 1250.0);
    }

    #[test]
    fn test_stuck_rejection_reported_once() {
        let mut last = None;
        let rejected = |candidate| FilterOutcome::Rejected { candidate, kept: 0.0 };

        assert_eq!(new_rejection(&mut last, rejected(200.0)), Some((200.0, 0.0)));
        assert_eq!(new_rejection(&mut last, rejected(200.0)), None);
        assert_eq!(new_rejection(&mut last, rejected(210.0)), Some((210.0, 0.0)));

        assert_eq!(new_rejection(&mut last, FilterOutcome::Accepted(5.0)), None);
        assert_eq!(new_rejection(&mut last, rejected(210.0)), Some((210.0, 0.0)));
    }

    #[test]
    fn test_stage_tracks_stuck_altitude() {
        let mut s = stage();
        // Joined mid-flight: 200 km is above (0 + 5) * 20 and stays rejected
        s.update(Some("5000"), Some("200"));
        s.update(None, None);
        assert_eq!(s.altitude_rejected, Some(200.0));
        assert_eq!(s.reading().altitude, 0.0);

        s.update(None, Some("50"));
        assert_eq!(s.altitude_rejected, None);
        assert_eq!(s.reading().altitude, 50.0);
    }
}
