//! Accumulated time series for plotting.

use super::tracker::Sample;

/// Left edge of the time axis, so the countdown end stays visible.
pub const TIME_AXIS_START: f64 = -10.0;

/// Headroom above the largest value on each axis.
pub const AXIS_MARGIN: f64 = 1.1;

/// Which value of a stage reading to look at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Altitude,
    Speed,
}

/// All samples of one vehicle, stored column-wise.
#[derive(Clone, Debug, Default)]
pub struct TelemetrySeries {
    pub times: Vec<f64>,
    /// `altitude[stage][sample]`
    pub altitude: Vec<Vec<f64>>,
    /// `speed[stage][sample]`
    pub speed: Vec<Vec<f64>>,
}

impl TelemetrySeries {
    pub fn new(stage_count: usize) -> Self {
        Self {
            times: Vec::new(),
            altitude: vec![Vec::new(); stage_count],
            speed: vec![Vec::new(); stage_count],
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn stage_count(&self) -> usize {
        self.altitude.len()
    }

    /// Appends one sample. Stages beyond the series' stage count are ignored,
    /// missing stages repeat zero.
    pub fn push(&mut self, sample: &Sample) {
        self.times.push(sample.time);
        for stage in 0..self.stage_count() {
            let reading = sample.stages.get(stage).copied().unwrap_or_default();
            self.altitude[stage].push(reading.altitude);
            self.speed[stage].push(reading.speed);
        }
    }

    pub fn values(&self, field: Field) -> &[Vec<f64>] {
        match field {
            Field::Altitude => &self.altitude,
            Field::Speed => &self.speed,
        }
    }

    /// Time axis range: from [`TIME_AXIS_START`] to 110% of the latest time.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        let last = *self.times.last()?;
        let end = last * AXIS_MARGIN;
        // Before liftoff the latest time is negative; keep the range non-empty
        Some((TIME_AXIS_START, end.max(TIME_AXIS_START + 1.0)))
    }

    /// Value axis range: from 0 to 110% of the largest value over all stages.
    pub fn value_range(&self, field: Field) -> Option<(f64, f64)> {
        if self.is_empty() {
            return None;
        }
        let max = self
            .values(field)
            .iter()
            .flat_map(|values| values.iter().copied())
            .fold(0.0f64, f64::max);
        let top = max * AXIS_MARGIN;
        Some((0.0, if top > 0.0 { top } else { 1.0 }))
    }
}
