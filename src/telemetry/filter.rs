//! Plausibility filters for OCR'd numeric readings.
//!
//! OCR output flickers between frames: digits get dropped, duplicated or
//! misread. Each field keeps the last accepted value and only moves to a new
//! reading when the gate for that field says the jump is believable.

use regex::Regex;
use std::sync::OnceLock;

/// Decimal number as produced by the numeric allowlist (`.0123456789`).
const READING_PATTERN: &str = r"^(\d+\.?\d*|\.\d+)$";

static READING_REGEX: OnceLock<Regex> = OnceLock::new();

fn reading_regex() -> &'static Regex {
    READING_REGEX.get_or_init(|| Regex::new(READING_PATTERN).expect("valid reading pattern"))
}

/// Parses a raw OCR reading into a number.
///
/// Dashes are stripped first (overlays pad blank digits with them). Returns
/// `None` for empty or malformed text such as `1.2.3`.
pub fn parse_reading(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|&c| c != '-').collect();
    if cleaned.is_empty() || !reading_regex().is_match(&cleaned) {
        return None;
    }
    cleaned.parse().ok()
}

/// Decides whether a candidate value may replace the accepted one.
pub trait Gate {
    fn accepts(&self, accepted: f64, candidate: f64) -> bool;
}

/// Speed may only grow by less than `max_step` per frame.
/// `None` disables the check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedGate {
    pub max_step: Option<f64>,
}

impl Gate for SpeedGate {
    fn accepts(&self, accepted: f64, candidate: f64) -> bool {
        match self.max_step {
            Some(step) => candidate < accepted + step,
            None => true,
        }
    }
}

/// Altitude must stay below `(accepted + offset) * factor` and below an
/// absolute `ceiling`.
///
/// The offset lets the first readings leave zero; the factor rejects the
/// extra digits OCR likes to invent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AltitudeGate {
    pub offset: f64,
    pub factor: f64,
    pub ceiling: f64,
}

impl Default for AltitudeGate {
    fn default() -> Self {
        Self {
            offset: 5.0,
            factor: 20.0,
            ceiling: 6000.0,
        }
    }
}

impl Gate for AltitudeGate {
    fn accepts(&self, accepted: f64, candidate: f64) -> bool {
        candidate < (accepted + self.offset) * self.factor && candidate < self.ceiling
    }
}

/// Outcome of one filter step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterOutcome {
    /// The candidate passed the gate and is now the accepted value.
    Accepted(f64),
    /// The candidate was rejected; the previous value stays.
    Rejected { candidate: f64, kept: f64 },
}

/// Per-field filter state.
///
/// The candidate survives across frames when the text is unreadable, and a
/// rejected candidate is re-tested on every following frame.
#[derive(Clone, Debug)]
pub struct FieldFilter<G: Gate> {
    gate: G,
    accepted: f64,
    candidate: f64,
}

impl<G: Gate> FieldFilter<G> {
    pub fn new(gate: G) -> Self {
        Self {
            gate,
            accepted: 0.0,
            candidate: 0.0,
        }
    }

    /// Last accepted value.
    pub fn value(&self) -> f64 {
        self.accepted
    }

    pub fn candidate(&self) -> f64 {
        self.candidate
    }

    /// Feeds one frame's text through the filter.
    pub fn update(&mut self, text: &str) -> FilterOutcome {
        if let Some(value) = parse_reading(text) {
            self.candidate = value;
        }

        if self.gate.accepts(self.accepted, self.candidate) {
            self.accepted = self.candidate;
            FilterOutcome::Accepted(self.accepted)
        } else {
            FilterOutcome::Rejected {
                candidate: self.candidate,
                kept: self.accepted,
            }
        }
    }
}
