//! Session runner - the polling loop.
//!
//! Pulls frames from the source, updates every vehicle tracker, appends CSV
//! rows and forwards samples to the live view. Runs on its own thread.

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::capture::FrameSource;
use crate::chart::render_to_file;
use crate::ocr::TextRecognizer;
use crate::session::config::{AppConfig, ChartConfig, OcrConfig};
use crate::session::csv_writer::{append_to_csv, init_csv};
use crate::session::queue::create_sample_queue;
use crate::telemetry::{Sample, TelemetrySeries, Tracker};

/// Global flag indicating if a session is currently running.
static SESSION_RUNNING: AtomicBool = AtomicBool::new(false);

/// Set by the Stop button to end the running session.
static ABORT_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Frames processed by the current session (for progress display).
static FRAMES_PROCESSED: AtomicU64 = AtomicU64::new(0);

/// A progress line is logged every this many frames.
const LOG_EVERY_FRAMES: u64 = 60;

pub fn is_session_running() -> bool {
    SESSION_RUNNING.load(Ordering::SeqCst)
}

pub fn request_abort() {
    ABORT_REQUESTED.store(true, Ordering::SeqCst);
}

pub fn frames_processed() -> u64 {
    FRAMES_PROCESSED.load(Ordering::SeqCst)
}

/// Name and stage count of a tracked vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleInfo {
    pub name: String,
    pub stage_count: usize,
}

/// Everything a session needs besides the frame source and recognizer.
#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub config: AppConfig,
    /// Vehicle names, each must have a layout in `config.rockets`
    pub rockets: Vec<String>,
    /// Parent directory of the timestamped session folder
    pub output_dir: PathBuf,
    /// Stop after this many frames
    pub max_frames: Option<u64>,
}

/// A running session.
pub struct SessionHandle {
    pub session_dir: PathBuf,
    pub vehicles: Vec<VehicleInfo>,
    pub receiver: Receiver<Sample>,
    thread: JoinHandle<()>,
}

impl SessionHandle {
    /// Blocks until the polling loop finishes. Samples are discarded.
    pub fn wait(self) -> Result<()> {
        drop(self.receiver);
        self.thread
            .join()
            .map_err(|_| anyhow!("Polling thread panicked"))
    }
}

/// Output files and state of one tracked vehicle.
pub struct VehicleRecorder {
    tracker: Tracker,
    csv_path: PathBuf,
    chart_path: PathBuf,
    series: TelemetrySeries,
}

impl VehicleRecorder {
    /// Creates `<name>.csv` (with header) in `dir`; the chart goes to `<name>.png`.
    pub fn create(tracker: Tracker, dir: &Path) -> Result<Self> {
        let stem = file_stem_for(tracker.name());
        let csv_path = dir.join(format!("{}.csv", stem));
        init_csv(&csv_path)
            .with_context(|| format!("Failed to initialize {}", csv_path.display()))?;
        let series = TelemetrySeries::new(tracker.stage_count());
        Ok(Self {
            tracker,
            csv_path,
            chart_path: dir.join(format!("{}.png", stem)),
            series,
        })
    }

    pub fn info(&self) -> VehicleInfo {
        VehicleInfo {
            name: self.tracker.name().to_string(),
            stage_count: self.tracker.stage_count(),
        }
    }

    fn write_chart(&self, chart: &ChartConfig) {
        if let Err(e) = render_to_file(&self.series, &self.chart_path, chart.width, chart.height) {
            crate::log(&format!(
                "Failed to write chart {}: {}",
                self.chart_path.display(),
                e
            ));
        }
    }
}

/// Why the polling loop stopped.
#[derive(Clone, Debug, PartialEq)]
pub enum LoopEnd {
    SourceExhausted,
    FrameLimit,
    Aborted,
    CaptureError,
}

/// The frame-by-frame loop, separate from thread handling so it can run inline.
pub struct PollingLoop {
    pub recorders: Vec<VehicleRecorder>,
    source: Box<dyn FrameSource + Send>,
    recognizer: Box<dyn TextRecognizer + Send>,
    ocr: OcrConfig,
    chart: ChartConfig,
    sender: Sender<Sample>,
    max_frames: Option<u64>,
    abort: &'static AtomicBool,
}

impl PollingLoop {
    pub fn new(
        recorders: Vec<VehicleRecorder>,
        source: Box<dyn FrameSource + Send>,
        recognizer: Box<dyn TextRecognizer + Send>,
        config: &AppConfig,
        sender: Sender<Sample>,
        max_frames: Option<u64>,
        abort: &'static AtomicBool,
    ) -> Self {
        Self {
            recorders,
            source,
            recognizer,
            ocr: config.ocr.clone(),
            chart: config.chart.clone(),
            sender,
            max_frames,
            abort,
        }
    }

    /// Runs until the source ends, the frame limit is hit, abort is
    /// requested or capture fails. Writes the final charts before returning.
    pub fn run(&mut self) -> (LoopEnd, u64) {
        let mut frames: u64 = 0;

        let end = loop {
            if self.abort.load(Ordering::SeqCst) {
                break LoopEnd::Aborted;
            }
            if self.max_frames.is_some_and(|max| frames >= max) {
                break LoopEnd::FrameLimit;
            }

            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break LoopEnd::SourceExhausted,
                Err(e) => {
                    crate::log(&format!("Capture failed: {:#}", e));
                    break LoopEnd::CaptureError;
                }
            };

            frames += 1;
            FRAMES_PROCESSED.store(frames, Ordering::SeqCst);
            self.process_frame(&frame, frames);
        };

        for recorder in &self.recorders {
            recorder.write_chart(&self.chart);
        }

        (end, frames)
    }

    fn process_frame(&mut self, frame: &image::RgbaImage, frame_number: u64) {
        let refresh = self.chart.refresh_frames as u64;

        for recorder in &mut self.recorders {
            let sample = recorder
                .tracker
                .update(frame, self.recognizer.as_ref(), &self.ocr);
            recorder.series.push(&sample);

            if let Err(e) = append_to_csv(&recorder.csv_path, &sample) {
                crate::log(&format!(
                    "Failed to write CSV row for {}: {}",
                    sample.rocket, e
                ));
            }

            if frame_number % LOG_EVERY_FRAMES == 0 {
                crate::log(&format!(
                    "Frame {}: {} t={:.2}s {}",
                    frame_number,
                    sample.rocket,
                    sample.time,
                    sample
                        .stages
                        .iter()
                        .enumerate()
                        .map(|(i, s)| format!("S{} alt={} spd={}", i + 1, s.altitude, s.speed))
                        .collect::<Vec<_>>()
                        .join(" ")
                ));
            }

            if refresh > 0 && frame_number % refresh == 0 {
                recorder.write_chart(&self.chart);
            }

            // The viewer may already be closed
            let _ = self.sender.send(sample);
        }
    }
}

/// Starts a session in a background thread.
///
/// Validates the vehicle names, creates `output_dir/YYYYMMDD_HHMMSS/` with
/// one CSV per vehicle, then returns immediately.
pub fn start_session(
    options: SessionOptions,
    source: Box<dyn FrameSource + Send>,
    recognizer: Box<dyn TextRecognizer + Send>,
) -> Result<SessionHandle> {
    if SESSION_RUNNING.swap(true, Ordering::SeqCst) {
        return Err(anyhow!("A session is already running"));
    }

    match spawn_session(options, source, recognizer) {
        Ok(handle) => Ok(handle),
        Err(e) => {
            SESSION_RUNNING.store(false, Ordering::SeqCst);
            Err(e)
        }
    }
}

fn spawn_session(
    options: SessionOptions,
    source: Box<dyn FrameSource + Send>,
    recognizer: Box<dyn TextRecognizer + Send>,
) -> Result<SessionHandle> {
    if options.rockets.is_empty() {
        return Err(anyhow!("No vehicles to track"));
    }

    check_unique_vehicles(&options.rockets)?;

    let mut trackers = Vec::new();
    for name in &options.rockets {
        let layout = options.config.rocket(name)?;
        trackers.push(Tracker::new(name, layout, &options.config.filter)?);
    }

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let session_dir = options.output_dir.join(&timestamp);
    fs::create_dir_all(&session_dir)
        .with_context(|| format!("Failed to create session directory {}", session_dir.display()))?;

    let recorders = trackers
        .into_iter()
        .map(|tracker| VehicleRecorder::create(tracker, &session_dir))
        .collect::<Result<Vec<_>>>()?;
    let vehicles: Vec<VehicleInfo> = recorders.iter().map(VehicleRecorder::info).collect();

    crate::set_session_log(Some(session_dir.join("session.log")));
    crate::log(&format!("Session folder: {}", session_dir.display()));
    for vehicle in &vehicles {
        crate::log(&format!(
            "Tracking {} ({} stage{})",
            vehicle.name,
            vehicle.stage_count,
            if vehicle.stage_count == 1 { "" } else { "s" }
        ));
    }

    ABORT_REQUESTED.store(false, Ordering::SeqCst);
    FRAMES_PROCESSED.store(0, Ordering::SeqCst);

    let (sender, receiver) = create_sample_queue();
    let mut polling = PollingLoop::new(
        recorders,
        source,
        recognizer,
        &options.config,
        sender,
        options.max_frames,
        &ABORT_REQUESTED,
    );

    let thread = thread::spawn(move || {
        let (end, frames) = polling.run();
        crate::log(&format!("Session ended after {} frames: {:?}", frames, end));
        crate::set_session_log(None);
        SESSION_RUNNING.store(false, Ordering::SeqCst);
    });

    Ok(SessionHandle {
        session_dir,
        vehicles,
        receiver,
        thread,
    })
}

/// Each vehicle writes `<stem>.csv`, so names must not repeat or share a stem.
fn check_unique_vehicles(names: &[String]) -> Result<()> {
    let mut stems: HashMap<String, &str> = HashMap::new();
    for name in names {
        if let Some(other) = stems.insert(file_stem_for(name), name) {
            if other == name {
                return Err(anyhow!("Vehicle \"{}\" is listed more than once", name));
            }
            return Err(anyhow!(
                "Vehicles \"{}\" and \"{}\" would write the same file {}.csv",
                other,
                name,
                file_stem_for(name)
            ));
        }
    }
    Ok(())
}

/// Turns a vehicle name into a safe file name stem.
pub fn file_stem_for(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "vehicle".to_string()
    } else {
        stem
    }
}
