//! Launch Telemetry
//!
//! Reads time, speed and altitude from a launch broadcast overlay with OCR,
//! filters the noisy readings and records them as CSV and charts.

mod capture;
mod chart;
mod gui;
mod ocr;
mod paths;
mod session;
mod telemetry;

use anyhow::{anyhow, Result};
use chrono::Local;
use clap::Parser;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use capture::{FrameSource, ImageSequenceSource, ScreenSource};
use ocr::TesseractRecognizer;
use session::{AppConfig, SessionOptions};

const LOG_FILE_NAME: &str = "launch_telemetry.log";

/// Extra log file for the running session, next to its CSV files.
static SESSION_LOG: Mutex<Option<PathBuf>> = Mutex::new(None);

#[derive(Parser)]
#[command(name = "launch-telemetry")]
#[command(about = "Record launch telemetry from a broadcast overlay")]
struct Cli {
    /// Vehicle layouts to track, as named under "rockets" in setting.json
    #[arg(value_name = "ROCKET", required = true)]
    rockets: Vec<String>,

    /// "screen" for live capture, or a directory of extracted frames / a single image
    #[arg(short, long, default_value = "screen")]
    source: String,

    /// Path to setting.json (default: next to the executable, then the working directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for session folders (default: <exe_dir>/output)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Run without the live view
    #[arg(long)]
    headless: bool,
}

/// Logs a message to console, the log file and the session log with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    append_line(&paths::get_logs_dir().join(LOG_FILE_NAME), &line);

    if let Ok(session_log) = SESSION_LOG.lock() {
        if let Some(path) = session_log.as_ref() {
            append_line(path, &line);
        }
    }
}

/// Starts or stops mirroring log lines into a session log file.
pub fn set_session_log(path: Option<PathBuf>) {
    if let Ok(mut session_log) = SESSION_LOG.lock() {
        *session_log = path;
    }
}

fn append_line(path: &Path, line: &str) {
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = file.write_all(line.as_bytes());
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprint!("{}", log_msg);
        append_line(&paths::get_logs_dir().join(LOG_FILE_NAME), &log_msg);
    }));

    let cli = Cli::parse();

    let output_dir = cli.output.clone().unwrap_or_else(paths::get_output_dir);
    paths::ensure_directories(&output_dir)?;

    let config = AppConfig::load(cli.config.as_deref())?;
    for name in &cli.rockets {
        config.rocket(name)?;
    }

    let tesseract = ocr::ensure_tesseract()?;
    let recognizer = TesseractRecognizer::new(tesseract);

    let source = open_source(&cli.source, &config, cli.max_frames)?;

    let chart = config.chart.clone();
    let handle = session::start_session(
        SessionOptions {
            config,
            rockets: cli.rockets.clone(),
            output_dir,
            max_frames: cli.max_frames,
        },
        source,
        Box::new(recognizer),
    )?;

    if cli.headless {
        log("Running headless");
        handle.wait()?;
        log("Done");
        return Ok(());
    }

    log("Starting live view...");
    let result = gui::run_gui(handle, chart);

    // Closing the window ends the recording
    if session::is_session_running() {
        log("Window closed, stopping session");
        session::request_abort();
        while session::is_session_running() {
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
    }

    match result {
        Ok(()) => {
            log("Live view exited normally");
            Ok(())
        }
        Err(e) => {
            log(&format!("GUI error: {}", e));
            Err(anyhow!("GUI error: {}", e))
        }
    }
}

/// Opens the frame source named on the command line.
fn open_source(
    source: &str,
    config: &AppConfig,
    max_frames: Option<u64>,
) -> Result<Box<dyn FrameSource + Send>> {
    if source.eq_ignore_ascii_case("screen") {
        return Ok(Box::new(ScreenSource::new(config.capture)?));
    }

    let limit = max_frames.map(|max| max as usize);
    let frames = ImageSequenceSource::open(Path::new(source), limit)?;
    log(&format!("Replaying {} frames from {}", frames.remaining(), source));
    Ok(Box::new(frames))
}
