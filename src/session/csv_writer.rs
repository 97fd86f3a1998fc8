//! CSV writer for filtered telemetry.
//!
//! Writes one row per processed frame in append-only mode for crash safety.
//! Each row contains: mission time, then altitude and speed per stage.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::telemetry::Sample;

/// CSV header row. Stage 2 columns stay empty for single-stage vehicles.
pub const CSV_HEADER: &str = "Time,Altitude1,Speed1,Altitude2,Speed2";

/// Number of stages the CSV layout has columns for.
const CSV_STAGES: usize = 2;

/// Initializes CSV file with header if it doesn't exist or is empty.
///
/// If the file exists and has content, this does nothing (preserves existing data).
pub fn init_csv(path: &Path) -> Result<()> {
    if path.exists() {
        let file = File::open(path).context("Failed to open existing CSV")?;
        let reader = BufReader::new(file);
        if reader.lines().next().is_some() {
            return Ok(());
        }
    }

    let mut file = File::create(path).context("Failed to create CSV file")?;
    writeln!(file, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    Ok(())
}

/// Formats one sample as a CSV row (without newline).
pub fn format_row(sample: &Sample) -> String {
    let mut fields = vec![sample.time.to_string()];
    for stage in 0..CSV_STAGES {
        match sample.stages.get(stage) {
            Some(reading) => {
                fields.push(reading.altitude.to_string());
                fields.push(reading.speed.to_string());
            }
            None => {
                fields.push(String::new());
                fields.push(String::new());
            }
        }
    }
    fields.join(",")
}

/// Appends one sample to the CSV file.
///
/// Opens the file in append mode for each write, so rows written before a
/// crash are kept.
pub fn append_to_csv(path: &Path, sample: &Sample) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open CSV for append")?;

    writeln!(file, "{}", format_row(sample)).context("Failed to write CSV row")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::StageReading;
    use tempfile::tempdir;

    fn sample(time: f64, stages: &[(f64, f64)]) -> Sample {
        Sample {
            rocket: "H3".to_string(),
            time,
            stages: stages
                .iter()
                .map(|&(altitude, speed)| StageReading { altitude, speed })
                .collect(),
        }
    }

    #[test]
    fn test_init_csv_creates_header() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("H3.csv");

        init_csv(&csv_path).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert!(content.starts_with(CSV_HEADER));
    }

    #[test]
    fn test_init_csv_preserves_existing() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("H3.csv");

        std::fs::write(&csv_path, "existing,data\n1,2,3\n").unwrap();

        init_csv(&csv_path).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert!(content.starts_with("existing,data"));
    }

    #[test]
    fn test_format_row_single_stage_leaves_stage2_empty() {
        assert_eq!(format_row(&sample(12.5, &[(3.0, 1200.0)])), "12.5,3,1200,,");
    }

    #[test]
    fn test_format_row_two_stages() {
        assert_eq!(
            format_row(&sample(-3.0, &[(1.5, 100.0), (1.5, 90.0)])),
            "-3,1.5,100,1.5,90"
        );
    }

    #[test]
    fn test_append_multiple_rows() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("H3.csv");

        init_csv(&csv_path).unwrap();
        for i in 0..3 {
            append_to_csv(&csv_path, &sample(i as f64, &[(1.0, 2.0)])).unwrap();
        }

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 4); // header + 3 data rows
        assert_eq!(lines[3], "2,1,2,,");
    }
}
