use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::log;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";
const TRAINEDDATA_FILE: &str = "eng.traineddata";

#[cfg(windows)]
const EXECUTABLE_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXECUTABLE_NAME: &str = "tesseract";

#[cfg(windows)]
const COMMON_INSTALL_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
];
#[cfg(not(windows))]
const COMMON_INSTALL_DIRS: &[&str] = &["/usr/bin", "/usr/local/bin", "/opt/homebrew/bin"];

#[cfg(windows)]
const SYSTEM_TESSDATA_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];
#[cfg(not(windows))]
const SYSTEM_TESSDATA_DIRS: &[&str] = &[
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

#[derive(Clone, Debug)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    pub tessdata: PathBuf,
}

/// Returns the directory for storing Tesseract files
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("launch-telemetry")
        .join("tesseract")
}

/// Locates Tesseract and its English model. Downloads the model if necessary.
pub fn ensure_tesseract() -> Result<TesseractPaths> {
    let executable = find_tesseract_executable()?;
    log(&format!("Tesseract executable: {}", executable.display()));

    let tessdata = match find_tessdata_dir() {
        Ok(dir) => dir,
        Err(_) => {
            log("eng.traineddata not found locally, downloading...");
            let local = get_tesseract_dir().join("tessdata");
            fs::create_dir_all(&local)
                .with_context(|| format!("Failed to create {}", local.display()))?;
            download_tessdata(&local)?;
            local
        }
    };
    log(&format!("Tesseract data: {}", tessdata.display()));

    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Downloads English trained data
fn download_tessdata(tessdata_dir: &Path) -> Result<()> {
    let url = format!("{}/{}", TESSDATA_REPO, TRAINEDDATA_FILE);
    let path = tessdata_dir.join(TRAINEDDATA_FILE);

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "launch-telemetry")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: HTTP {}",
            TRAINEDDATA_FILE,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&path)?;
    file.write_all(&bytes)?;

    log(&format!(
        "Downloaded {} ({} bytes)",
        TRAINEDDATA_FILE,
        bytes.len()
    ));

    Ok(())
}

/// Finds the Tesseract executable, checking our local dir first, then PATH,
/// then common install locations
pub fn find_tesseract_executable() -> Result<PathBuf> {
    let local_exe = get_tesseract_dir().join(EXECUTABLE_NAME);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    COMMON_INSTALL_DIRS
        .iter()
        .map(|dir| Path::new(dir).join(EXECUTABLE_NAME))
        .find(|p| p.exists())
        .ok_or_else(|| {
            anyhow!(
                "Tesseract not found. Install Tesseract-OCR (and add it to PATH) or copy it to {}",
                get_tesseract_dir().display()
            )
        })
}

/// Finds a tessdata directory containing eng.traineddata
pub fn find_tessdata_dir() -> Result<PathBuf> {
    let mut candidates = vec![get_tesseract_dir().join("tessdata")];
    candidates.extend(SYSTEM_TESSDATA_DIRS.iter().map(PathBuf::from));

    // TESSDATA_PREFIX may point at tessdata itself or at its parent
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        candidates.push(PathBuf::from(&prefix));
        candidates.push(PathBuf::from(&prefix).join("tessdata"));
    }

    first_with_traineddata(&candidates).ok_or_else(|| {
        anyhow!("tessdata directory not found. Please ensure eng.traineddata is available.")
    })
}

fn first_with_traineddata(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|dir| dir.join(TRAINEDDATA_FILE).exists())
        .cloned()
}
