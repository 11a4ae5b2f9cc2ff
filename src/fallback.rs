//! Local save for recordings that could not be uploaded

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::upload::RecordingArtifact;

/// Write `artifact` to `dir/filename`, creating the directory if needed
pub fn save_locally(dir: impl AsRef<Path>, filename: &str, artifact: &RecordingArtifact) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create fallback directory: {}", dir.display()))?;

    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| default_filename(Utc::now()).into());
    let path = dir.join(name);

    if path.exists() {
        warn!("Overwriting existing file: {}", path.display());
    }

    fs::write(&path, artifact.data())
        .with_context(|| format!("Failed to save recording locally: {}", path.display()))?;

    info!("Recording saved locally: {} ({} bytes)", path.display(), artifact.len());
    Ok(path)
}

/// `lecture-<timestamp>.webm` with `:` and `.` replaced so it is a safe filename
pub fn default_filename(now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("lecture-{}.webm", stamp)
}
