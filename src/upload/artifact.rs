use anyhow::{Context, Result};
use bytes::Bytes;
use std::path::Path;
use tracing::info;

/// A finished recording, handed off once to an upload session
#[derive(Debug, Clone)]
pub struct RecordingArtifact {
    data: Bytes,
    content_type: String,
}

impl RecordingArtifact {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// Load a recording from disk, inferring the content type from its
    /// extension and using `default_content_type` when it is not recognised
    pub fn open(path: impl AsRef<Path>, default_content_type: &str) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening recording: {}", path.display());

        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read recording: {}", path.display()))?;

        let content_type = content_type_for(path).unwrap_or(default_content_type).to_string();

        info!(
            "Recording loaded: {:.2} MB, {}",
            data.len() as f64 / 1024.0 / 1024.0,
            content_type
        );

        Ok(Self::new(data, content_type))
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Content type for a recording file, by extension
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref()? {
        "webm" => Some("video/webm"),
        "mp4" => Some("video/mp4"),
        "wav" => Some("audio/wav"),
        "m4a" => Some("audio/mp4"),
        "ogg" => Some("audio/ogg"),
        _ => None,
    }
}
