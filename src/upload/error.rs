//! Upload error taxonomy
//!
//! Transient failures (`Transport`, `Protocol`) are retried inside the part
//! uploader; everything else terminates the session with a single reason.

use thiserror::Error;

/// Errors produced while moving a recording into remote storage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    // ========== Transient ==========

    /// Connection failure or timeout
    #[error("Network error: {message}")]
    Transport { message: String },

    /// Non-2xx status or a success response without a confirmation tag
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    // ========== Collaborator rejections ==========

    /// 401 from the recordings API, or no token available
    #[error("Authentication failed: {message}")]
    Unauthorized { message: String },

    /// 413 on the direct upload path
    #[error("File too large for single upload ({size} bytes)")]
    PayloadTooLarge { size: u64 },

    /// Any other non-success answer from the recordings API
    #[error("Service error{}: {message}", status_suffix(.status))]
    Service { status: Option<u16>, message: String },

    // ========== Session terminal failures ==========

    /// A part exhausted its retry budget
    #[error("Failed to upload part {part_number} after {attempts} attempts: {reason}")]
    PartUploadFailed {
        part_number: u32,
        attempts: u32,
        reason: String,
    },

    /// Upload identifier or destination handles could not be issued
    #[error("Failed to plan multipart upload: {reason}")]
    SessionPlanning { reason: String },

    /// Every part confirmed but the finalize call failed
    #[error("Failed to complete multipart upload {upload_id}: {reason}")]
    Completion { upload_id: String, reason: String },

    /// Slicing parameters that cannot produce a valid plan
    #[error("Invalid upload plan: {reason}")]
    InvalidPlan { reason: String },

    /// Cancelled between parts
    #[error("Upload cancelled after {completed_parts}/{total_parts} parts")]
    Cancelled {
        completed_parts: usize,
        total_parts: usize,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl UploadError {
    /// Returns true if the part uploader should try again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UploadError::Transport { .. } | UploadError::Protocol { .. }
        )
    }

    /// Returns true if the error came from a rejected or missing credential
    pub fn is_auth(&self) -> bool {
        matches!(self, UploadError::Unauthorized { .. })
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

/// Result type alias for upload operations
pub type Result<T> = std::result::Result<T, UploadError>;
