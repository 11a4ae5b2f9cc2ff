use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::upload::SessionState;

/// Opaque handle to a registry record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadHandle(Uuid);

impl UploadHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UploadHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UploadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display state of one upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub handle: UploadHandle,

    pub filename: String,

    /// Artifact size in bytes
    pub size: u64,

    /// 0-100
    pub percent: u8,

    pub state: SessionState,

    /// Last status line reported by the session
    pub status: String,

    pub started_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl UploadRecord {
    pub(super) fn new(filename: String, size: u64) -> Self {
        let now = Utc::now();
        Self {
            handle: UploadHandle::new(),
            filename,
            size,
            percent: 0,
            state: SessionState::Planning,
            status: "Preparing upload...".to_string(),
            started_at: now,
            updated_at: now,
        }
    }
}
