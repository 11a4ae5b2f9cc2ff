use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::SessionState;

/// A progress notification emitted by an upload session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub session_id: Uuid,

    /// 0-100
    pub percent: u8,

    pub state: SessionState,

    /// Human-readable status line, e.g. "Uploading - 40%"
    pub status: String,
}

/// Receives progress notifications from an upload session
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, update: &ProgressUpdate);
}

/// Observer that drops every update
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _update: &ProgressUpdate) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressUpdate) + Send + Sync,
{
    fn on_progress(&self, update: &ProgressUpdate) {
        self(update)
    }
}

/// Multipart progress: 20% after planning, the remaining 70% spread over parts
pub fn multipart_percent(completed_parts: usize, total_parts: usize) -> u8 {
    if total_parts == 0 {
        return 20;
    }
    (20 + 70 * completed_parts.min(total_parts) / total_parts) as u8
}
