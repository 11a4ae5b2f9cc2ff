use serde::{Deserialize, Serialize};
use std::fmt;

/// How an artifact gets into storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStrategy {
    /// One request carrying the whole payload
    Direct,
    /// Upload id + one presigned PUT per part + completion call
    Multipart,
}

impl UploadStrategy {
    /// Strategy for an artifact of `size` bytes
    pub fn for_size(size: u64, multipart_threshold: u64) -> Self {
        if size < multipart_threshold {
            UploadStrategy::Direct
        } else {
            UploadStrategy::Multipart
        }
    }
}

/// Upload session state machine
///
/// `Planning -> InProgress -> Finalizing -> Completed`, with `Failed`
/// reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Planning,
    InProgress,
    Finalizing,
    Completed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;

        match (self, next) {
            (Planning, InProgress) | (InProgress, Finalizing) | (Finalizing, Completed) => true,
            // Direct uploads have nothing to finalize
            (InProgress, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Planning => "planning",
            SessionState::InProgress => "in_progress",
            SessionState::Finalizing => "finalizing",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}
