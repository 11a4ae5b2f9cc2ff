//! Recording upload orchestration
//!
//! This module provides the `UploadSession` abstraction that manages:
//! - Strategy selection (direct below 10 MiB, multipart at or above)
//! - Upload id and presigned destination planning
//! - Chunk slicing and per-part retry with backoff
//! - Part-order reconciliation before completion
//! - Progress reporting to an observer

pub mod artifact;
pub mod config;
pub mod error;
mod part;
mod progress;
mod session;
pub mod slicer;
mod state;

pub use artifact::RecordingArtifact;
pub use config::{RetryPolicy, UploadConfig, DEFAULT_CONTENT_TYPE, MULTIPART_THRESHOLD_BYTES};
pub use error::{Result, UploadError};
pub use part::{PartState, PartTask, PartUploader};
pub use progress::{multipart_percent, NoopObserver, ProgressObserver, ProgressUpdate};
pub use session::{SessionSummary, UploadSession};
pub use slicer::{slice, ByteRange};
pub use state::{SessionState, UploadStrategy};
