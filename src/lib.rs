pub mod api;
pub mod config;
pub mod fallback;
pub mod http;
pub mod registry;
pub mod upload;

pub use api::{ApiTimeouts, CompletedPart, HttpRecordingsApi, RecordingsApi};
pub use config::Config;
pub use http::{create_router, AppState};
pub use registry::{RegistryObserver, UploadHandle, UploadRecord, UploadRegistry};
pub use upload::{
    ByteRange, PartState, PartTask, PartUploader, ProgressObserver, ProgressUpdate,
    RecordingArtifact, RetryPolicy, SessionState, SessionSummary, UploadConfig, UploadError,
    UploadSession, UploadStrategy,
};
