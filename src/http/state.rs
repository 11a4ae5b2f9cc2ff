use crate::api::RecordingsApi;
use crate::registry::UploadRegistry;
use crate::upload::{UploadConfig, DEFAULT_CONTENT_TYPE};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Recently begun uploads
    pub registry: Arc<UploadRegistry>,

    /// Recordings API used by spawned sessions
    pub api: Arc<dyn RecordingsApi>,

    pub upload_config: UploadConfig,

    /// Token used when a request does not carry one
    pub auth_token: Option<String>,

    /// Content type for recordings with an unrecognised extension
    pub default_content_type: String,

    /// Only recordings under this directory may be uploaded
    pub recordings_dir: PathBuf,

    /// Where failed uploads are saved
    pub fallback_dir: PathBuf,
}

impl AppState {
    pub fn new(
        api: Arc<dyn RecordingsApi>,
        registry: Arc<UploadRegistry>,
        recordings_dir: PathBuf,
        fallback_dir: PathBuf,
    ) -> Self {
        Self {
            registry,
            api,
            upload_config: UploadConfig::default(),
            auth_token: None,
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            recordings_dir,
            fallback_dir,
        }
    }

    pub fn with_upload_config(mut self, upload_config: UploadConfig) -> Self {
        self.upload_config = upload_config;
        self
    }

    pub fn with_auth_token(mut self, auth_token: Option<String>) -> Self {
        self.auth_token = auth_token;
        self
    }

    pub fn with_default_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.default_content_type = content_type.into();
        self
    }
}
