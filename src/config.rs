use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::ApiTimeouts;
use crate::upload::{RetryPolicy, UploadConfig, DEFAULT_CONTENT_TYPE, MULTIPART_THRESHOLD_BYTES};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub upload: UploadSettings,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    pub recordings: RecordingsConfig,
    pub fallback: FallbackConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    pub multipart_threshold_bytes: u64,
    pub content_type: String,
    pub max_part_retries: u32,
    pub retry_base_delay_ms: u64,
    pub max_concurrent_parts: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            multipart_threshold_bytes: MULTIPART_THRESHOLD_BYTES,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            max_part_retries: 3,
            retry_base_delay_ms: 2000,
            max_concurrent_parts: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub part_secs: u64,
    pub metadata_secs: u64,
    pub completion_secs: u64,
    pub direct_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            part_secs: 300,
            metadata_secs: 30,
            completion_secs: 60,
            direct_secs: 120,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            capacity: crate::registry::DEFAULT_REGISTRY_CAPACITY,
        }
    }
}

/// Finished recordings the status API may upload
#[derive(Debug, Deserialize)]
pub struct RecordingsConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct FallbackConfig {
    pub directory: PathBuf,
}

impl Config {
    /// Load `path` (any format the config crate understands), then apply
    /// `RECORDING_UPLOAD__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("RECORDING_UPLOAD").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            multipart_threshold_bytes: self.upload.multipart_threshold_bytes,
            retry: RetryPolicy {
                max_retries: self.upload.max_part_retries,
                base_delay: Duration::from_millis(self.upload.retry_base_delay_ms),
            },
            max_concurrent_parts: self.upload.max_concurrent_parts.max(1),
        }
    }

    pub fn api_timeouts(&self) -> ApiTimeouts {
        ApiTimeouts {
            part: Duration::from_secs(self.timeouts.part_secs),
            metadata: Duration::from_secs(self.timeouts.metadata_secs),
            completion: Duration::from_secs(self.timeouts.completion_secs),
            direct: Duration::from_secs(self.timeouts.direct_secs),
        }
    }
}
