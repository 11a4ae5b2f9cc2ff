use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Artifacts at or above this size go through the multipart path (10 MiB)
pub const MULTIPART_THRESHOLD_BYTES: u64 = 10 * 1024 * 1024;

/// Content type used when a recording does not declare one
pub const DEFAULT_CONTENT_TYPE: &str = "video/webm";

/// Retry schedule for a single part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Additional attempts after the first one fails
    pub max_retries: u32,

    /// Delay before retry `n` is `base_delay * n`
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }

    /// Total number of attempts a part may use
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(2000),
        }
    }
}

/// Configuration for an upload session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Size at which the session switches from direct to multipart
    pub multipart_threshold_bytes: u64,

    /// Per-part retry schedule
    pub retry: RetryPolicy,

    /// Parts in flight at once (1 = strictly sequential)
    pub max_concurrent_parts: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            multipart_threshold_bytes: MULTIPART_THRESHOLD_BYTES,
            retry: RetryPolicy::default(),
            max_concurrent_parts: 1,
        }
    }
}
