use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::config::RetryPolicy;
use super::error::{Result, UploadError};
use super::slicer::ByteRange;
use crate::api::RecordingsApi;

/// Lifecycle of a single part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartState {
    Pending,
    Uploading,
    Confirmed,
    Failed,
}

/// One planned part of a multipart upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartTask {
    /// 1-based, contiguous within the session
    pub part_number: u32,

    /// Slice of the artifact this part carries
    pub range: ByteRange,

    /// Presigned destination URL
    pub destination: String,

    /// Set once, on the first successful attempt
    confirmation_tag: Option<String>,

    /// Network attempts made so far
    pub attempt_count: u32,

    pub state: PartState,
}

impl PartTask {
    pub fn new(part_number: u32, range: ByteRange, destination: String) -> Self {
        Self {
            part_number,
            range,
            destination,
            confirmation_tag: None,
            attempt_count: 0,
            state: PartState::Pending,
        }
    }

    pub fn confirmation_tag(&self) -> Option<&str> {
        self.confirmation_tag.as_deref()
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == PartState::Confirmed
    }

    /// Record the confirmation tag. Returns false if the part was already confirmed.
    pub fn confirm(&mut self, tag: String) -> bool {
        if self.is_confirmed() {
            warn!(
                "Part {} already confirmed, ignoring tag {}",
                self.part_number, tag
            );
            return false;
        }

        self.confirmation_tag = Some(tag);
        self.state = PartState::Confirmed;
        true
    }
}

/// Uploads single parts with a bounded, linearly growing backoff
#[derive(Clone)]
pub struct PartUploader {
    api: Arc<dyn RecordingsApi>,
    policy: RetryPolicy,
}

impl PartUploader {
    pub fn new(api: Arc<dyn RecordingsApi>, policy: RetryPolicy) -> Self {
        Self { api, policy }
    }

    /// Upload `chunk` for `task`, retrying transient failures.
    ///
    /// Makes at most `max_retries + 1` attempts, sleeping `base_delay * n`
    /// before retry `n`. On success the task is confirmed and the tag returned.
    /// `Unauthorized` is returned as is, without retrying.
    pub async fn upload(&self, task: &mut PartTask, chunk: Bytes, content_type: &str) -> Result<String> {
        if let Some(tag) = task.confirmation_tag() {
            return Ok(tag.to_string());
        }

        task.state = PartState::Uploading;
        let max_attempts = self.policy.max_attempts();

        loop {
            task.attempt_count += 1;
            let attempt = task.attempt_count;

            debug!(
                "Uploading part {} (attempt {}/{}, {} bytes)",
                task.part_number,
                attempt,
                max_attempts,
                chunk.len()
            );

            // Bytes clones share the same buffer
            let result = self
                .api
                .upload_part(&task.destination, chunk.clone(), content_type)
                .await;

            let err = match result {
                Ok(tag) => {
                    info!("Part {} uploaded successfully", task.part_number);
                    task.confirm(tag.clone());
                    return Ok(tag);
                }
                Err(err) => err,
            };

            if err.is_auth() {
                error!("Part {} rejected: {}", task.part_number, err);
                task.state = PartState::Failed;
                return Err(err);
            }

            if !err.is_retryable() || attempt >= max_attempts {
                error!(
                    "Part {} failed permanently after {} attempts: {}",
                    task.part_number, attempt, err
                );
                task.state = PartState::Failed;
                return Err(UploadError::PartUploadFailed {
                    part_number: task.part_number,
                    attempts: attempt,
                    reason: err.to_string(),
                });
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                "Error uploading part {}: {}. Retrying in {:?} (retry {}/{})",
                task.part_number, err, delay, attempt, self.policy.max_retries
            );
            tokio::time::sleep(delay).await;
        }
    }
}
