use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::artifact::RecordingArtifact;
use super::config::UploadConfig;
use super::error::{Result, UploadError};
use super::part::{PartTask, PartUploader};
use super::progress::{multipart_percent, NoopObserver, ProgressObserver, ProgressUpdate};
use super::slicer;
use super::state::{SessionState, UploadStrategy};
use crate::api::{CompletedPart, RecordingsApi};

/// One logical upload of a finished recording
pub struct UploadSession {
    id: Uuid,
    filename: String,
    artifact: RecordingArtifact,
    auth_token: String,
    strategy: UploadStrategy,
    state: SessionState,
    created_at: DateTime<Utc>,

    /// Issued by the recordings API; never reused by another session
    upload_id: Option<String>,

    /// Ordered by part number
    parts: Vec<PartTask>,

    failure: Option<UploadError>,
    percent: u8,

    api: Arc<dyn RecordingsApi>,
    config: UploadConfig,
    observer: Arc<dyn ProgressObserver>,
    cancelled: Arc<AtomicBool>,
}

/// Serializable view of a session, for status reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub filename: String,
    pub total_size: u64,
    pub strategy: UploadStrategy,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub upload_id: Option<String>,
    pub total_parts: usize,
    pub confirmed_parts: usize,

    /// Parts already stored remotely for an upload that will never be completed
    pub orphaned_parts: Vec<u32>,

    pub failure: Option<String>,
}

impl UploadSession {
    pub fn new(
        artifact: RecordingArtifact,
        filename: impl Into<String>,
        auth_token: impl Into<String>,
        api: Arc<dyn RecordingsApi>,
        config: UploadConfig,
    ) -> Self {
        let strategy = UploadStrategy::for_size(artifact.len(), config.multipart_threshold_bytes);

        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            artifact,
            auth_token: auth_token.into(),
            strategy,
            state: SessionState::Planning,
            created_at: Utc::now(),
            upload_id: None,
            parts: Vec::new(),
            failure: None,
            percent: 0,
            api,
            config,
            observer: Arc::new(NoopObserver),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use a caller-chosen id, e.g. the registry handle for this upload
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn total_size(&self) -> u64 {
        self.artifact.len()
    }

    pub fn strategy(&self) -> UploadStrategy {
        self.strategy
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    pub fn parts(&self) -> &[PartTask] {
        &self.parts
    }

    pub fn failure(&self) -> Option<&UploadError> {
        self.failure.as_ref()
    }

    pub fn artifact(&self) -> &RecordingArtifact {
        &self.artifact
    }

    /// Flag that stops the session from starting further parts once set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Confirmed parts sorted by part number, as sent to the completion call
    pub fn completed_parts(&self) -> Vec<CompletedPart> {
        let mut parts: Vec<CompletedPart> = self
            .parts
            .iter()
            .filter_map(|task| {
                task.confirmation_tag().map(|tag| CompletedPart {
                    part_number: task.part_number,
                    etag: tag.to_string(),
                })
            })
            .collect();

        parts.sort_by_key(|p| p.part_number);
        parts
    }

    pub fn summary(&self) -> SessionSummary {
        let confirmed: Vec<u32> = self
            .parts
            .iter()
            .filter(|p| p.is_confirmed())
            .map(|p| p.part_number)
            .collect();

        let orphaned_parts = if self.state == SessionState::Failed {
            confirmed.clone()
        } else {
            Vec::new()
        };

        SessionSummary {
            id: self.id,
            filename: self.filename.clone(),
            total_size: self.total_size(),
            strategy: self.strategy,
            state: self.state,
            created_at: self.created_at,
            upload_id: self.upload_id.clone(),
            total_parts: self.parts.len(),
            confirmed_parts: confirmed.len(),
            orphaned_parts,
            failure: self.failure.as_ref().map(|e| e.to_string()),
        }
    }

    /// Drive the session to a terminal state.
    ///
    /// Returns the server response on success. Any failure leaves the session
    /// in `Failed` with the reason available from `failure()`; there is no
    /// partial retry, a new session has to be started from scratch.
    pub async fn run(&mut self) -> Result<Value> {
        if self.state != SessionState::Planning {
            return Err(UploadError::Internal {
                message: format!("Upload session {} already ran ({})", self.id, self.state),
            });
        }

        info!(
            "Starting upload session {}: {} ({:.2} MB, {:?})",
            self.id,
            self.filename,
            self.total_size() as f64 / 1024.0 / 1024.0,
            self.strategy
        );

        let result = match self.strategy {
            UploadStrategy::Direct => self.run_direct().await,
            UploadStrategy::Multipart => self.run_multipart().await,
        };

        if let Err(e) = &result {
            self.fail(e.clone());
        }

        result
    }

    async fn run_direct(&mut self) -> Result<Value> {
        self.report(10, "Preparing upload...");

        self.transition(SessionState::InProgress)?;
        self.report(50, "Uploading - 50%");

        let response = self
            .api
            .upload_direct(
                self.artifact.data().clone(),
                &self.filename,
                self.artifact.content_type(),
                &self.auth_token,
            )
            .await?;

        self.transition(SessionState::Completed)?;
        self.report(100, "Uploading - 100%");
        info!("Upload session {} completed (direct)", self.id);

        Ok(response)
    }

    async fn run_multipart(&mut self) -> Result<Value> {
        self.plan_multipart().await?;
        self.upload_parts().await?;
        self.finalize().await
    }

    /// Obtain the upload id and destinations, then cut the artifact into parts
    async fn plan_multipart(&mut self) -> Result<()> {
        self.report(0, "Starting multipart upload...");

        let upload_id = self
            .api
            .start_multipart_upload(
                &self.filename,
                self.total_size(),
                self.artifact.content_type(),
                &self.auth_token,
            )
            .await
            .map_err(planning_error)?;
        info!("Upload session {}: upload id {}", self.id, upload_id);
        self.upload_id = Some(upload_id.clone());

        self.report(10, "Generating upload URLs...");

        let destinations = self
            .api
            .generate_presigned_urls(&self.filename, &upload_id, self.total_size(), &self.auth_token)
            .await
            .map_err(planning_error)?;

        if destinations.is_empty() {
            return Err(UploadError::SessionPlanning {
                reason: "no destination handles were issued".into(),
            });
        }

        // The number of destinations decides the part count
        let ranges = slicer::slice(self.total_size(), destinations.len())?;
        self.parts = ranges
            .into_iter()
            .zip(destinations)
            .enumerate()
            .map(|(i, (range, destination))| PartTask::new(i as u32 + 1, range, destination))
            .collect();

        info!(
            "File size: {}, Parts: {}, Chunk size: {}",
            self.total_size(),
            self.parts.len(),
            self.parts.first().map(|p| p.range.len()).unwrap_or(0)
        );

        self.transition(SessionState::InProgress)?;
        self.report(20, "Uploading - 20%");
        Ok(())
    }

    async fn upload_parts(&mut self) -> Result<()> {
        let total = self.parts.len();
        let concurrency = self.config.max_concurrent_parts.max(1);
        let uploader = PartUploader::new(Arc::clone(&self.api), self.config.retry.clone());
        let data = self.artifact.data().clone();
        let content_type: Arc<str> = Arc::from(self.artifact.content_type());
        let cancelled = Arc::clone(&self.cancelled);

        let mut completed = 0usize;
        let mut failure = None;

        // Each future owns a copy of its part; results are written back by part number
        let mut uploads = stream::iter(self.parts.clone())
            .map(|mut task| {
                let chunk = data.slice(task.range.as_usize());
                let uploader = uploader.clone();
                let content_type = Arc::clone(&content_type);
                let cancelled = Arc::clone(&cancelled);
                async move {
                    if cancelled.load(Ordering::SeqCst) {
                        return (task, None);
                    }
                    let result = uploader.upload(&mut task, chunk, &content_type).await;
                    (task, Some(result))
                }
            })
            .buffer_unordered(concurrency);

        while let Some((task, outcome)) = uploads.next().await {
            if let Some(slot) = (task.part_number as usize)
                .checked_sub(1)
                .and_then(|i| self.parts.get_mut(i))
            {
                *slot = task;
            }

            match outcome {
                Some(Ok(_)) => {
                    completed += 1;
                    let percent = multipart_percent(completed, total);
                    self.report(percent, &format!("Uploading - {}%", percent));

                    if completed < total && self.cancelled.load(Ordering::SeqCst) {
                        failure = Some(UploadError::Cancelled {
                            completed_parts: completed,
                            total_parts: total,
                        });
                        break;
                    }
                }
                Some(Err(e)) => {
                    failure = Some(e);
                    break;
                }
                None => {
                    failure = Some(UploadError::Cancelled {
                        completed_parts: completed,
                        total_parts: total,
                    });
                    break;
                }
            }
        }
        drop(uploads);

        match failure {
            Some(e) => {
                let orphaned = self.parts.iter().filter(|p| p.is_confirmed()).count();
                if orphaned > 0 {
                    warn!(
                        "Upload session {}: {} confirmed parts left orphaned under upload id {}",
                        self.id,
                        orphaned,
                        self.upload_id.as_deref().unwrap_or("-")
                    );
                }
                Err(e)
            }
            None => Ok(()),
        }
    }

    async fn finalize(&mut self) -> Result<Value> {
        self.transition(SessionState::Finalizing)?;
        self.report(90, "Completing upload...");

        if let Some(pending) = self.parts.iter().find(|p| !p.is_confirmed()) {
            return Err(UploadError::Internal {
                message: format!("Part {} is not confirmed", pending.part_number),
            });
        }

        let upload_id = self.upload_id.clone().ok_or_else(|| UploadError::Internal {
            message: "No upload id to complete".into(),
        })?;
        let parts = self.completed_parts();

        let response = self
            .api
            .complete_multipart_upload(&self.filename, &upload_id, &parts, &self.auth_token)
            .await
            .map_err(|e| match e {
                UploadError::Unauthorized { .. } => e,
                other => UploadError::Completion {
                    upload_id: upload_id.clone(),
                    reason: other.to_string(),
                },
            })?;

        self.transition(SessionState::Completed)?;
        self.report(100, "Uploading - 100%");
        info!(
            "Upload session {} completed ({} parts, upload id {})",
            self.id,
            parts.len(),
            upload_id
        );

        Ok(response)
    }

    fn transition(&mut self, next: SessionState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(UploadError::Internal {
                message: format!("Illegal session transition {} -> {}", self.state, next),
            });
        }

        info!("Upload session {}: {} -> {}", self.id, self.state, next);
        self.state = next;
        Ok(())
    }

    fn fail(&mut self, err: UploadError) {
        error!("Upload session {} failed: {}", self.id, err);

        if !self.state.is_terminal() {
            self.state = SessionState::Failed;
        }
        let status = format!("Upload failed: {}", err);
        self.failure = Some(err);
        self.report(self.percent, &status);
    }

    fn report(&mut self, percent: u8, status: &str) {
        self.percent = percent;
        self.observer.on_progress(&ProgressUpdate {
            session_id: self.id,
            percent,
            state: self.state,
            status: status.to_string(),
        });
    }
}

/// Auth failures pass through; anything else while planning is a planning error
fn planning_error(err: UploadError) -> UploadError {
    match err {
        UploadError::Unauthorized { .. } => err,
        other => UploadError::SessionPlanning {
            reason: other.to_string(),
        },
    }
}
