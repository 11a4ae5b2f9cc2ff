// Shared fakes for upload tests
//
// `FakeRecordingsApi` scripts per-destination failures and latencies and
// records every call, so tests can assert on call counts, ordering, and the
// exact completion payload.

#![allow(dead_code)]

use bytes::Bytes;
use parking_lot::Mutex;
use recording_upload::api::{CompletedPart, RecordingsApi};
use recording_upload::upload::{ProgressUpdate, Result, UploadError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start { filename: String, file_size: u64 },
    Presign { upload_id: String },
    Part { destination: String, size: usize },
    Complete { upload_id: String, parts: Vec<CompletedPart> },
    Direct { filename: String, size: usize },
}

/// One PUT attempt against a destination
#[derive(Debug, Clone)]
pub struct PartAttempt {
    pub destination: String,
    pub at: Instant,
    pub first_byte: Option<u8>,
}

#[derive(Default)]
pub struct FakeRecordingsApi {
    pub upload_id: String,
    pub destinations: Vec<String>,

    /// Remaining failures per destination (u32::MAX = never succeeds)
    part_failures: Mutex<HashMap<String, u32>>,
    part_error: Option<UploadError>,
    part_latency: HashMap<String, Duration>,

    start_error: Option<UploadError>,
    presign_error: Option<UploadError>,
    complete_error: Option<UploadError>,
    direct_error: Option<UploadError>,

    calls: Mutex<Vec<Call>>,
    attempts: Mutex<Vec<PartAttempt>>,
    confirmed_order: Mutex<Vec<String>>,
}

impl FakeRecordingsApi {
    /// Fake that issues `parts` destinations named `https://storage.test/part/<n>`
    pub fn with_parts(parts: usize) -> Self {
        Self {
            upload_id: "upload-123".to_string(),
            destinations: (1..=parts)
                .map(|n| format!("https://storage.test/part/{}", n))
                .collect(),
            ..Default::default()
        }
    }

    pub fn destination(&self, part_number: usize) -> String {
        self.destinations[part_number - 1].clone()
    }

    pub fn fail_part(self, part_number: usize, times: u32) -> Self {
        let destination = self.destination(part_number);
        self.part_failures.lock().insert(destination, times);
        self
    }

    pub fn fail_part_forever(self, part_number: usize) -> Self {
        self.fail_part(part_number, u32::MAX)
    }

    /// Error returned by failing part attempts (default: a transport error)
    pub fn with_part_error(mut self, err: UploadError) -> Self {
        self.part_error = Some(err);
        self
    }

    pub fn delay_part(mut self, part_number: usize, latency: Duration) -> Self {
        let destination = self.destination(part_number);
        self.part_latency.insert(destination, latency);
        self
    }

    pub fn fail_start(mut self, err: UploadError) -> Self {
        self.start_error = Some(err);
        self
    }

    pub fn fail_presign(mut self, err: UploadError) -> Self {
        self.presign_error = Some(err);
        self
    }

    pub fn fail_complete(mut self, err: UploadError) -> Self {
        self.complete_error = Some(err);
        self
    }

    pub fn fail_direct(mut self, err: UploadError) -> Self {
        self.direct_error = Some(err);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn part_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Part { .. }))
            .collect()
    }

    pub fn completion(&self) -> Option<Vec<CompletedPart>> {
        self.calls().into_iter().find_map(|c| match c {
            Call::Complete { parts, .. } => Some(parts),
            _ => None,
        })
    }

    pub fn attempts_for(&self, part_number: usize) -> Vec<PartAttempt> {
        let destination = self.destination(part_number);
        self.attempts
            .lock()
            .iter()
            .filter(|a| a.destination == destination)
            .cloned()
            .collect()
    }

    /// Destinations in the order their PUTs succeeded
    pub fn confirmed_order(&self) -> Vec<String> {
        self.confirmed_order.lock().clone()
    }

    pub fn tag_for(destination: &str) -> String {
        format!("etag-{}", destination.rsplit('/').next().unwrap_or(destination))
    }
}

#[async_trait::async_trait]
impl RecordingsApi for FakeRecordingsApi {
    async fn start_multipart_upload(
        &self,
        filename: &str,
        file_size: u64,
        _content_type: &str,
        _auth_token: &str,
    ) -> Result<String> {
        self.calls.lock().push(Call::Start {
            filename: filename.to_string(),
            file_size,
        });
        match &self.start_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.upload_id.clone()),
        }
    }

    async fn generate_presigned_urls(
        &self,
        _filename: &str,
        upload_id: &str,
        _file_size: u64,
        _auth_token: &str,
    ) -> Result<Vec<String>> {
        self.calls.lock().push(Call::Presign {
            upload_id: upload_id.to_string(),
        });
        match &self.presign_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.destinations.clone()),
        }
    }

    async fn upload_part(&self, destination: &str, chunk: Bytes, _content_type: &str) -> Result<String> {
        self.calls.lock().push(Call::Part {
            destination: destination.to_string(),
            size: chunk.len(),
        });
        self.attempts.lock().push(PartAttempt {
            destination: destination.to_string(),
            at: Instant::now(),
            first_byte: chunk.first().copied(),
        });

        if let Some(latency) = self.part_latency.get(destination) {
            tokio::time::sleep(*latency).await;
        }

        {
            let mut failures = self.part_failures.lock();
            if let Some(remaining) = failures.get_mut(destination) {
                if *remaining > 0 {
                    if *remaining != u32::MAX {
                        *remaining -= 1;
                    }
                    return Err(self.part_error.clone().unwrap_or(UploadError::Transport {
                        message: "connection reset".into(),
                    }));
                }
            }
        }

        self.confirmed_order.lock().push(destination.to_string());
        Ok(Self::tag_for(destination))
    }

    async fn complete_multipart_upload(
        &self,
        _filename: &str,
        upload_id: &str,
        parts: &[CompletedPart],
        _auth_token: &str,
    ) -> Result<Value> {
        self.calls.lock().push(Call::Complete {
            upload_id: upload_id.to_string(),
            parts: parts.to_vec(),
        });
        match &self.complete_error {
            Some(err) => Err(err.clone()),
            None => Ok(json!({ "message": "Upload completed successfully", "uploadId": upload_id })),
        }
    }

    async fn upload_direct(
        &self,
        data: Bytes,
        filename: &str,
        _content_type: &str,
        _auth_token: &str,
    ) -> Result<Value> {
        self.calls.lock().push(Call::Direct {
            filename: filename.to_string(),
            size: data.len(),
        });
        match &self.direct_error {
            Some(err) => Err(err.clone()),
            None => Ok(json!({ "message": "Upload successful", "filename": filename })),
        }
    }
}

/// Observer that keeps every update it sees
#[derive(Default)]
pub struct RecordingObserver {
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().clone()
    }

    pub fn percents(&self) -> Vec<u8> {
        self.updates().iter().map(|u| u.percent).collect()
    }
}

impl recording_upload::upload::ProgressObserver for RecordingObserver {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.updates.lock().push(update.clone());
    }
}

/// Payload whose byte at offset `i` is `(i / 1 MiB) as u8`, so each part's
/// first byte identifies where it was sliced from
pub fn patterned_payload(size: u64) -> Vec<u8> {
    (0..size).map(|i| (i / MIB) as u8).collect()
}
