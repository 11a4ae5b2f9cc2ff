//! Upload progress registry
//!
//! Keeps the most recently begun uploads in memory for status display:
//! - `begin` records a new upload and evicts the oldest beyond capacity
//! - `update_progress` patches a record in place
//! - `RegistryObserver` feeds session progress straight into a record
//!
//! Nothing is persisted across restarts.

mod record;

pub use record::{UploadHandle, UploadRecord};

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

use crate::upload::{ProgressObserver, ProgressUpdate, SessionState};

/// Records retained for display by default
pub const DEFAULT_REGISTRY_CAPACITY: usize = 2;

/// Bounded, insertion-ordered set of upload records
pub struct UploadRegistry {
    capacity: usize,
    records: Mutex<VecDeque<UploadRecord>>,
}

impl UploadRegistry {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity + 1)),
        }
    }

    /// Start tracking an upload; evicts the oldest record once over capacity
    pub fn begin(&self, filename: impl Into<String>, size: u64) -> UploadHandle {
        let record = UploadRecord::new(filename.into(), size);
        let handle = record.handle;

        let mut records = self.records.lock();
        records.push_back(record);
        while records.len() > self.capacity {
            if let Some(evicted) = records.pop_front() {
                debug!("Evicted upload record {} ({})", evicted.handle, evicted.filename);
            }
        }

        handle
    }

    /// Update a record. Returns false if the record has already been evicted.
    pub fn update_progress(
        &self,
        handle: UploadHandle,
        percent: u8,
        state: SessionState,
        status: impl Into<String>,
    ) -> bool {
        let mut records = self.records.lock();
        match records.iter_mut().find(|r| r.handle == handle) {
            Some(record) => {
                record.percent = percent.min(100);
                record.state = state;
                record.status = status.into();
                record.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, handle: UploadHandle) -> Option<UploadRecord> {
        self.records
            .lock()
            .iter()
            .find(|r| r.handle == handle)
            .cloned()
    }

    /// Retained records, oldest first
    pub fn snapshot(&self) -> Vec<UploadRecord> {
        self.records.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Default for UploadRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_CAPACITY)
    }
}

/// Forwards session progress into one registry record
pub struct RegistryObserver {
    registry: Arc<UploadRegistry>,
    handle: UploadHandle,
}

impl RegistryObserver {
    pub fn new(registry: Arc<UploadRegistry>, handle: UploadHandle) -> Self {
        Self { registry, handle }
    }
}

impl ProgressObserver for RegistryObserver {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.registry
            .update_progress(self.handle, update.percent, update.state, update.status.clone());
    }
}
