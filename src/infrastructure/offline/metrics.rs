use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcomeStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetricsSnapshot {
    pub total_passes: u64,
    pub total_failed_passes: u64,
    pub consecutive_failure: u64,
    pub total_synced: u64,
    pub total_failed_records: u64,
    pub last_success_ms: Option<u64>,
    pub last_failure_ms: Option<u64>,
    pub last_outcome: Option<SyncOutcomeStatus>,
    pub last_trigger: Option<String>,
    pub last_synced_count: Option<u32>,
    pub last_failed_count: Option<u32>,
    pub last_duration_ms: Option<u64>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcomeMetadata {
    pub trigger: Option<String>,
    pub synced_count: Option<u32>,
    pub failed_count: Option<u32>,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
}

#[derive(Default, Clone)]
struct LastPassMetadata {
    last_outcome: Option<SyncOutcomeStatus>,
    trigger: Option<String>,
    synced_count: Option<u32>,
    failed_count: Option<u32>,
    duration_ms: Option<u64>,
    error: Option<String>,
}

/// Counters for the background sync passes of one session.
///
/// A pass is a `Failure` when it could not run at all (queue unreadable);
/// individual records that fail to commit are counted in `total_failed_records`.
pub struct SyncMetrics {
    passes: AtomicU64,
    failed_passes: AtomicU64,
    consecutive_failure: AtomicU64,
    synced: AtomicU64,
    failed_records: AtomicU64,
    last_success_ms: AtomicU64,
    last_failure_ms: AtomicU64,
    metadata: Mutex<LastPassMetadata>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            passes: AtomicU64::new(0),
            failed_passes: AtomicU64::new(0),
            consecutive_failure: AtomicU64::new(0),
            synced: AtomicU64::new(0),
            failed_records: AtomicU64::new(0),
            last_success_ms: AtomicU64::new(0),
            last_failure_ms: AtomicU64::new(0),
            metadata: Mutex::new(LastPassMetadata::default()),
        }
    }

    /// Records one pass and returns the previous consecutive failure count.
    pub fn record(&self, status: SyncOutcomeStatus, meta: &SyncOutcomeMetadata) -> u64 {
        self.passes.fetch_add(1, Ordering::Relaxed);
        let previous_streak = match status {
            SyncOutcomeStatus::Success => {
                self.last_success_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.consecutive_failure.swap(0, Ordering::Relaxed)
            }
            SyncOutcomeStatus::Failure => {
                self.failed_passes.fetch_add(1, Ordering::Relaxed);
                self.last_failure_ms
                    .store(current_unix_ms(), Ordering::Relaxed);
                self.consecutive_failure.fetch_add(1, Ordering::Relaxed)
            }
        };

        self.synced.fetch_add(
            u64::from(meta.synced_count.unwrap_or(0)),
            Ordering::Relaxed,
        );
        self.failed_records.fetch_add(
            u64::from(meta.failed_count.unwrap_or(0)),
            Ordering::Relaxed,
        );

        if let Ok(mut guard) = self.metadata.lock() {
            guard.last_outcome = Some(status);
            guard.trigger = meta.trigger.clone();
            guard.synced_count = meta.synced_count;
            guard.failed_count = meta.failed_count;
            guard.duration_ms = meta.duration_ms;
            guard.error = meta.error.clone();
        }

        previous_streak
    }

    pub fn snapshot(&self) -> SyncMetricsSnapshot {
        let metadata = self
            .metadata
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();

        SyncMetricsSnapshot {
            total_passes: self.passes.load(Ordering::Relaxed),
            total_failed_passes: self.failed_passes.load(Ordering::Relaxed),
            consecutive_failure: self.consecutive_failure.load(Ordering::Relaxed),
            total_synced: self.synced.load(Ordering::Relaxed),
            total_failed_records: self.failed_records.load(Ordering::Relaxed),
            last_success_ms: to_option(self.last_success_ms.load(Ordering::Relaxed)),
            last_failure_ms: to_option(self.last_failure_ms.load(Ordering::Relaxed)),
            last_outcome: metadata.last_outcome,
            last_trigger: metadata.trigger,
            last_synced_count: metadata.synced_count,
            last_failed_count: metadata.failed_count,
            last_duration_ms: metadata.duration_ms,
            last_error: metadata.error,
        }
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn to_option(value: u64) -> Option<u64> {
    if value == 0 { None } else { Some(value) }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}
