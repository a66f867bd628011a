use super::metrics::{SyncMetrics, SyncMetricsSnapshot, SyncOutcomeMetadata, SyncOutcomeStatus};
use crate::application::ports::connectivity::ConnectivitySignal;
use crate::application::services::sync_service::SyncParticipant;
use crate::domain::entities::SyncResult;
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub trait SyncEventEmitter: Send + Sync {
    fn emit_synced(&self, result: &SyncResult) -> Result<(), String>;
    fn emit_failure(&self, message: &str) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Connectivity,
    Interval,
    Manual,
}

impl TriggerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerSource::Connectivity => "connectivity",
            TriggerSource::Interval => "interval",
            TriggerSource::Manual => "manual",
        }
    }
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single trigger ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPass {
    Completed(SyncResult),
    /// Another pass held the gate.
    Busy,
    /// Nothing was queued.
    Idle,
    Offline,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub syncing: bool,
    pub online: bool,
    pub pending_count: u64,
    pub last_result: Option<SyncResult>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

pub struct SyncJob {
    participant: Arc<dyn SyncParticipant>,
    connectivity: Arc<dyn ConnectivitySignal>,
    event_emitter: Option<Arc<dyn SyncEventEmitter>>,
    metrics: SyncMetrics,
    gate: Mutex<()>,
    status: watch::Sender<SyncStatus>,
}

/// Clears `syncing` on drop so the flag never outlives the pass.
struct SyncingFlag<'a>(&'a watch::Sender<SyncStatus>);

impl<'a> SyncingFlag<'a> {
    fn raise(status: &'a watch::Sender<SyncStatus>) -> Self {
        status.send_modify(|status| status.syncing = true);
        Self(status)
    }
}

impl Drop for SyncingFlag<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|status| status.syncing = false);
    }
}

impl SyncJob {
    pub fn create(
        participant: Arc<dyn SyncParticipant>,
        connectivity: Arc<dyn ConnectivitySignal>,
    ) -> Arc<Self> {
        Self::with_emitter(None, participant, connectivity)
    }

    pub fn with_emitter(
        event_emitter: Option<Arc<dyn SyncEventEmitter>>,
        participant: Arc<dyn SyncParticipant>,
        connectivity: Arc<dyn ConnectivitySignal>,
    ) -> Arc<Self> {
        let (status, _) = watch::channel(SyncStatus {
            online: connectivity.is_online(),
            ..SyncStatus::default()
        });
        Arc::new(Self {
            participant,
            connectivity,
            event_emitter,
            metrics: SyncMetrics::new(),
            gate: Mutex::new(()),
            status,
        })
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn metrics(&self) -> SyncMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn is_syncing(&self) -> bool {
        self.status.borrow().syncing
    }

    /// Re-reads the queue size into the published status.
    pub async fn refresh_pending_count(&self) -> Result<u64, AppError> {
        let pending = self.participant.pending_count().await?;
        self.status
            .send_if_modified(|status| replace(&mut status.pending_count, pending));
        Ok(pending)
    }

    /// Runs one pass unless another is in flight, the device is offline, or the
    /// queue is empty.
    pub async fn run_once(&self, source: TriggerSource) -> Result<SyncPass, AppError> {
        let Ok(_guard) = self.gate.try_lock() else {
            tracing::debug!(target: "offline::sync", trigger = %source, "sync already running");
            return Ok(SyncPass::Busy);
        };

        let online = self.connectivity.is_online();
        self.status
            .send_if_modified(|status| replace(&mut status.online, online));
        if !online {
            return Ok(SyncPass::Offline);
        }

        let started = Instant::now();
        let pending = match self.refresh_pending_count().await {
            Ok(pending) => pending,
            Err(err) => {
                self.record_failure(source, started, &err);
                return Err(err);
            }
        };
        if pending == 0 {
            return Ok(SyncPass::Idle);
        }

        let outcome = {
            let _flag = SyncingFlag::raise(&self.status);
            self.participant.sync_pending().await
        };

        match outcome {
            Ok(result) => {
                self.record_success(source, started, &result).await;
                Ok(SyncPass::Completed(result))
            }
            Err(err) => {
                self.record_failure(source, started, &err);
                Err(err)
            }
        }
    }

    pub fn trigger(self: &Arc<Self>, source: TriggerSource) {
        let job = Arc::clone(self);
        tokio::spawn(async move {
            job.run_guarded(source).await;
        });
    }

    /// Starts the background loop: one pass per interval tick and one per
    /// offline-to-online transition.
    pub fn spawn(self: &Arc<Self>, interval: Duration) -> SyncJobHandle {
        let job = Arc::clone(self);
        let mut connectivity = self.connectivity.subscribe();
        let mut was_online = connectivity.borrow_and_update().is_online();
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        job.run_guarded(TriggerSource::Interval).await;
                    }
                    changed = connectivity.changed() => {
                        if changed.is_err() {
                            tracing::debug!(target: "offline::sync", "connectivity signal closed");
                            break;
                        }
                        let online = connectivity.borrow_and_update().is_online();
                        job.status
                            .send_if_modified(|status| replace(&mut status.online, online));
                        if online && !was_online {
                            job.run_guarded(TriggerSource::Connectivity).await;
                        }
                        was_online = online;
                    }
                }
            }
            tracing::debug!(target: "offline::sync", "background sync stopped");
        });

        tracing::info!(
            target: "offline::sync",
            interval_secs = interval.as_secs(),
            "background sync started"
        );
        SyncJobHandle {
            stop: stop_tx,
            task,
        }
    }

    async fn run_guarded(&self, source: TriggerSource) {
        if let Err(err) = self.run_once(source).await {
            tracing::debug!(
                target: "offline::sync",
                trigger = %source,
                error = %err,
                "sync pass ended with error"
            );
        }
    }

    async fn record_success(&self, source: TriggerSource, started: Instant, result: &SyncResult) {
        let meta = SyncOutcomeMetadata {
            trigger: Some(source.to_string()),
            synced_count: Some(result.synced),
            failed_count: Some(result.failed),
            duration_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        };
        self.metrics.record(SyncOutcomeStatus::Success, &meta);

        let pending = self.participant.pending_count().await.unwrap_or_else(|err| {
            tracing::warn!(
                target: "offline::sync",
                error = %err,
                "failed to refresh pending count after sync"
            );
            self.status.borrow().pending_count.saturating_sub(u64::from(result.synced))
        });
        self.status.send_modify(|status| {
            status.pending_count = pending;
            status.last_result = Some(*result);
            if result.synced > 0 {
                status.last_synced_at = Some(Utc::now());
            }
        });

        if result.synced > 0 {
            self.emit_synced(result);
        }
        tracing::info!(
            target: "offline::sync",
            trigger = %source,
            synced = result.synced,
            failed = result.failed,
            pending,
            "sync pass completed"
        );
    }

    fn record_failure(&self, source: TriggerSource, started: Instant, err: &AppError) {
        let meta = SyncOutcomeMetadata {
            trigger: Some(source.to_string()),
            duration_ms: Some(started.elapsed().as_millis() as u64),
            error: Some(err.to_string()),
            ..SyncOutcomeMetadata::default()
        };
        let previous_streak = self.metrics.record(SyncOutcomeStatus::Failure, &meta);

        tracing::error!(
            target: "offline::sync",
            trigger = %source,
            error = %err,
            consecutive = previous_streak + 1,
            "sync pass failed"
        );
        if previous_streak == 0 {
            self.emit_failure(&err.user_message());
        }
    }

    fn emit_synced(&self, result: &SyncResult) {
        if let Some(emitter) = &self.event_emitter
            && let Err(err) = emitter.emit_synced(result)
        {
            tracing::warn!(
                target: "offline::sync",
                error = %err,
                "failed to emit sync completion event"
            );
        }
    }

    fn emit_failure(&self, message: &str) {
        if let Some(emitter) = &self.event_emitter
            && let Err(err) = emitter.emit_failure(message)
        {
            tracing::warn!(
                target: "offline::sync",
                error = %err,
                "failed to emit sync failure event"
            );
        }
    }
}

pub struct SyncJobHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncJobHandle {
    /// Asks the loop to exit after the current pass and waits for it.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(err) = self.task.await
            && !err.is_cancelled()
        {
            tracing::warn!(target: "offline::sync", error = %err, "background sync task panicked");
        }
    }

    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
