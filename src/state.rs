use crate::application::ports::local_store::LocalStore;
use crate::application::ports::page_cache::{PageCache, PageSource};
use crate::application::ports::remote_store::RemoteStore;
use crate::application::services::{PendingQueueService, PrefetchService, SyncService};
use crate::domain::entities::{InspectionDraft, PrefetchReport, WorkOrder};
use crate::domain::value_objects::LocalId;
use crate::infrastructure::cache::MemoryPageCache;
use crate::infrastructure::network::ConnectivityMonitor;
use crate::infrastructure::offline::{
    SqliteLocalStore, SyncEventEmitter, SyncJob, SyncJobHandle, SyncMetricsSnapshot, SyncPass,
    SyncStatus, TriggerSource,
};
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};

/// Session-wide wiring of the offline core. Owns the local store handle and
/// the background sync loop.
pub struct AppState {
    pub config: AppConfig,
    store: Arc<SqliteLocalStore>,
    connectivity: Arc<ConnectivityMonitor>,
    page_cache: Arc<MemoryPageCache>,
    queue: PendingQueueService,
    prefetch: PrefetchService,
    sync_job: Arc<SyncJob>,
    background: Mutex<Option<SyncJobHandle>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        remote: Arc<dyn RemoteStore>,
        page_source: Arc<dyn PageSource>,
    ) -> Result<Self, AppError> {
        Self::with_emitter(config, remote, page_source, None)
    }

    pub fn with_emitter(
        config: AppConfig,
        remote: Arc<dyn RemoteStore>,
        page_source: Arc<dyn PageSource>,
        event_emitter: Option<Arc<dyn SyncEventEmitter>>,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;

        let store = Arc::new(SqliteLocalStore::from_config(&config.storage));
        let connectivity = Arc::new(ConnectivityMonitor::default());
        let page_cache = Arc::new(MemoryPageCache::new(
            page_source,
            config.prefetch.page_cache_ttl,
        ));

        let queue = PendingQueueService::new(store.clone());
        let prefetch = PrefetchService::new(
            store.clone(),
            Arc::clone(&remote),
            page_cache.clone(),
            connectivity.clone(),
            config.collections.clone(),
            config.prefetch.clone(),
        );
        let sync = Arc::new(SyncService::new(
            store.clone(),
            remote,
            config.collections.clone(),
        ));
        let sync_job = SyncJob::with_emitter(event_emitter, sync, connectivity.clone());

        tracing::debug!(target: "offline::state", location = ?store.location(), "offline core wired");
        Ok(Self {
            config,
            store,
            connectivity,
            page_cache,
            queue,
            prefetch,
            sync_job,
            background: Mutex::new(None),
        })
    }

    pub async fn save_locally(&self, draft: &InspectionDraft) -> Result<LocalId, AppError> {
        let local_id = self.queue.save_pending_inspection(draft).await?;
        if let Err(err) = self.sync_job.refresh_pending_count().await {
            tracing::warn!(target: "offline::state", error = %err, "failed to refresh pending count");
        }
        Ok(local_id)
    }

    pub async fn prefetch_for_offline(
        &self,
        work_orders: &[WorkOrder],
    ) -> Result<PrefetchReport, AppError> {
        self.prefetch.cache_data_for_offline(work_orders).await
    }

    /// Runs a pass immediately, subject to the same single-flight gate as the
    /// background loop.
    pub async fn sync_now(&self) -> Result<SyncPass, AppError> {
        self.sync_job.run_once(TriggerSource::Manual).await
    }

    pub async fn pending_count(&self) -> Result<u64, AppError> {
        self.queue.pending_count().await
    }

    pub fn set_online(&self, online: bool) -> bool {
        self.connectivity.set_online(online)
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync_job.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.sync_job.subscribe()
    }

    pub fn sync_metrics(&self) -> SyncMetricsSnapshot {
        self.sync_job.metrics()
    }

    pub fn local_store(&self) -> Arc<dyn LocalStore> {
        self.store.clone()
    }

    pub fn page_cache(&self) -> Arc<dyn PageCache> {
        self.page_cache.clone()
    }

    /// Starts the periodic and reconnect-driven sync loop. Returns false when
    /// auto sync is disabled or the loop is already running.
    pub async fn start_background_sync(&self) -> bool {
        if !self.config.sync.auto_sync {
            return false;
        }
        let mut background = self.background.lock().await;
        if background.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }
        let interval = Duration::from_secs(self.config.sync.sync_interval);
        *background = Some(self.sync_job.spawn(interval));
        true
    }

    pub async fn shutdown(&self) {
        let handle = self.background.lock().await.take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
        self.store.close().await;
        tracing::info!(target: "offline::state", "offline core shut down");
    }
}
