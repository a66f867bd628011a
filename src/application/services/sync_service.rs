use crate::application::ports::local_store::LocalStore;
use crate::application::ports::remote_store::{DocumentRef, Precondition, RemoteStore, WriteBatch};
use crate::domain::entities::{INSPECTION_STATUS_FINALIZED, PendingInspection, SyncResult};
use crate::domain::value_objects::WorkOrderStatus;
use crate::shared::config::CollectionConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;

#[async_trait]
pub trait SyncParticipant: Send + Sync {
    async fn sync_pending(&self) -> Result<SyncResult, AppError>;
    async fn pending_count(&self) -> Result<u64, AppError>;
}

/// Replays queued inspections against the remote store.
pub struct SyncService {
    store: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    collections: CollectionConfig,
}

impl SyncService {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        collections: CollectionConfig,
    ) -> Self {
        Self {
            store,
            remote,
            collections,
        }
    }

    /// Drains the queue in `LocalId` order. Each record is committed on its own;
    /// a failed commit leaves the record queued and the pass moves on.
    ///
    /// Errors only when the queue itself cannot be read.
    pub async fn sync_with_remote(&self) -> Result<SyncResult, AppError> {
        let pending = self.store.scan_pending().await?;
        if pending.is_empty() {
            return Ok(SyncResult::empty());
        }

        let mut result = SyncResult::empty();
        for record in &pending {
            match self.commit_record(record).await {
                Ok(remote_id) => {
                    result.synced += 1;
                    if let Err(err) = self.store.delete_pending(record.local_id).await {
                        // The remote already holds the inspection; a later pass may
                        // resend it.
                        tracing::error!(
                            target: "offline::sync",
                            local_id = %record.local_id,
                            remote_id = %remote_id,
                            error = %err,
                            "committed inspection could not be removed from the queue"
                        );
                    }
                }
                Err(err) => {
                    result.failed += 1;
                    tracing::warn!(
                        target: "offline::sync",
                        local_id = %record.local_id,
                        work_order_id = %record.work_order_id(),
                        error = %err,
                        "inspection commit failed; keeping it queued"
                    );
                }
            }
        }

        tracing::info!(
            target: "offline::sync",
            synced = result.synced,
            failed = result.failed,
            "pending inspections replayed"
        );
        Ok(result)
    }

    async fn commit_record(&self, record: &PendingInspection) -> Result<String, AppError> {
        let remote_id = self.remote.new_document_id(&self.collections.inspections);
        let batch = self.build_batch(record, &remote_id)?;
        self.remote.commit(batch).await?;
        Ok(remote_id)
    }

    fn build_batch(
        &self,
        record: &PendingInspection,
        remote_id: &str,
    ) -> Result<WriteBatch, AppError> {
        let mut inspection = match serde_json::to_value(&record.inspection)? {
            Value::Object(map) => map,
            _ => {
                return Err(AppError::SerializationError(
                    "inspection did not serialize to an object".to_string(),
                ));
            }
        };
        inspection.insert(
            "status".to_string(),
            Value::String(INSPECTION_STATUS_FINALIZED.to_string()),
        );
        inspection.insert(
            "syncedAt".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        let mut work_order = Map::new();
        work_order.insert(
            "status".to_string(),
            serde_json::to_value(WorkOrderStatus::Concluida)?,
        );

        let open_states = WorkOrderStatus::closable_by_inspection()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        let mut batch = self.remote.begin_batch();
        batch
            .set(
                DocumentRef::new(self.collections.inspections.clone(), remote_id),
                inspection,
            )
            .update_if(
                DocumentRef::new(
                    self.collections.work_orders.clone(),
                    record.work_order_id(),
                ),
                work_order,
                Precondition::one_of("status", open_states),
            );
        Ok(batch)
    }
}

#[async_trait]
impl SyncParticipant for SyncService {
    async fn sync_pending(&self) -> Result<SyncResult, AppError> {
        self.sync_with_remote().await
    }

    async fn pending_count(&self) -> Result<u64, AppError> {
        self.store.count_pending().await
    }
}
