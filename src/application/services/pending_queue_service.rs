use crate::application::ports::local_store::LocalStore;
use crate::domain::entities::{InspectionDraft, PendingInspection};
use crate::domain::value_objects::LocalId;
use crate::shared::error::AppError;
use std::sync::Arc;

pub struct PendingQueueService {
    store: Arc<dyn LocalStore>,
}

impl PendingQueueService {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Queues a finalized inspection for the next sync. Nothing is sent remotely.
    pub async fn save_pending_inspection(
        &self,
        draft: &InspectionDraft,
    ) -> Result<LocalId, AppError> {
        draft.validate().map_err(AppError::ValidationError)?;

        let local_id = self.store.insert_pending(draft).await.map_err(|err| {
            tracing::error!(
                target: "offline::queue",
                work_order_id = %draft.work_order_id,
                error = %err,
                "failed to queue inspection"
            );
            err
        })?;

        tracing::info!(
            target: "offline::queue",
            local_id = %local_id,
            work_order_id = %draft.work_order_id,
            "inspection queued for sync"
        );
        Ok(local_id)
    }

    pub async fn pending_count(&self) -> Result<u64, AppError> {
        self.store.count_pending().await
    }

    pub async fn list_pending(&self) -> Result<Vec<PendingInspection>, AppError> {
        self.store.scan_pending().await
    }
}
