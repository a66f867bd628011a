use crate::domain::entities::{
    Client, Equipment, EquipmentComponent, InspectionDraft, PendingInspection,
    ReferenceCacheStatus, ReferenceSnapshot, WorkOrder,
};
use crate::domain::value_objects::LocalId;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// On-device storage for the pending-write queue and the reference mirrors.
///
/// Every method other than `open`/`close` opens the store on demand, so callers
/// never observe a half-initialized handle.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn open(&self) -> Result<(), AppError>;
    async fn close(&self);

    async fn insert_pending(&self, draft: &InspectionDraft) -> Result<LocalId, AppError>;
    /// Pending inspections in ascending `LocalId` order.
    async fn scan_pending(&self) -> Result<Vec<PendingInspection>, AppError>;
    async fn delete_pending(&self, local_id: LocalId) -> Result<(), AppError>;
    async fn count_pending(&self) -> Result<u64, AppError>;

    /// Replaces all four reference mirrors in a single transaction.
    async fn replace_reference_data(&self, snapshot: &ReferenceSnapshot) -> Result<(), AppError>;
    async fn clear_reference_data(&self) -> Result<(), AppError>;

    async fn cached_work_orders(&self) -> Result<Vec<WorkOrder>, AppError>;
    async fn cached_equipment(&self, id: &str) -> Result<Option<Equipment>, AppError>;
    async fn cached_client(&self, id: &str) -> Result<Option<Client>, AppError>;
    async fn cached_components(
        &self,
        equipment_id: &str,
    ) -> Result<Vec<EquipmentComponent>, AppError>;
    async fn reference_cache_status(&self) -> Result<ReferenceCacheStatus, AppError>;
}
