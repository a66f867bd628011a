pub mod cache_status;
pub mod inspection;
pub mod prefetch_report;
pub mod reference;
pub mod sync_result;

pub use cache_status::{CollectionStatus, ReferenceCacheStatus};
pub use inspection::{
    INSPECTION_STATUS_FINALIZED, InspectionDraft, InspectionItem, PendingInspection,
};
pub use prefetch_report::PrefetchReport;
pub use reference::{Client, Equipment, EquipmentComponent, ReferenceSnapshot, WorkOrder};
pub use sync_result::SyncResult;
