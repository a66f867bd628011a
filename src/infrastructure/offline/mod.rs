mod mappers;
pub mod metrics;
mod rows;
pub mod sqlite_store;
pub mod sync_job;

pub use metrics::{SyncMetrics, SyncMetricsSnapshot};
pub use sqlite_store::SqliteLocalStore;
pub use sync_job::{SyncEventEmitter, SyncJob, SyncJobHandle, SyncPass, SyncStatus, TriggerSource};
