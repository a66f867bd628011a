pub mod pending_queue_service;
pub mod prefetch_service;
pub mod sync_service;

pub use pending_queue_service::PendingQueueService;
pub use prefetch_service::PrefetchService;
pub use sync_service::{SyncParticipant, SyncService};
