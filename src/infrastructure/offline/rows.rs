use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingInspectionRow {
    pub local_id: i64,
    pub work_order_id: String,
    pub equipment_id: String,
    pub inspector_id: String,
    pub payload: String,
    pub queued_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReferenceRow {
    pub id: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CacheMetadataRow {
    pub cache_key: String,
    pub item_count: i64,
    pub data_version: i64,
    pub last_synced_at: Option<i64>,
}
