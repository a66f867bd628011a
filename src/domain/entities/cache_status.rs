use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionStatus {
    pub collection: String,
    pub item_count: u64,
    pub data_version: u32,
    pub last_synced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReferenceCacheStatus {
    pub collections: Vec<CollectionStatus>,
}

impl ReferenceCacheStatus {
    pub fn count_for(&self, collection: &str) -> u64 {
        self.collections
            .iter()
            .find(|status| status.collection == collection)
            .map(|status| status.item_count)
            .unwrap_or(0)
    }

    pub fn total_items(&self) -> u64 {
        self.collections.iter().map(|status| status.item_count).sum()
    }
}
