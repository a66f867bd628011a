use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Longest accepted background sync period (one day).
pub const MAX_SYNC_INTERVAL_SECS: u64 = 24 * 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub prefetch: PrefetchConfig,
    pub collections: CollectionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for the on-device database. Falls back to the platform data dir.
    pub data_dir: Option<String>,
    pub database_file: String,
    pub in_memory: bool,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub sync_interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefetchConfig {
    pub listing_route: String,
    pub detail_route_prefix: String,
    pub page_cache_ttl: u64,
}

/// Remote collection names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub work_orders: String,
    pub equipment: String,
    pub clients: String,
    pub components: String,
    pub inspections: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_dir: None,
                database_file: "field-sync.db".to_string(),
                in_memory: false,
                connection_timeout: 30,
            },
            sync: SyncConfig {
                auto_sync: true,
                sync_interval: 30,
            },
            prefetch: PrefetchConfig {
                listing_route: "/inspections".to_string(),
                detail_route_prefix: "/inspections".to_string(),
                page_cache_ttl: 7 * 24 * 3600, // 1 week
            },
            collections: CollectionConfig::default(),
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            work_orders: "workOrders".to_string(),
            equipment: "equipment".to_string(),
            clients: "clients".to_string(),
            components: "components".to_string(),
            inspections: "inspections".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        match &self.data_dir {
            Some(dir) if !dir.trim().is_empty() => Some(PathBuf::from(dir)),
            _ => dirs::data_local_dir().map(|dir| dir.join("field-sync")),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("FIELD_SYNC_DATA_DIR") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.storage.data_dir = Some(trimmed.to_string());
            }
        }
        if let Some(v) = lookup("FIELD_SYNC_DATABASE_FILE") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.storage.database_file = trimmed.to_string();
            }
        }
        if let Some(v) = lookup("FIELD_SYNC_IN_MEMORY") {
            cfg.storage.in_memory = parse_bool(&v, cfg.storage.in_memory);
        }
        if let Some(v) = lookup("FIELD_SYNC_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Some(v) = lookup("FIELD_SYNC_INTERVAL_SECS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.sync.sync_interval = value.max(1);
        }
        if let Some(v) = lookup("FIELD_SYNC_PAGE_CACHE_TTL_SECS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.prefetch.page_cache_ttl = value;
        }
        if let Some(v) = lookup("FIELD_SYNC_LISTING_ROUTE") {
            cfg.prefetch.listing_route = v.trim().to_string();
        }
        if let Some(v) = lookup("FIELD_SYNC_DETAIL_ROUTE_PREFIX") {
            cfg.prefetch.detail_route_prefix = v.trim().trim_end_matches('/').to_string();
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.storage.in_memory && self.storage.database_file.trim().is_empty() {
            return Err("Storage database_file must not be empty".to_string());
        }
        if self.sync.auto_sync && self.sync.sync_interval == 0 {
            return Err("Sync sync_interval must be greater than 0".to_string());
        }
        if self.sync.sync_interval > MAX_SYNC_INTERVAL_SECS {
            return Err(format!(
                "Sync sync_interval must not exceed {MAX_SYNC_INTERVAL_SECS} seconds"
            ));
        }
        if !self.prefetch.listing_route.starts_with('/') {
            return Err("Prefetch listing_route must start with '/'".to_string());
        }
        if !self.prefetch.detail_route_prefix.starts_with('/') {
            return Err("Prefetch detail_route_prefix must start with '/'".to_string());
        }
        let collections = [
            &self.collections.work_orders,
            &self.collections.equipment,
            &self.collections.clients,
            &self.collections.components,
            &self.collections.inspections,
        ];
        if collections.iter().any(|name| name.trim().is_empty()) {
            return Err("Collection names must not be empty".to_string());
        }
        Ok(())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
