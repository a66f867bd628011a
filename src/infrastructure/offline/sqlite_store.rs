use super::mappers::{collection_status_from_row, entity_from_row, pending_inspection_from_row};
use super::rows::{CacheMetadataRow, PendingInspectionRow, ReferenceRow};
use crate::application::ports::local_store::LocalStore;
use crate::domain::entities::{
    Client, Equipment, EquipmentComponent, InspectionDraft, PendingInspection,
    ReferenceCacheStatus, ReferenceSnapshot, WorkOrder,
};
use crate::domain::value_objects::LocalId;
use crate::infrastructure::database::{ConnectionPool, StoreLocation};
use crate::shared::config::StorageConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::time::Duration;
use tokio::sync::RwLock;

pub const WORK_ORDERS_CACHE_KEY: &str = "work_orders";
pub const EQUIPMENT_CACHE_KEY: &str = "equipment";
pub const CLIENTS_CACHE_KEY: &str = "clients";
pub const COMPONENTS_CACHE_KEY: &str = "components";

const REFERENCE_TABLES: [&str; 4] = [
    "cached_work_orders",
    "cached_equipment",
    "cached_clients",
    "cached_components",
];

pub struct SqliteLocalStore {
    location: StoreLocation,
    connection_timeout: Duration,
    pool: RwLock<Option<ConnectionPool>>,
}

impl SqliteLocalStore {
    pub fn new(location: StoreLocation) -> Self {
        Self {
            location,
            connection_timeout: Duration::from_secs(30),
            pool: RwLock::new(None),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            connection_timeout: Duration::from_secs(config.connection_timeout.max(1)),
            ..Self::new(StoreLocation::from_config(config))
        }
    }

    pub fn in_memory() -> Self {
        Self::new(StoreLocation::Memory)
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    pub async fn is_open(&self) -> bool {
        self.pool.read().await.is_some()
    }

    async fn pool(&self) -> Result<SqlitePool, AppError> {
        if let Some(pool) = self.pool.read().await.as_ref() {
            return Ok(pool.get_pool().clone());
        }
        self.open().await?;
        self.pool
            .read()
            .await
            .as_ref()
            .map(|pool| pool.get_pool().clone())
            .ok_or_else(|| {
                AppError::StorageOpenFailed("store was closed while it was opening".to_string())
            })
    }

    async fn fetch_reference_rows(
        &self,
        sql: &'static str,
        key: Option<&str>,
    ) -> Result<Vec<ReferenceRow>, AppError> {
        let pool = self.pool().await?;
        let mut query = sqlx::query_as::<_, ReferenceRow>(sql);
        if let Some(key) = key {
            query = query.bind(key.to_string());
        }
        Ok(query.fetch_all(&pool).await?)
    }

    async fn write_snapshot(
        tx: &mut Transaction<'_, Sqlite>,
        snapshot: &ReferenceSnapshot,
    ) -> Result<(), AppError> {
        for order in &snapshot.work_orders {
            let (equipment_id, client_id) = order.links().ok_or_else(|| {
                AppError::ValidationError(format!(
                    "work order {} is missing equipment or client",
                    order.id
                ))
            })?;
            sqlx::query(
                r#"
                INSERT INTO cached_work_orders (id, equipment_id, client_id, status, data)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&order.id)
            .bind(equipment_id)
            .bind(client_id)
            .bind(order.status.as_str())
            .bind(serde_json::to_string(order)?)
            .execute(&mut **tx)
            .await?;
        }

        for equipment in &snapshot.equipment {
            sqlx::query(
                r#"
                INSERT INTO cached_equipment (id, client_id, data)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(&equipment.id)
            .bind(&equipment.client_id)
            .bind(serde_json::to_string(equipment)?)
            .execute(&mut **tx)
            .await?;
        }

        for client in &snapshot.clients {
            sqlx::query("INSERT INTO cached_clients (id, data) VALUES (?1, ?2)")
                .bind(&client.id)
                .bind(serde_json::to_string(client)?)
                .execute(&mut **tx)
                .await?;
        }

        for (position, component) in snapshot.components.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO cached_components (equipment_id, id, position, data)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(&component.equipment_id)
            .bind(&component.id)
            .bind(position as i64)
            .bind(serde_json::to_string(component)?)
            .execute(&mut **tx)
            .await?;
        }

        let now = Utc::now().timestamp_millis();
        let counts = [
            (WORK_ORDERS_CACHE_KEY, snapshot.work_orders.len()),
            (EQUIPMENT_CACHE_KEY, snapshot.equipment.len()),
            (CLIENTS_CACHE_KEY, snapshot.clients.len()),
            (COMPONENTS_CACHE_KEY, snapshot.components.len()),
        ];
        for (cache_key, count) in counts {
            sqlx::query(
                r#"
                INSERT INTO cache_metadata (cache_key, item_count, data_version, last_synced_at)
                VALUES (?1, ?2, 1, ?3)
                ON CONFLICT(cache_key) DO UPDATE SET
                    item_count = excluded.item_count,
                    data_version = data_version + 1,
                    last_synced_at = excluded.last_synced_at
                "#,
            )
            .bind(cache_key)
            .bind(count as i64)
            .bind(now)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn delete_reference_tables(tx: &mut Transaction<'_, Sqlite>) -> Result<(), AppError> {
        for table in REFERENCE_TABLES {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn open(&self) -> Result<(), AppError> {
        let mut guard = self.pool.write().await;
        if guard.is_some() {
            return Ok(());
        }

        let pool = ConnectionPool::open(&self.location, self.connection_timeout)
            .await
            .inspect_err(|err| {
                tracing::error!(
                    target: "offline::store",
                    location = ?self.location,
                    error = %err,
                    "failed to open local store"
                );
            })?;
        *guard = Some(pool);
        tracing::debug!(target: "offline::store", location = ?self.location, "local store opened");
        Ok(())
    }

    async fn close(&self) {
        if let Some(pool) = self.pool.write().await.take() {
            pool.close().await;
            tracing::debug!(target: "offline::store", "local store closed");
        }
    }

    async fn insert_pending(&self, draft: &InspectionDraft) -> Result<LocalId, AppError> {
        let pool = self.pool().await?;
        let payload = serde_json::to_string(draft)?;
        let queued_at = Utc::now().timestamp_millis();

        let result = sqlx::query(
            r#"
            INSERT INTO pending_inspections (
                work_order_id, equipment_id, inspector_id, payload, queued_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&draft.work_order_id)
        .bind(&draft.equipment_id)
        .bind(&draft.inspector_id)
        .bind(&payload)
        .bind(queued_at)
        .execute(&pool)
        .await?;

        LocalId::new(result.last_insert_rowid()).map_err(AppError::PersistenceError)
    }

    async fn scan_pending(&self) -> Result<Vec<PendingInspection>, AppError> {
        let pool = self.pool().await?;
        let rows = sqlx::query_as::<_, PendingInspectionRow>(
            r#"
            SELECT local_id, work_order_id, equipment_id, inspector_id, payload, queued_at
            FROM pending_inspections
            ORDER BY local_id ASC
            "#,
        )
        .fetch_all(&pool)
        .await?;

        rows.into_iter().map(pending_inspection_from_row).collect()
    }

    async fn delete_pending(&self, local_id: LocalId) -> Result<(), AppError> {
        let pool = self.pool().await?;
        sqlx::query("DELETE FROM pending_inspections WHERE local_id = ?1")
            .bind(local_id.value())
            .execute(&pool)
            .await?;
        Ok(())
    }

    async fn count_pending(&self) -> Result<u64, AppError> {
        let pool = self.pool().await?;
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_inspections")
            .fetch_one(&pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn replace_reference_data(&self, snapshot: &ReferenceSnapshot) -> Result<(), AppError> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;

        Self::delete_reference_tables(&mut tx).await?;
        // An error here drops `tx`, which rolls every mirror back to its previous state.
        Self::write_snapshot(&mut tx, snapshot).await?;

        tx.commit().await?;
        tracing::info!(
            target: "offline::store",
            work_orders = snapshot.work_orders.len(),
            equipment = snapshot.equipment.len(),
            clients = snapshot.clients.len(),
            components = snapshot.components.len(),
            "reference mirrors replaced"
        );
        Ok(())
    }

    async fn clear_reference_data(&self) -> Result<(), AppError> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;
        Self::delete_reference_tables(&mut tx).await?;
        sqlx::query("DELETE FROM cache_metadata")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn cached_work_orders(&self) -> Result<Vec<WorkOrder>, AppError> {
        self.fetch_reference_rows("SELECT id, data FROM cached_work_orders ORDER BY id", None)
            .await?
            .into_iter()
            .map(entity_from_row)
            .collect()
    }

    async fn cached_equipment(&self, id: &str) -> Result<Option<Equipment>, AppError> {
        self.fetch_reference_rows(
            "SELECT id, data FROM cached_equipment WHERE id = ?1",
            Some(id),
        )
        .await?
        .into_iter()
        .next()
        .map(entity_from_row)
        .transpose()
    }

    async fn cached_client(&self, id: &str) -> Result<Option<Client>, AppError> {
        self.fetch_reference_rows("SELECT id, data FROM cached_clients WHERE id = ?1", Some(id))
            .await?
            .into_iter()
            .next()
            .map(entity_from_row)
            .transpose()
    }

    async fn cached_components(
        &self,
        equipment_id: &str,
    ) -> Result<Vec<EquipmentComponent>, AppError> {
        self.fetch_reference_rows(
            r#"
            SELECT id, data FROM cached_components
            WHERE equipment_id = ?1
            ORDER BY position ASC
            "#,
            Some(equipment_id),
        )
        .await?
        .into_iter()
        .map(entity_from_row)
        .collect()
    }

    async fn reference_cache_status(&self) -> Result<ReferenceCacheStatus, AppError> {
        let pool = self.pool().await?;
        let rows = sqlx::query_as::<_, CacheMetadataRow>(
            r#"
            SELECT cache_key, item_count, data_version, last_synced_at
            FROM cache_metadata
            ORDER BY cache_key
            "#,
        )
        .fetch_all(&pool)
        .await?;

        Ok(ReferenceCacheStatus {
            collections: rows.into_iter().map(collection_status_from_row).collect(),
        })
    }
}
