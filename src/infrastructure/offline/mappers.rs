use super::rows::{CacheMetadataRow, PendingInspectionRow, ReferenceRow};
use crate::domain::entities::{CollectionStatus, InspectionDraft, PendingInspection};
use crate::domain::value_objects::LocalId;
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

pub(super) fn pending_inspection_from_row(
    row: PendingInspectionRow,
) -> Result<PendingInspection, AppError> {
    let local_id = LocalId::new(row.local_id).map_err(AppError::PersistenceError)?;
    let inspection: InspectionDraft = serde_json::from_str(&row.payload).map_err(|err| {
        AppError::PersistenceError(format!(
            "pending inspection {} has an unreadable payload: {err}",
            row.local_id
        ))
    })?;
    let queued_at = DateTime::from_timestamp_millis(row.queued_at).ok_or_else(|| {
        AppError::PersistenceError(format!(
            "pending inspection {} has an invalid queued_at {}",
            row.local_id, row.queued_at
        ))
    })?;
    Ok(PendingInspection::new(local_id, inspection, queued_at))
}

pub(super) fn entity_from_row<T: DeserializeOwned>(row: ReferenceRow) -> Result<T, AppError> {
    serde_json::from_str(&row.data).map_err(|err| {
        AppError::PersistenceError(format!("cached record {} is unreadable: {err}", row.id))
    })
}

pub(super) fn collection_status_from_row(row: CacheMetadataRow) -> CollectionStatus {
    CollectionStatus {
        collection: row.cache_key.clone(),
        item_count: row.item_count.max(0) as u64,
        data_version: row.data_version.clamp(0, i64::from(u32::MAX)) as u32,
        last_synced_at: row
            .last_synced_at
            .and_then(|millis| last_synced_from_millis(&row.cache_key, millis)),
    }
}

fn last_synced_from_millis(cache_key: &str, millis: i64) -> Option<DateTime<Utc>> {
    let parsed = DateTime::from_timestamp_millis(millis);
    if parsed.is_none() {
        tracing::warn!(
            target: "offline::store",
            cache_key,
            millis,
            "ignoring out-of-range last_synced_at"
        );
    }
    parsed
}
