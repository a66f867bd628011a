use crate::domain::value_objects::{Answer, LocalId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status written on the remote inspection document when it leaves the queue.
pub const INSPECTION_STATUS_FINALIZED: &str = "Finalizado";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InspectionItem {
    pub question_id: String,
    pub question_text: String,
    pub answer: Answer,
    #[serde(default)]
    pub observation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photo_urls: Vec<String>,
}

impl InspectionItem {
    pub fn new(
        question_id: impl Into<String>,
        question_text: impl Into<String>,
        answer: Answer,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            question_text: question_text.into(),
            answer,
            observation: String::new(),
            photo_urls: Vec::new(),
        }
    }
}

/// Finalized inspection that has not been handed to the pending queue yet.
///
/// Carries no local or remote id and no status; those only exist once the
/// record is queued or accepted by the remote store respectively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InspectionDraft {
    pub work_order_id: String,
    pub equipment_id: String,
    pub inspector_id: String,
    pub inspector_name: String,
    /// ISO-8601 date string as entered on the device.
    pub date: String,
    pub items: Vec<InspectionItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_url: Option<String>,
}

impl InspectionDraft {
    pub fn validate(&self) -> Result<(), String> {
        if self.work_order_id.trim().is_empty() {
            return Err("Inspection must reference a work order (workOrderId is empty)".to_string());
        }
        if self.equipment_id.trim().is_empty() {
            return Err("Inspection must reference equipment (equipmentId is empty)".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingInspection {
    pub local_id: LocalId,
    pub inspection: InspectionDraft,
    pub queued_at: DateTime<Utc>,
}

impl PendingInspection {
    pub fn new(local_id: LocalId, inspection: InspectionDraft, queued_at: DateTime<Utc>) -> Self {
        Self {
            local_id,
            inspection,
            queued_at,
        }
    }

    pub fn work_order_id(&self) -> &str {
        &self.inspection.work_order_id
    }
}
