#![allow(dead_code)]

pub mod mocks;

use field_sync::AppConfig;
use field_sync::domain::entities::{InspectionDraft, InspectionItem, WorkOrder};
use field_sync::domain::value_objects::Answer;
use field_sync::infrastructure::remote::InMemoryRemoteStore;
use field_sync::infrastructure::remote::memory_store::subcollection_path;
use serde_json::json;

pub fn memory_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.in_memory = true;
    config.sync.sync_interval = 3600;
    config
}

pub fn sample_draft(work_order_id: &str, equipment_id: &str) -> InspectionDraft {
    InspectionDraft {
        work_order_id: work_order_id.to_string(),
        equipment_id: equipment_id.to_string(),
        inspector_id: "INS-1".to_string(),
        inspector_name: "Ana Souza".to_string(),
        date: "2025-06-01T09:30:00Z".to_string(),
        items: vec![InspectionItem::new(
            "Q1",
            "Extinguisher seal intact?",
            Answer::Conforme,
        )],
        signature_url: None,
    }
}

pub fn work_order(id: &str, equipment_id: &str, client_id: &str) -> WorkOrder {
    WorkOrder::new(id, Some(equipment_id), Some(client_id))
}

/// Seeds one client, the given equipment (with `components` children each) and
/// a `Pendente` work order per `(work_order, equipment)` pair.
pub async fn seed_remote(
    remote: &InMemoryRemoteStore,
    client_id: &str,
    orders: &[(&str, &str)],
    components: usize,
) {
    remote
        .insert_document("clients", client_id, json!({"name": format!("Client {client_id}")}))
        .await;
    for (order_id, equipment_id) in orders {
        remote
            .insert_document(
                "equipment",
                equipment_id,
                json!({"clientId": client_id, "model": "PQS-6"}),
            )
            .await;
        remote
            .insert_document(
                "workOrders",
                order_id,
                json!({
                    "equipmentId": equipment_id,
                    "clientId": client_id,
                    "status": "Pendente"
                }),
            )
            .await;
        let path = subcollection_path("equipment", equipment_id, "components");
        for index in 0..components {
            remote
                .insert_document(&path, &format!("C-{index}"), json!({"position": index}))
                .await;
        }
    }
}
