use crate::domain::value_objects::WorkOrderStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Remote work order. Only the linkage and status are interpreted; every
/// other remote field is carried through untouched in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: String,
    #[serde(default)]
    pub equipment_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub status: WorkOrderStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkOrder {
    pub fn new(
        id: impl Into<String>,
        equipment_id: Option<&str>,
        client_id: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            equipment_id: equipment_id.map(str::to_string),
            client_id: client_id.map(str::to_string),
            status: WorkOrderStatus::Pendente,
            extra: Map::new(),
        }
    }

    /// Returns `(equipment_id, client_id)` when both links are present.
    pub fn links(&self) -> Option<(&str, &str)> {
        let equipment = self.equipment_id.as_deref().map(str::trim)?;
        let client = self.client_id.as_deref().map(str::trim)?;
        if equipment.is_empty() || client.is_empty() {
            return None;
        }
        Some((equipment, client))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentComponent {
    pub id: String,
    #[serde(default)]
    pub equipment_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Everything one prefetch pass writes into the reference mirrors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceSnapshot {
    pub work_orders: Vec<WorkOrder>,
    pub equipment: Vec<Equipment>,
    pub clients: Vec<Client>,
    pub components: Vec<EquipmentComponent>,
}

impl ReferenceSnapshot {
    pub fn is_empty(&self) -> bool {
        self.work_orders.is_empty()
            && self.equipment.is_empty()
            && self.clients.is_empty()
            && self.components.is_empty()
    }
}
