use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WorkOrderStatus {
    #[default]
    #[serde(rename = "Pendente")]
    Pendente,
    #[serde(rename = "Em Andamento")]
    EmAndamento,
    #[serde(rename = "Concluída")]
    Concluida,
    #[serde(rename = "Cancelada")]
    Cancelada,
}

impl WorkOrderStatus {
    pub const ALL: [WorkOrderStatus; 4] = [
        WorkOrderStatus::Pendente,
        WorkOrderStatus::EmAndamento,
        WorkOrderStatus::Concluida,
        WorkOrderStatus::Cancelada,
    ];

    /// States from which a synced inspection may close the work order.
    pub fn closable_by_inspection() -> impl Iterator<Item = WorkOrderStatus> {
        Self::ALL.into_iter().filter(|status| {
            status.is_open_for_inspection() && status.can_transition_to(WorkOrderStatus::Concluida)
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Pendente => "Pendente",
            WorkOrderStatus::EmAndamento => "Em Andamento",
            WorkOrderStatus::Concluida => "Concluída",
            WorkOrderStatus::Cancelada => "Cancelada",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pendente" => Some(WorkOrderStatus::Pendente),
            "Em Andamento" => Some(WorkOrderStatus::EmAndamento),
            "Concluída" => Some(WorkOrderStatus::Concluida),
            "Cancelada" => Some(WorkOrderStatus::Cancelada),
            _ => None,
        }
    }

    /// `Pendente → Em Andamento → Concluída`, `Cancelada` from either open state.
    pub fn can_transition_to(&self, next: WorkOrderStatus) -> bool {
        use WorkOrderStatus::*;
        matches!(
            (self, next),
            (Pendente, EmAndamento)
                | (EmAndamento, Concluida)
                | (Pendente, Concluida)
                | (Pendente, Cancelada)
                | (EmAndamento, Cancelada)
        )
    }

    /// Only pending work orders accept offline inspections.
    pub fn is_open_for_inspection(&self) -> bool {
        matches!(self, WorkOrderStatus::Pendente)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Concluida | WorkOrderStatus::Cancelada)
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
