use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PrefetchReport {
    pub work_orders: usize,
    pub skipped_work_orders: usize,
    pub equipment: usize,
    pub clients: usize,
    pub components: usize,
    pub failed_fetches: usize,
    pub total_routes: usize,
    pub failed_routes: usize,
}

impl PrefetchReport {
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when some routes could not be cached; the UI should warn that
    /// offline readiness is only partial.
    pub fn is_partial(&self) -> bool {
        self.failed_routes > 0
    }

    pub fn cached_routes(&self) -> usize {
        self.total_routes - self.failed_routes
    }
}
