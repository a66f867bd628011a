use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SyncResult {
    pub synced: u32,
    pub failed: u32,
}

impl SyncResult {
    pub fn new(synced: u32, failed: u32) -> Self {
        Self { synced, failed }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn attempted(&self) -> u32 {
        self.synced + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
