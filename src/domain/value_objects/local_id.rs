use serde::{Deserialize, Serialize};
use std::fmt;

/// Key assigned by the local store when an inspection enters the pending queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocalId(i64);

impl LocalId {
    pub fn new(value: i64) -> Result<Self, String> {
        if value <= 0 {
            return Err("Local id must be positive".to_string());
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<LocalId> for i64 {
    fn from(id: LocalId) -> Self {
        id.0
    }
}
