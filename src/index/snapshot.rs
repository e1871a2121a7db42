use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::index::row::IndexRow;

/// Snapshot version for compatibility checking
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized state of a posting list index
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub version: u32,
    pub rows: BTreeMap<String, IndexRow>,
    /// Row creation counter, which may differ from `rows.len()`
    pub length: u64,
}

impl IndexSnapshot {
    /// Create a new snapshot with the current version
    pub fn new(rows: BTreeMap<String, IndexRow>, length: u64) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            rows,
            length,
        }
    }

    /// Serialize snapshot to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize snapshot from bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }

    /// Check if this snapshot version is compatible
    pub fn is_compatible(&self) -> bool {
        self.version <= SNAPSHOT_VERSION
    }

    pub fn legacy_rows(&self) -> usize {
        self.rows.values().filter(|row| row.is_legacy()).count()
    }
}
