use scc::HashMap;
use tracing::info;

use crate::txn::Operation;

/// Concurrent in-memory map holding one shard's keys.
#[derive(Default)]
pub struct HashMapStore {
    map: HashMap<String, String>,
}

impl HashMapStore {
    pub fn new() -> Self {
        info!("create in-memory shard store");
        Self::default()
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<String> {
        self.map.read(key, |_, v| v.clone())
    }

    #[inline]
    pub fn set(&self, key: String, value: String) {
        self.map.upsert(key, value);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Applies one transaction slot. Reads return the stored value or `""`;
    /// writes and padding return `""`.
    pub fn apply(&self, op: Operation) -> String {
        if op.is_padding() {
            String::new()
        } else if op.is_read {
            self.get(&op.key).unwrap_or_default()
        } else {
            self.set(op.key, op.value);
            String::new()
        }
    }
}
