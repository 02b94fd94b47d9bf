//! Units of work moved to the shards: single operations, fixed-size
//! transactions and flat batches.

use std::collections::HashMap;

use crate::partition::shard_of;

/// Slots per transaction.
pub const TRANSACTION_SIZE: usize = 3;

/// Operations drained per cycle in batch mode unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Operation {
    pub key: String,
    /// Empty for reads.
    pub value: String,
    pub is_read: bool,
}

impl Operation {
    #[inline]
    pub fn read(key: String) -> Self {
        Operation {
            key,
            value: String::new(),
            is_read: true,
        }
    }

    #[inline]
    pub fn write(key: String, value: String) -> Self {
        Operation {
            key,
            value,
            is_read: false,
        }
    }

    /// Unused transaction slot.
    #[inline]
    pub fn is_padding(&self) -> bool {
        self.key.is_empty()
    }
}

impl From<Operation> for kvs_pb::Operation {
    #[inline]
    fn from(op: Operation) -> Self {
        kvs_pb::Operation {
            key: op.key,
            value: op.value,
            is_read: op.is_read,
        }
    }
}

impl From<kvs_pb::Operation> for Operation {
    #[inline]
    fn from(op: kvs_pb::Operation) -> Self {
        Operation {
            key: op.key,
            value: op.value,
            is_read: op.is_read,
        }
    }
}

pub type TransactionSlots = [Operation; TRANSACTION_SIZE];

/// Transaction bound for one shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub transaction_id: i64,
    pub data: TransactionSlots,
}

impl Transaction {
    pub fn new(transaction_id: i64, data: TransactionSlots) -> Self {
        Self {
            transaction_id,
            data,
        }
    }

    pub fn into_request(self) -> kvs_pb::TransactionRequest {
        kvs_pb::TransactionRequest {
            transaction_id: self.transaction_id,
            data: self.data.into_iter().map(Into::into).collect(),
        }
    }
}

/// Per-shard slot arrays for one transaction drain cycle.
///
/// Operation `j` of the cycle is written to slot `j` of the array belonging
/// to its shard, so every slot is written at most once per cycle. Slots that
/// no operation lands on stay as padding.
#[derive(Debug)]
pub struct ShardGroups {
    slots: Vec<TransactionSlots>,
    routed: Vec<usize>,
}

impl ShardGroups {
    pub fn new(shard_count: usize) -> Self {
        Self {
            slots: vec![Default::default(); shard_count],
            routed: vec![0; shard_count],
        }
    }

    /// Routes `ops` (exactly one transaction worth) to their shards.
    pub fn route(ops: [Operation; TRANSACTION_SIZE], shard_count: usize) -> Self {
        let mut groups = Self::new(shard_count);
        for (slot, op) in ops.into_iter().enumerate() {
            let shard = shard_of(&op.key, shard_count);
            groups.place(shard, slot, op);
        }
        groups
    }

    #[inline]
    pub fn place(&mut self, shard: usize, slot: usize, op: Operation) {
        self.slots[shard][slot] = op;
        self.routed[shard] += 1;
    }

    /// Number of operations routed to `shard` in this cycle.
    #[inline]
    pub fn routed(&self, shard: usize) -> usize {
        self.routed[shard]
    }

    /// Non-empty groups in shard-index order.
    pub fn into_groups(self) -> impl Iterator<Item = (usize, TransactionSlots)> {
        self.slots
            .into_iter()
            .zip(self.routed)
            .enumerate()
            .filter(|(_, (_, routed))| *routed > 0)
            .map(|(shard, (slots, _))| (shard, slots))
    }
}

/// Reads and writes of one batch-mode drain cycle.
#[derive(Debug, Default)]
pub struct Batch {
    pub get_keys: Vec<String>,
    pub put_data: HashMap<String, String>,
}

impl Batch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            get_keys: Vec::with_capacity(capacity),
            put_data: HashMap::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, op: Operation) {
        if op.is_read {
            self.get_keys.push(op.key);
        } else {
            self.put_data.insert(op.key, op.value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.get_keys.is_empty() && self.put_data.is_empty()
    }
}

impl FromIterator<Operation> for Batch {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut batch = Batch::with_capacity(iter.size_hint().0);
        for op in iter {
            batch.push(op);
        }
        batch
    }
}
