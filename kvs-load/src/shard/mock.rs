use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tonic::{Code, Status};

use super::{ShardClient, ShardConnector};
use crate::error::KvsError;
use crate::txn::{Transaction, TransactionSlots};

#[derive(Default)]
struct MockState {
    failures_left: AtomicU64,
    transactions: AtomicU64,
    batches: AtomicU64,
    batches_done: AtomicU64,
    dials: AtomicU64,
    transaction_ids: Mutex<Vec<i64>>,
    /// Address and slots of every transaction call, in arrival order.
    sent: Mutex<Vec<(String, TransactionSlots)>>,
    store: Mutex<HashMap<String, String>>,
}

/// In-process shard. Clones share state, so a test can keep one handle and
/// give another to the code under test.
#[derive(Clone)]
pub struct MockShard {
    addr: String,
    fail_code: Code,
    state: Arc<MockState>,
}

impl MockShard {
    pub fn new(addr: &str) -> Self {
        Self {
            addr: addr.into(),
            fail_code: Code::Unavailable,
            state: Arc::default(),
        }
    }

    /// The next `n` calls of any kind fail.
    pub fn fail_first(self, n: u64) -> Self {
        self.state.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn fail_with(mut self, status: Status) -> Self {
        self.fail_code = status.code();
        self
    }

    pub fn transactions(&self) -> u64 {
        self.state.transactions.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> u64 {
        self.state.batches.load(Ordering::SeqCst)
    }

    /// Batch calls that ran to completion.
    pub fn batches_done(&self) -> u64 {
        self.state.batches_done.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<(String, TransactionSlots)> {
        self.state.sent.lock().unwrap().clone()
    }

    pub fn dials(&self) -> u64 {
        self.state.dials.load(Ordering::SeqCst)
    }

    pub fn transaction_ids(&self) -> Vec<i64> {
        self.state.transaction_ids.lock().unwrap().clone()
    }

    /// Yields once like a real call would, then applies the failure budget.
    async fn check_failure(&self) -> Result<(), KvsError> {
        tokio::task::yield_now().await;
        let injected = self
            .state
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok();
        if injected {
            Err(KvsError::Rpc(Status::new(self.fail_code, "injected failure")))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl ShardClient for MockShard {
    fn addr(&self) -> &str {
        &self.addr
    }

    async fn get_batch(&self, keys: Vec<String>) -> Result<Vec<String>, KvsError> {
        self.state.batches.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;
        tokio::task::yield_now().await;
        let values = {
            let store = self.state.store.lock().unwrap();
            keys.iter()
                .map(|k| store.get(k).cloned().unwrap_or_default())
                .collect()
        };
        self.state.batches_done.fetch_add(1, Ordering::SeqCst);
        Ok(values)
    }

    async fn put_batch(
        &self,
        data: HashMap<String, String>,
    ) -> Result<(), KvsError> {
        self.state.batches.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;
        tokio::task::yield_now().await;
        self.state.store.lock().unwrap().extend(data);
        self.state.batches_done.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn process_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<Vec<String>, KvsError> {
        self.state.transactions.fetch_add(1, Ordering::SeqCst);
        self.state
            .transaction_ids
            .lock()
            .unwrap()
            .push(transaction.transaction_id);
        self.state
            .sent
            .lock()
            .unwrap()
            .push((self.addr.clone(), transaction.data.clone()));
        self.check_failure().await?;
        let mut store = self.state.store.lock().unwrap();
        Ok(transaction
            .data
            .into_iter()
            .map(|op| {
                if op.is_padding() {
                    String::new()
                } else if op.is_read {
                    store.get(&op.key).cloned().unwrap_or_default()
                } else {
                    store.insert(op.key, op.value);
                    String::new()
                }
            })
            .collect())
    }
}

/// Hands out clones of one [`MockShard`] for every address.
pub struct MockConnector {
    pub shard: MockShard,
    pub refuse: bool,
}

impl MockConnector {
    pub fn new(shard: MockShard) -> Self {
        Self {
            shard,
            refuse: false,
        }
    }
}

#[async_trait::async_trait]
impl ShardConnector for MockConnector {
    type Client = MockShard;

    async fn connect(&self, addr: &str) -> Result<MockShard, KvsError> {
        self.shard.state.dials.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(KvsError::InvalidConfig(format!("refused '{addr}'")));
        }
        let mut shard = self.shard.clone();
        shard.addr = addr.into();
        Ok(shard)
    }
}
