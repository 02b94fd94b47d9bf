//! Per-shard protocol client.
//!
//! Batch calls are single shots. Transactions are retried with exponential
//! backoff. The transaction id is drawn once per `begin` call and every
//! attempt resends the same request under it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::error::KvsError;
use crate::shard::ShardClient;
use crate::txn::{Transaction, TransactionSlots};

pub const MAX_ATTEMPTS: u32 = 3;
pub const BASE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay: BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt number `attempt` (0-based).
    #[inline]
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

pub struct ShardSession<C> {
    client: Arc<C>,
    retry: RetryPolicy,
}

impl<C> ShardSession<C>
where
    C: ShardClient + 'static,
{
    pub fn new(client: C) -> Self {
        Self::with_retry(client, RetryPolicy::default())
    }

    pub fn with_retry(client: C, retry: RetryPolicy) -> Self {
        Self {
            client: Arc::new(client),
            retry,
        }
    }

    #[inline]
    pub fn addr(&self) -> &str {
        self.client.addr()
    }

    pub async fn get_batch(&self, keys: Vec<String>) -> Result<Vec<String>, KvsError> {
        self.client.get_batch(keys).await
    }

    pub async fn put_batch(
        &self,
        data: HashMap<String, String>,
    ) -> Result<(), KvsError> {
        self.client.put_batch(data).await
    }

    /// Sends the get batch on its own task. The handle must be awaited
    /// before the cycle counts as done.
    pub fn get_batch_async(
        &self,
        keys: Vec<String>,
    ) -> JoinHandle<Result<Vec<String>, KvsError>> {
        let client = self.client.clone();
        tokio::spawn(async move { client.get_batch(keys).await })
    }

    pub fn put_batch_async(
        &self,
        data: HashMap<String, String>,
    ) -> JoinHandle<Result<(), KvsError>> {
        let client = self.client.clone();
        tokio::spawn(async move { client.put_batch(data).await })
    }

    /// Runs one transaction on this shard.
    ///
    /// Returns one value per slot; values of write slots carry no meaning.
    /// After `max_attempts` retryable failures the result is
    /// [`KvsError::RetriesExhausted`]. Terminal failures return at once.
    pub async fn begin(&self, ops: TransactionSlots) -> Result<Vec<String>, KvsError> {
        let transaction_id: i64 = rand::random();
        let mut attempt = 0;
        loop {
            let transaction = Transaction::new(transaction_id, ops.clone());
            let err = match self.client.process_transaction(transaction).await {
                Ok(values) => return Ok(values),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => err,
            };
            attempt += 1;
            if attempt >= self.retry.max_attempts {
                error!(
                    "transaction on '{}' failed after {} attempts: {}",
                    self.addr(),
                    attempt,
                    err
                );
                return Err(match err {
                    KvsError::Rpc(last) => KvsError::RetriesExhausted {
                        attempts: attempt,
                        last,
                    },
                    other => other,
                });
            }
            let delay = self.retry.backoff(attempt - 1);
            warn!(
                "transaction on '{}' failed (attempt {}/{}): {}, retrying in {:?}",
                self.addr(),
                attempt,
                self.retry.max_attempts,
                err,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Two-phase commit is not part of the protocol yet.
    pub fn commit(&self) {}

    pub fn abort(&self) {}
}
