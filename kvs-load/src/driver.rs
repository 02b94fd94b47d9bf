use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::KvsError;
use crate::session::{RetryPolicy, ShardSession};
use crate::shard::{ShardClient, ShardConnector};
use crate::txn::{Batch, ShardGroups, TRANSACTION_SIZE};
use crate::workload::Workload;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Fixed-size transactions routed to the owning shards
    #[default]
    Transaction,
    /// Flat get/put batches sent to the first host
    Batch,
}

#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    pub mode: DispatchMode,
    /// Operations drained per batch-mode cycle.
    pub batch_size: usize,
    /// Send the two batch calls concurrently.
    pub async_batch: bool,
    pub retry: RetryPolicy,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            mode: DispatchMode::Transaction,
            batch_size: crate::txn::DEFAULT_BATCH_SIZE,
            async_batch: false,
            retry: RetryPolicy::default(),
        }
    }
}

/// One client connection loop.
///
/// Owns a session per shard and its own workload. The stop token is looked
/// at between cycles only, so the cycle running when it fires is finished
/// and counted.
pub struct ConnectionDriver<C> {
    id: usize,
    sessions: Vec<ShardSession<C>>,
    workload: Workload,
    options: DriverOptions,
    completed: u64,
}

impl<C> ConnectionDriver<C>
where
    C: ShardClient + 'static,
{
    pub fn new(
        id: usize,
        sessions: Vec<ShardSession<C>>,
        workload: Workload,
        options: DriverOptions,
    ) -> Result<Self, KvsError> {
        if sessions.is_empty() {
            return Err(KvsError::InvalidConfig(
                "driver needs at least one shard".into(),
            ));
        }
        Ok(Self {
            id,
            sessions,
            workload,
            options,
            completed: 0,
        })
    }

    /// Dials every host, in host-list order.
    pub async fn connect<F>(
        id: usize,
        hosts: &[String],
        connector: &F,
        workload: Workload,
        options: DriverOptions,
    ) -> Result<Self, KvsError>
    where
        F: ShardConnector<Client = C>,
    {
        let mut sessions = Vec::with_capacity(hosts.len());
        for host in hosts {
            let client = connector.connect(host).await?;
            sessions.push(ShardSession::with_retry(client, options.retry));
        }
        Self::new(id, sessions, workload, options)
    }

    /// Operations pulled so far.
    #[inline]
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Loops until `stop` fires and returns the operation count.
    pub async fn run(mut self, stop: CancellationToken) -> Result<u64, KvsError> {
        info!(
            "driver {} start in {:?} mode on {} shard(s)",
            self.id,
            self.options.mode,
            self.sessions.len()
        );
        while !stop.is_cancelled() {
            self.run_cycle().await?;
        }
        info!("driver {} finished with {} ops", self.id, self.completed);
        Ok(self.completed)
    }

    pub async fn run_cycle(&mut self) -> Result<(), KvsError> {
        match self.options.mode {
            DispatchMode::Transaction => self.run_transaction_cycle().await,
            DispatchMode::Batch => self.run_batch_cycle().await,
        }
    }

    async fn run_transaction_cycle(&mut self) -> Result<(), KvsError> {
        let ops: [_; TRANSACTION_SIZE] =
            std::array::from_fn(|_| self.workload.next_op());
        self.completed += TRANSACTION_SIZE as u64;
        let groups = ShardGroups::route(ops, self.sessions.len());
        for (shard, slots) in groups.into_groups() {
            let session = &self.sessions[shard];
            debug!("driver {} send transaction to '{}'", self.id, session.addr());
            session.begin(slots).await?;
        }
        Ok(())
    }

    async fn run_batch_cycle(&mut self) -> Result<(), KvsError> {
        let batch_size = self.options.batch_size;
        let batch: Batch = self.workload.by_ref().take(batch_size).collect();
        let Batch { get_keys, put_data } = batch;
        self.completed += batch_size as u64;
        debug!(
            "driver {} send batch: {} gets, {} puts",
            self.id,
            get_keys.len(),
            put_data.len()
        );
        let session = &self.sessions[0];
        if self.options.async_batch {
            let get = (!get_keys.is_empty())
                .then(|| session.get_batch_async(get_keys));
            let put = (!put_data.is_empty())
                .then(|| session.put_batch_async(put_data));
            let (get, put) = tokio::join!(join_batch(get), join_batch(put));
            get?;
            put?;
        } else {
            if !get_keys.is_empty() {
                session.get_batch(get_keys).await?;
            }
            if !put_data.is_empty() {
                session.put_batch(put_data).await?;
            }
        }
        Ok(())
    }
}

/// Waits for a spawned batch call, if one was sent.
async fn join_batch<T>(
    handle: Option<JoinHandle<Result<T, KvsError>>>,
) -> Result<(), KvsError> {
    if let Some(handle) = handle {
        handle.await??;
    }
    Ok(())
}
