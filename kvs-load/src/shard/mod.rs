mod grpc;
#[cfg(test)]
pub(crate) mod mock;

use std::collections::HashMap;

pub use grpc::GrpcConnector;
pub use grpc::GrpcShardClient;

use crate::error::KvsError;
use crate::txn::Transaction;

/// Index into the configured host list.
pub type ShardId = usize;

/// Remote calls a shard answers. One value holds one connection.
#[async_trait::async_trait]
pub trait ShardClient: Send + Sync {
    fn addr(&self) -> &str;

    /// Values aligned with `keys`.
    async fn get_batch(&self, keys: Vec<String>) -> Result<Vec<String>, KvsError>;

    async fn put_batch(
        &self,
        data: HashMap<String, String>,
    ) -> Result<(), KvsError>;

    /// One value per transaction slot.
    async fn process_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<Vec<String>, KvsError>;
}

/// Dials shards. Dialing is eager: an unreachable shard fails here, not on
/// the first call.
#[async_trait::async_trait]
pub trait ShardConnector: Send + Sync {
    type Client: ShardClient + 'static;

    async fn connect(&self, addr: &str) -> Result<Self::Client, KvsError>;
}
