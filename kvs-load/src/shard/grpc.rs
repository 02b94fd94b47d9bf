use std::collections::HashMap;
use std::str::FromStr;

use kvs_pb::kv_service_client::KvServiceClient;
use kvs_pb::{GetBatchRequest, PutBatchRequest};
use tonic::transport::Channel;
use tracing::debug;

use super::{ShardClient, ShardConnector};
use crate::error::KvsError;
use crate::txn::Transaction;

#[derive(Clone, Debug)]
pub struct GrpcShardClient {
    addr: String,
    client: KvServiceClient<Channel>,
}

#[async_trait::async_trait]
impl ShardClient for GrpcShardClient {
    fn addr(&self) -> &str {
        &self.addr
    }

    async fn get_batch(&self, keys: Vec<String>) -> Result<Vec<String>, KvsError> {
        let mut client = self.client.clone();
        let resp = client.get_batch(GetBatchRequest { keys }).await?;
        Ok(resp.into_inner().values)
    }

    async fn put_batch(
        &self,
        data: HashMap<String, String>,
    ) -> Result<(), KvsError> {
        let mut client = self.client.clone();
        client.put_batch(PutBatchRequest { data }).await?;
        Ok(())
    }

    async fn process_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<Vec<String>, KvsError> {
        let mut client = self.client.clone();
        let resp = client
            .process_transaction(transaction.into_request())
            .await?;
        Ok(resp.into_inner().values)
    }
}

/// Opens one HTTP/2 channel per shard address.
#[derive(Clone, Debug, Default)]
pub struct GrpcConnector;

#[async_trait::async_trait]
impl ShardConnector for GrpcConnector {
    type Client = GrpcShardClient;

    async fn connect(&self, addr: &str) -> Result<GrpcShardClient, KvsError> {
        let uri = http::Uri::from_str(&normalize_addr(addr))?;
        let channel = Channel::builder(uri)
            .connect()
            .await
            .map_err(|source| KvsError::Connect {
                addr: addr.into(),
                source,
            })?;
        debug!("connected to shard '{}'", addr);
        Ok(GrpcShardClient {
            addr: addr.into(),
            client: KvServiceClient::new(channel),
        })
    }
}

/// Host lists are given as `host:port`; tonic wants a full URI.
fn normalize_addr(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    }
}
