//! In-memory shard service speaking the kvs wire protocol. Used for local
//! runs and end-to-end tests of the load generator.

pub mod kv_api;
pub mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use kvs_pb::kv_service_server::KvServiceServer;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing::info;

use crate::error::KvsError;
use kv_api::KvShardService;
use store::HashMapStore;

/// A bound, not yet serving, shard.
pub struct ShardServer {
    listener: TcpListener,
    store: Arc<HashMapStore>,
}

impl ShardServer {
    /// Binds `addr`. Port 0 picks a free port; see [`ShardServer::local_addr`].
    pub async fn bind(addr: SocketAddr) -> Result<Self, KvsError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            store: Arc::new(HashMapStore::new()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, KvsError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn store(&self) -> Arc<HashMapStore> {
        self.store.clone()
    }

    /// Serves until `shutdown` is cancelled.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<(), KvsError> {
        let local = self.local_addr()?;
        let reflection = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(kvs_pb::FILE_DESCRIPTOR_SET)
            .build_v1()
            .map_err(|e| KvsError::InvalidConfig(e.to_string()))?;
        info!("start shard on {}", local);
        Server::builder()
            .add_service(reflection)
            .add_service(KvServiceServer::new(KvShardService::new(self.store)))
            .serve_with_incoming_shutdown(
                TcpListenerStream::new(self.listener),
                shutdown.cancelled_owned(),
            )
            .await?;
        info!("shard on {} stopped", local);
        Ok(())
    }
}
