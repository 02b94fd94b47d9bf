use std::sync::Arc;

use kvs_pb::kv_service_server::KvService;
use kvs_pb::{
    GetBatchRequest, GetBatchResponse, PutBatchRequest, PutBatchResponse,
    TransactionRequest, TransactionResponse,
};
use tonic::{Request, Response, Status};
use tracing::trace;

use super::store::HashMapStore;
use crate::txn::{Operation, TRANSACTION_SIZE};

pub struct KvShardService {
    store: Arc<HashMapStore>,
}

impl KvShardService {
    pub fn new(store: Arc<HashMapStore>) -> KvShardService {
        KvShardService { store }
    }
}

#[tonic::async_trait]
impl KvService for KvShardService {
    async fn get_batch(
        &self,
        request: Request<GetBatchRequest>,
    ) -> Result<Response<GetBatchResponse>, Status> {
        let keys = request.into_inner().keys;
        let values = keys
            .iter()
            .map(|k| self.store.get(k).unwrap_or_default())
            .collect();
        Ok(Response::new(GetBatchResponse { keys, values }))
    }

    async fn put_batch(
        &self,
        request: Request<PutBatchRequest>,
    ) -> Result<Response<PutBatchResponse>, Status> {
        for (key, value) in request.into_inner().data {
            self.store.set(key, value);
        }
        Ok(Response::new(PutBatchResponse::default()))
    }

    async fn process_transaction(
        &self,
        request: Request<TransactionRequest>,
    ) -> Result<Response<TransactionResponse>, Status> {
        let req = request.into_inner();
        if req.data.len() != TRANSACTION_SIZE {
            return Err(Status::invalid_argument(format!(
                "transaction must have {} slots, got {}",
                TRANSACTION_SIZE,
                req.data.len()
            )));
        }
        trace!("process transaction {}", req.transaction_id);
        let values = req
            .data
            .into_iter()
            .map(|op| self.store.apply(Operation::from(op)))
            .collect();
        Ok(Response::new(TransactionResponse { values }))
    }
}
