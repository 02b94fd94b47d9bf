pub use harness::{BenchConfig, Harness, RunReport};

pub mod cli;
pub mod driver;
pub mod error;
pub mod harness;
pub mod partition;
#[cfg(feature = "rpc-server")]
pub mod rpc_server;
pub mod session;
pub mod shard;
pub mod txn;
pub mod workload;

pub use kvs_pb as proto;
