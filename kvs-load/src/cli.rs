use std::time::Duration;

use crate::driver::{DispatchMode, DriverOptions};
use crate::error::KvsError;
use crate::harness::BenchConfig;
use crate::session::RetryPolicy;
use crate::txn::DEFAULT_BATCH_SIZE;
use crate::workload::{
    DEFAULT_KEYSPACE, DEFAULT_VALUE_SIZE, WorkloadProfile, WorkloadSpec,
};

#[derive(clap::Parser, Clone, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct KvsCli {
    #[command(subcommand)]
    pub command: KvsCommands,
}

#[derive(clap::Subcommand, Clone, Debug)]
pub enum KvsCommands {
    /// Generate load against the shards and report throughput
    #[clap(aliases = &["b"])]
    Bench(BenchArgs),
    /// Start an in-memory shard
    Serve(ServerArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct BenchArgs {
    /// Comma-separated list of host:port to connect to
    #[arg(
        long,
        env = "KVS_HOSTS",
        value_delimiter = ',',
        default_value = "localhost:8080"
    )]
    pub hosts: Vec<String>,
    /// Zipfian distribution skew parameter
    #[arg(long, env = "KVS_THETA", default_value_t = 0.99)]
    pub theta: f64,
    /// Workload type (YCSB-A, YCSB-B, YCSB-C)
    #[arg(short, long, env = "KVS_WORKLOAD", default_value = "YCSB-B", value_parser = parse_profile)]
    pub workload: WorkloadProfile,
    /// Duration in seconds for the measurement window
    #[arg(short, long, env = "KVS_SECS", default_value_t = 30)]
    pub secs: u64,
    /// Number of concurrent connections
    #[arg(short, long, env = "KVS_CONNECTIONS", default_value_t = 1)]
    pub connections: usize,
    /// Dispatch mode
    #[arg(short, long, env = "KVS_MODE", value_enum, default_value_t = DispatchMode::Transaction)]
    pub mode: DispatchMode,
    /// Send get and put batches concurrently (batch mode)
    #[arg(long = "async", env = "KVS_ASYNC")]
    pub async_batch: bool,
    /// Operations per batch-mode cycle
    #[arg(long, env = "KVS_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
    /// Size in bytes of written values
    #[arg(long, env = "KVS_VALUE_SIZE", default_value_t = DEFAULT_VALUE_SIZE)]
    pub value_size: usize,
    /// Number of distinct keys
    #[arg(long, env = "KVS_KEYSPACE", default_value_t = DEFAULT_KEYSPACE)]
    pub keyspace: u64,
    /// Seed for reproducible workloads. Random, if none.
    #[arg(long, env = "KVS_SEED")]
    pub seed: Option<u64>,
}

fn parse_profile(s: &str) -> Result<WorkloadProfile, String> {
    s.parse().map_err(|e: KvsError| e.to_string())
}

impl TryFrom<BenchArgs> for BenchConfig {
    type Error = KvsError;

    fn try_from(args: BenchArgs) -> Result<Self, Self::Error> {
        let hosts = args
            .hosts
            .into_iter()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();
        let config = BenchConfig {
            hosts,
            workload: WorkloadSpec {
                profile: args.workload,
                theta: args.theta,
                keyspace: args.keyspace,
                value_size: args.value_size,
            },
            duration: Duration::from_secs(args.secs),
            connections: args.connections,
            driver: DriverOptions {
                mode: args.mode,
                batch_size: args.batch_size,
                async_batch: args.async_batch,
                retry: RetryPolicy::default(),
            },
            seed: args.seed,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServerArgs {
    /// Listen address
    #[arg(long, env = "KVS_ADDR", default_value = "0.0.0.0")]
    pub addr: std::net::IpAddr,
    /// gRPC port
    #[arg(short, long, env = "KVS_PORT", default_value = "8080")]
    pub port: u16,
}

impl ServerArgs {
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::new(self.addr, self.port)
    }
}
