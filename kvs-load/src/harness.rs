use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::driver::{ConnectionDriver, DriverOptions};
use crate::error::KvsError;
use crate::shard::ShardConnector;
use crate::workload::{Workload, WorkloadSpec};

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// `host:port` of every shard. The position is the shard index.
    pub hosts: Vec<String>,
    pub workload: WorkloadSpec,
    pub duration: Duration,
    /// Concurrent connection drivers.
    pub connections: usize,
    pub driver: DriverOptions,
    /// Base seed; driver `i` uses `seed + i`.
    pub seed: Option<u64>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["localhost:8080".into()],
            workload: WorkloadSpec::default(),
            duration: Duration::from_secs(30),
            connections: 1,
            driver: DriverOptions::default(),
            seed: None,
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<(), KvsError> {
        if self.hosts.is_empty() {
            return Err(KvsError::InvalidConfig("no host configured".into()));
        }
        if let Some(pos) = self.hosts.iter().position(|h| h.trim().is_empty()) {
            return Err(KvsError::InvalidConfig(format!(
                "host #{pos} is empty"
            )));
        }
        if self.connections == 0 {
            return Err(KvsError::InvalidConfig(
                "connections must be positive".into(),
            ));
        }
        if self.duration.is_zero() {
            return Err(KvsError::InvalidConfig(
                "duration must be positive".into(),
            ));
        }
        if self.driver.batch_size == 0 {
            return Err(KvsError::InvalidConfig(
                "batch size must be positive".into(),
            ));
        }
        if self.driver.retry.max_attempts == 0 {
            return Err(KvsError::InvalidConfig(
                "at least one attempt is required".into(),
            ));
        }
        self.workload.validate()
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub total_ops: u64,
    /// Indexed by driver id.
    pub per_driver: Vec<u64>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Attempted operations per wall-clock second.
    pub fn throughput(&self) -> f64 {
        self.total_ops as f64 / self.elapsed.as_secs_f64()
    }
}

/// Runs `connections` drivers against the shards for a fixed window.
///
/// A driver error stops the whole run: the remaining drivers are aborted and
/// the error is returned instead of a report.
pub struct Harness<F> {
    config: BenchConfig,
    connector: Arc<F>,
    stop: CancellationToken,
}

impl<F> Harness<F>
where
    F: ShardConnector + 'static,
{
    pub fn new(config: BenchConfig, connector: F) -> Result<Self, KvsError> {
        config.validate()?;
        Ok(Self {
            config,
            connector: Arc::new(connector),
            stop: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Cancelling this token ends the run early; the report still covers
    /// every cycle the drivers finished.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub async fn run(self) -> Result<RunReport, KvsError> {
        let connections = self.config.connections;
        let start = Instant::now();
        let mut drivers = JoinSet::new();
        for id in 0..connections {
            let seed = self.config.seed.map(|s| s.wrapping_add(id as u64));
            let workload = Workload::new(&self.config.workload, seed)?;
            let connector = self.connector.clone();
            let hosts = self.config.hosts.clone();
            let options = self.config.driver;
            let stop = self.stop.clone();
            drivers.spawn(async move {
                let driver = ConnectionDriver::connect(
                    id,
                    &hosts,
                    connector.as_ref(),
                    workload,
                    options,
                )
                .await?;
                driver.run(stop).await.map(|ops| (id, ops))
            });
        }

        let deadline = tokio::time::sleep(self.config.duration);
        tokio::pin!(deadline);
        let mut per_driver = vec![0u64; connections];
        let mut remaining = connections;
        info!("waiting for connections to finish");
        while remaining > 0 {
            tokio::select! {
                _ = &mut deadline, if !self.stop.is_cancelled() => {
                    info!("measurement window over, stopping drivers");
                    self.stop.cancel();
                }
                joined = drivers.join_next() => {
                    let Some(joined) = joined else { break };
                    match joined.map_err(KvsError::from).and_then(|r| r) {
                        Ok((id, ops)) => {
                            per_driver[id] = ops;
                            remaining -= 1;
                        }
                        Err(err) => {
                            error!("driver failed, aborting run: {}", err);
                            self.stop.cancel();
                            drivers.shutdown().await;
                            return Err(err);
                        }
                    }
                }
            }
        }

        let elapsed = start.elapsed();
        let total_ops = per_driver.iter().sum();
        info!("all {} connections finished", connections);
        Ok(RunReport {
            total_ops,
            per_driver,
            elapsed,
        })
    }
}
