use std::error::Error;

use kvs_load::cli::{BenchArgs, KvsCli, KvsCommands, ServerArgs};
use kvs_load::rpc_server::ShardServer;
use kvs_load::shard::GrpcConnector;
use kvs_load::{BenchConfig, Harness};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn handle_cli(command: KvsCli) -> Result<(), Box<dyn Error>> {
    match command.command {
        KvsCommands::Bench(args) => handle_bench(args).await,
        KvsCommands::Serve(args) => handle_server(args).await,
    }
}

async fn handle_bench(args: BenchArgs) -> Result<(), Box<dyn Error>> {
    let config = BenchConfig::try_from(args)?;
    println!(
        "hosts {:?}\ntheta {:.2}\nworkload {}\nsecs {}\nconnections {}\nmode {:?}",
        config.hosts,
        config.workload.theta,
        config.workload.profile,
        config.duration.as_secs(),
        config.connections,
        config.driver.mode,
    );

    let harness = Harness::new(config, GrpcConnector)?;
    stop_on_ctrl_c(harness.stop_token());
    let report = harness.run().await?;
    info!(
        "completed {} ops in {:?} over {} connections",
        report.total_ops,
        report.elapsed,
        report.per_driver.len()
    );
    println!("throughput {:.2} ops/s", report.throughput());
    Ok(())
}

async fn handle_server(args: ServerArgs) -> Result<(), Box<dyn Error>> {
    info!("use option {args:?}");
    let server = ShardServer::bind(args.socket_addr()).await?;
    let shutdown = CancellationToken::new();
    stop_on_ctrl_c(shutdown.clone());
    server.serve(shutdown).await?;
    info!("done clean up");
    Ok(())
}

fn stop_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received ctrl-c, stopping"),
            Err(err) => warn!("unable to listen for shutdown signal: {}", err),
        }
        token.cancel();
    });
}
