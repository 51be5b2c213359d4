//! Photoflow: a multi-account orchestrator for the photo service.
//!
//! Assembles configuration from the environment, wires the durable store,
//! the worker pool, and the HTTP server, and runs them until a shutdown
//! signal arrives.

use std::net::SocketAddr;

use clap::Parser;
use photoflow_core::{JobExecutor, PoolConfig, WorkerPool};
use photoflow_db::{create_pool, DbConfig};
use photoflow_rpc::RpcClientConfig;
use photoflow_server::{AppState, Server};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod config;

use config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photoflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    tracing::info!(
        db_path = %args.db_path,
        bind_addr = %args.http_bind_addr,
        max_workers = args.worker_max_workers,
        max_per_account = args.worker_max_per_account,
        "starting photoflow",
    );

    let pool = create_pool(DbConfig::file(&args.db_path)).await?;

    let rpc_config = RpcClientConfig {
        max_retries: args.rpc_max_retries,
        retry_base_delay_ms: args.rpc_retry_base_delay_ms,
        timeout_seconds: args.rpc_timeout_seconds,
    };
    let executor = JobExecutor::new(pool.clone(), rpc_config);
    let pool_config = PoolConfig {
        max_workers: args.worker_max_workers,
        max_per_account: args.worker_max_per_account,
        poll_seconds: args.poll_interval_seconds,
    };
    let worker_pool = WorkerPool::new(pool.clone(), pool_config, executor);
    let cancel_registry = worker_pool.cancel_registry();

    let state = AppState {
        pool,
        cancel_registry,
        preview_ttl_minutes: args.preview_ttl_minutes,
    };
    let bind_addr: SocketAddr = args.http_bind_addr.parse()?;
    let server = Server::new(bind_addr, state);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let pool_task = tokio::spawn(worker_pool.run(shutdown_rx.clone()));
    let server_task = tokio::spawn(server.serve(shutdown_rx));

    wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received, draining in-flight work");
    let _ = shutdown_tx.send(true);

    pool_task.await?;
    server_task.await??;

    tracing::info!("photoflow shut down cleanly");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
