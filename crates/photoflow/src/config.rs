//! Process configuration, assembled once at startup. `clap`'s `env` feature
//! binds each flag to its documented environment variable so the same
//! `Args` struct serves both CLI and container deployment; nothing in this
//! process reads the environment again after `Args::parse()`.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "photoflow", about = "Multi-account orchestrator for the photo service")]
pub struct Args {
    /// Path to the persisted SQLite store.
    #[arg(long, env = "DB_PATH", default_value = "./photoflow.db")]
    pub db_path: String,

    /// Worker pool claim-tick interval, in seconds.
    #[arg(long, env = "POLL_INTERVAL_SECONDS", default_value_t = 1.0)]
    pub poll_interval_seconds: f64,

    /// Maximum number of jobs running concurrently across all accounts.
    #[arg(long, env = "WORKER_MAX_WORKERS", default_value_t = 4)]
    pub worker_max_workers: u32,

    /// Maximum number of jobs running concurrently for a single account.
    #[arg(long, env = "WORKER_MAX_PER_ACCOUNT", default_value_t = 1)]
    pub worker_max_per_account: u32,

    /// Preview TTL, in minutes, before an uncommitted preview expires.
    #[arg(long, env = "PREVIEW_TTL_MINUTES", default_value_t = 30)]
    pub preview_ttl_minutes: i64,

    /// RPC client retry budget per call.
    #[arg(long, env = "RPC_MAX_RETRIES", default_value_t = 3)]
    pub rpc_max_retries: u32,

    /// RPC client linear backoff base delay, in milliseconds.
    #[arg(long, env = "RPC_RETRY_BASE_DELAY_MS", default_value_t = 1500)]
    pub rpc_retry_base_delay_ms: u64,

    /// RPC client per-call timeout, in seconds.
    #[arg(long, env = "RPC_TIMEOUT_SECONDS", default_value_t = 120)]
    pub rpc_timeout_seconds: u64,

    /// HTTP bind address for the axum server.
    #[arg(long, env = "HTTP_BIND_ADDR", default_value = "127.0.0.1:8080")]
    pub http_bind_addr: String,
}
