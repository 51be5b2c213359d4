//! Bounded worker pool: a polling claim loop over the durable queue, with
//! per-account fairness and a tokio task per in-flight job.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use photoflow_db::JobRepo;
use photoflow_protocol::{AccountId, JobId};
use sqlx::SqlitePool;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinSet;

use crate::cancel::CancellationToken;
use crate::executor::JobExecutor;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_workers: u32,
    pub max_per_account: u32,
    pub poll_seconds: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            max_per_account: 1,
            poll_seconds: 1.0,
        }
    }
}

/// A handle an HTTP-layer cancel request can use to flip a running job's
/// in-memory cancel token without waiting for the next poll tick.
#[derive(Clone, Default)]
pub struct CancelRegistry {
    tokens: Arc<Mutex<HashMap<JobId, CancellationToken>>>,
}

impl CancelRegistry {
    fn new() -> Self {
        Self::default()
    }

    pub async fn request_cancel(&self, job_id: &JobId) {
        if let Some(token) = self.tokens.lock().await.get(job_id) {
            token.cancel();
        }
    }

    async fn register(&self, job_id: JobId, token: CancellationToken) {
        self.tokens.lock().await.insert(job_id, token);
    }

    async fn forget(&self, job_id: &JobId) {
        self.tokens.lock().await.remove(job_id);
    }
}

pub struct WorkerPool {
    pool: SqlitePool,
    config: PoolConfig,
    executor: Arc<JobExecutor>,
    cancel_registry: CancelRegistry,
}

impl WorkerPool {
    pub fn new(pool: SqlitePool, config: PoolConfig, executor: JobExecutor) -> Self {
        Self {
            pool,
            config,
            executor: Arc::new(executor),
            cancel_registry: CancelRegistry::new(),
        }
    }

    pub fn cancel_registry(&self) -> CancelRegistry {
        self.cancel_registry.clone()
    }

    /// Drives the claim/dispatch loop until `shutdown` reports `true`,
    /// then drains in-flight tasks before returning.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut tasks: JoinSet<(AccountId, JobId)> = JoinSet::new();
        let mut in_flight: HashMap<AccountId, u32> = HashMap::new();

        loop {
            while let Some(result) = tasks.try_join_next() {
                if let Ok((account_id, job_id)) = result {
                    decrement(&mut in_flight, &account_id);
                    self.cancel_registry.forget(&job_id).await;
                }
            }

            let available = self.config.max_workers.saturating_sub(tasks.len() as u32);
            if available > 0 {
                match JobRepo::new(&self.pool)
                    .claim_jobs(available, self.config.max_per_account, &in_flight)
                    .await
                {
                    Ok(claimed) => {
                        for job in claimed {
                            let token = CancellationToken::new();
                            self.cancel_registry.register(job.id.clone(), token.clone()).await;
                            *in_flight.entry(job.account_id.clone()).or_insert(0) += 1;

                            let executor = self.executor.clone();
                            let account_id = job.account_id.clone();
                            let job_id = job.id.clone();
                            tasks.spawn(async move {
                                executor.execute(job, token).await;
                                (account_id, job_id)
                            });
                        }
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "failed to claim jobs this tick");
                    }
                }
            }

            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs_f64(self.config.poll_seconds)) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        while tasks.join_next().await.is_some() {}
    }
}

fn decrement(in_flight: &mut HashMap<AccountId, u32>, account_id: &AccountId) {
    if let Some(count) = in_flight.get_mut(account_id) {
        *count = count.saturating_sub(1);
        if *count == 0 {
            in_flight.remove(account_id);
        }
    }
}
