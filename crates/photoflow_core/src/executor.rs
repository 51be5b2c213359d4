//! Dispatches one claimed job to its provider's adapter, reports progress
//! back to the store, and categorizes the outcome into a terminal status.

use async_trait::async_trait;
use photoflow_adapters::{
    Adapter, AdapterError, AdapterOutcome, AdvancedAdapter, BulkUploadAdapter, Credentials,
    FileDisguiseAdapter, IndexerAdapter, NativeRpcAdapter, PipelineAdapter, ProgressSink,
};
use photoflow_db::{AccountRepo, JobRepo};
use photoflow_protocol::{Job, JobStatus, Provider};
use photoflow_rpc::RpcClientConfig;
use sqlx::SqlitePool;
use tracing::Instrument;

use crate::cancel::CancellationToken;

/// Reports progress to the store and re-checks the cooperative cancel
/// signal: the store's `cancel_requested` column is authoritative, the
/// in-memory token lets the pool interrupt faster between I/O calls.
struct StoreProgressSink {
    pool: SqlitePool,
    job_id: photoflow_protocol::JobId,
    cancel_token: CancellationToken,
}

#[async_trait]
impl ProgressSink for StoreProgressSink {
    async fn report(&self, value: f64, message: &str) -> Result<(), AdapterError> {
        if self.cancel_token.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        let repo = JobRepo::new(&self.pool);
        repo.record_progress(&self.job_id, value, message)
            .await
            .map_err(AdapterError::Db)?;

        let job = repo.get(&self.job_id).await.map_err(AdapterError::Db)?;
        if job.map(|j| j.cancel_requested).unwrap_or(false) {
            self.cancel_token.cancel();
            return Err(AdapterError::Cancelled);
        }
        Ok(())
    }
}

pub struct JobExecutor {
    pool: SqlitePool,
    rpc_config: RpcClientConfig,
}

impl JobExecutor {
    pub fn new(pool: SqlitePool, rpc_config: RpcClientConfig) -> Self {
        Self { pool, rpc_config }
    }

    /// Runs one claimed job to a terminal status. Never panics or
    /// propagates: store write failures are logged, since there is no
    /// caller left to hand an error to once a job is in flight.
    pub async fn execute(&self, job: Job, cancel_token: CancellationToken) {
        let span = tracing::info_span!(
            "job_execution",
            job_id = %job.id.0,
            account_id = %job.account_id.0,
            provider = job.provider.as_str(),
        );
        async {
            if let Err(err) = self.run(job, cancel_token).await {
                tracing::error!(error = %err, "job execution ended with a store error");
            }
        }
        .instrument(span)
        .await;
    }

    async fn run(&self, job: Job, cancel_token: CancellationToken) -> Result<(), photoflow_db::DbError> {
        let job_repo = JobRepo::new(&self.pool);

        if !job.dry_run && photoflow_adapters::safety::is_destructive(&job.operation) && !job.is_confirmed() {
            tracing::warn!("refusing unconfirmed destructive job at execution start");
            job_repo
                .fail_queued(
                    &job.id,
                    "Destructive operation requires params.confirmed=true after dry-run",
                )
                .await?;
            return Ok(());
        }

        let account_repo = AccountRepo::new(&self.pool);
        let Some(account) = account_repo.get(&job.account_id).await? else {
            job_repo
                .mark_failed(&job.id, JobStatus::Failed, "Account not found")
                .await?;
            return Ok(());
        };

        let credentials = Credentials {
            cookie_jar: account.cookie_jar.clone(),
            session_state: account.session_state.clone(),
            bulk_upload_auth_data: account.bulk_upload_auth_data.clone(),
        };

        let sink = StoreProgressSink {
            pool: self.pool.clone(),
            job_id: job.id.clone(),
            cancel_token,
        };

        match self.dispatch(&job, &credentials, &sink).await {
            Ok(outcome) => {
                if let Some(session) = &outcome.session {
                    account_repo.set_session_state(&job.account_id, session).await?;
                }
                job_repo.mark_succeeded(&job.id, outcome.result).await?;
                tracing::info!("job completed");
            }
            Err(AdapterError::Cancelled) => {
                job_repo.mark_cancelled(&job.id).await?;
                tracing::warn!("job cancelled");
            }
            Err(err) => {
                let message = err.to_string();
                if message.contains("auth_data") || message.contains("cookie") {
                    job_repo
                        .mark_failed(&job.id, JobStatus::RequiresCredentials, &message)
                        .await?;
                } else {
                    job_repo.mark_failed(&job.id, JobStatus::Failed, &message).await?;
                }
                tracing::error!(error = %message, "job failed");
            }
        }
        Ok(())
    }

    async fn dispatch(
        &self,
        job: &Job,
        credentials: &Credentials,
        sink: &dyn ProgressSink,
    ) -> Result<AdapterOutcome, AdapterError> {
        match job.provider {
            Provider::NativeRpc => {
                NativeRpcAdapter::new(self.rpc_config.clone())
                    .run(&job.operation, &job.params, credentials, job.dry_run, sink)
                    .await
            }
            Provider::BulkUpload => {
                BulkUploadAdapter
                    .run(&job.operation, &job.params, credentials, job.dry_run, sink)
                    .await
            }
            Provider::FileDisguise => {
                FileDisguiseAdapter
                    .run(&job.operation, &job.params, credentials, job.dry_run, sink)
                    .await
            }
            Provider::Indexer => {
                IndexerAdapter::new(self.pool.clone(), self.rpc_config.clone())
                    .run(&job.operation, &job.params, credentials, job.dry_run, sink)
                    .await
            }
            Provider::Pipeline => {
                PipelineAdapter
                    .run(&job.operation, &job.params, credentials, job.dry_run, sink)
                    .await
            }
            Provider::Advanced => self.dispatch_advanced(job, credentials, sink).await,
        }
    }

    /// `advanced.rpc_execute` runs through `AdvancedAdapter` directly; any
    /// other `advanced.*` operation aliases a native-rpc catalog entry and
    /// is re-dispatched there with the prefix stripped.
    async fn dispatch_advanced(
        &self,
        job: &Job,
        credentials: &Credentials,
        sink: &dyn ProgressSink,
    ) -> Result<AdapterOutcome, AdapterError> {
        let short = job.operation.strip_prefix("advanced.").unwrap_or(&job.operation);
        if short == "rpc_execute" {
            return AdvancedAdapter::new(self.rpc_config.clone())
                .run(&job.operation, &job.params, credentials, job.dry_run, sink)
                .await;
        }
        NativeRpcAdapter::new(self.rpc_config.clone())
            .run(short, &job.params, credentials, job.dry_run, sink)
            .await
    }
}
