//! Job row CRUD and the atomic claim transaction.

use chrono::Utc;
use photoflow_protocol::{AccountId, EventLevel, Job, JobEvent, JobId, JobStatus};
use sqlx::SqlitePool;
use tracing::info;

use crate::pool::DbError;

pub struct JobRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> JobRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, job: &Job) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, account_id, provider, operation, dry_run, params, status,
                progress, message, result, error, cancel_requested,
                created_at, updated_at, started_at, finished_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(&job.account_id)
        .bind(job.provider.as_str())
        .bind(&job.operation)
        .bind(job.dry_run)
        .bind(&job.params)
        .bind(job.status)
        .bind(job.progress)
        .bind(&job.message)
        .bind(&job.result)
        .bind(&job.error)
        .bind(job.cancel_requested)
        .bind(job.created_at)
        .bind(job.updated_at)
        .bind(job.started_at)
        .bind(job.finished_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: &JobId) -> Result<Option<Job>, DbError> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(job)
    }

    pub async fn list(
        &self,
        account_id: Option<&AccountId>,
        status: Option<JobStatus>,
        limit: i64,
    ) -> Result<Vec<Job>, DbError> {
        // Hand-built predicate: sqlx's compile-time query! macro can't express
        // the optional-filter shape without running against a live database,
        // which this workspace's CI does not provision for this crate.
        let mut sql = String::from("SELECT * FROM jobs WHERE 1 = 1");
        if account_id.is_some() {
            sql.push_str(" AND account_id = ?");
        }
        if status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT ?");

        let mut query = sqlx::query_as::<_, Job>(&sql);
        if let Some(account_id) = account_id {
            query = query.bind(account_id);
        }
        if let Some(status) = status {
            query = query.bind(status);
        }
        query = query.bind(limit);

        let jobs = query.fetch_all(self.pool).await?;
        Ok(jobs)
    }

    /// Directly cancel a job that is still `queued`, without worker
    /// involvement. Returns `false` if the job was not found or had already
    /// left `queued`.
    pub async fn cancel_if_queued(&self, id: &JobId) -> Result<bool, DbError> {
        let now = Utc::now();
        let rows_affected = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'cancelled', finished_at = ?, updated_at = ?,
                message = 'Job cancelled by user'
            WHERE id = ? AND status = 'queued'
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?
        .rows_affected();
        Ok(rows_affected > 0)
    }

    /// Flip `cancel_requested`; checked cooperatively by the executor at the
    /// next progress checkpoint. No-op if the job is already terminal.
    pub async fn request_cancel(&self, id: &JobId) -> Result<(), DbError> {
        sqlx::query(
            "UPDATE jobs SET cancel_requested = 1, updated_at = ? \
             WHERE id = ? AND status NOT IN ('succeeded','failed','cancelled','requires_credentials')",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Atomically claim up to `limit` queued jobs (oldest-500 scan, creation
    /// order), admitting each whose account has fewer than `max_per_account`
    /// jobs already in flight on this worker pool.
    pub async fn claim_jobs(
        &self,
        limit: u32,
        max_per_account: u32,
        in_flight_accounts: &std::collections::HashMap<AccountId, u32>,
    ) -> Result<Vec<Job>, DbError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;

        let candidates: Vec<Job> = sqlx::query_as(
            "SELECT * FROM jobs WHERE status = 'queued' ORDER BY created_at ASC LIMIT 500",
        )
        .fetch_all(&mut *tx)
        .await?;

        let mut local_counts: std::collections::HashMap<AccountId, u32> =
            std::collections::HashMap::new();
        let mut claimed = Vec::new();
        let now = Utc::now();

        for candidate in candidates {
            if claimed.len() as u32 >= limit {
                break;
            }
            let in_flight = in_flight_accounts
                .get(&candidate.account_id)
                .copied()
                .unwrap_or(0);
            let local = local_counts.get(&candidate.account_id).copied().unwrap_or(0);
            if in_flight + local >= max_per_account {
                continue;
            }

            let rows_affected = sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'running', started_at = COALESCE(started_at, ?),
                    updated_at = ?, message = 'Worker claimed job',
                    progress = MAX(progress, 0.01)
                WHERE id = ? AND status = 'queued'
                "#,
            )
            .bind(now)
            .bind(now)
            .bind(&candidate.id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if rows_affected == 0 {
                // Lost a race with a concurrent claim (shouldn't happen within
                // a single pool, kept defensive for a future multi-claimer).
                continue;
            }

            let event = JobEvent::new(
                candidate.id.clone(),
                EventLevel::Info,
                "Worker claimed job",
                Some(candidate.progress.max(0.01)),
            );
            insert_event(&mut tx, &event).await?;

            *local_counts.entry(candidate.account_id.clone()).or_insert(0) += 1;

            let mut claimed_job = candidate;
            claimed_job.status = JobStatus::Running;
            claimed_job.started_at = claimed_job.started_at.or(Some(now));
            claimed_job.updated_at = now;
            claimed_job.message = Some("Worker claimed job".to_string());
            claimed_job.progress = claimed_job.progress.max(0.01);
            claimed.push(claimed_job);
        }

        tx.commit().await?;

        if !claimed.is_empty() {
            info!(count = claimed.len(), "claimed jobs");
        }

        Ok(claimed)
    }

    /// Record a progress update: clamps `progress`, stamps `message` and
    /// `updated_at`, and appends a JobEvent in the same transaction.
    pub async fn record_progress(
        &self,
        id: &JobId,
        progress: f64,
        message: &str,
    ) -> Result<(), DbError> {
        let clamped = progress.clamp(0.0, 1.0);
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE jobs SET progress = ?, message = ?, updated_at = ? WHERE id = ?")
            .bind(clamped)
            .bind(message)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let event = JobEvent::new(id.clone(), EventLevel::Info, message, Some(clamped));
        insert_event(&mut tx, &event).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn mark_succeeded(
        &self,
        id: &JobId,
        result: serde_json::Value,
    ) -> Result<(), DbError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE jobs SET status = 'succeeded', progress = 1.0, result = ?, \
             message = 'Job completed', finished_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&result)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        let event = JobEvent::new(id.clone(), EventLevel::Info, "Job completed", Some(1.0));
        insert_event(&mut tx, &event).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn mark_cancelled(&self, id: &JobId) -> Result<(), DbError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE jobs SET status = 'cancelled', error = ?, \
             message = 'Job cancelled', finished_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(serde_json::json!({"message": "cancelled"}))
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        let event = JobEvent::new(
            id.clone(),
            EventLevel::Warn,
            "Job cancelled by user",
            None,
        );
        insert_event(&mut tx, &event).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn mark_failed(
        &self,
        id: &JobId,
        status: JobStatus,
        message: &str,
    ) -> Result<(), DbError> {
        debug_assert!(matches!(
            status,
            JobStatus::Failed | JobStatus::RequiresCredentials
        ));
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE jobs SET status = ?, error = ?, message = ?, finished_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status)
        .bind(serde_json::json!({"message": message}))
        .bind(message)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        let event = JobEvent::new(id.clone(), EventLevel::Error, message, None);
        insert_event(&mut tx, &event).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Fail a job before it ever left `queued` (e.g. the safety gate refusing
    /// an unconfirmed destructive operation at execution start).
    pub async fn fail_queued(&self, id: &JobId, message: &str) -> Result<(), DbError> {
        self.mark_failed(id, JobStatus::Failed, message).await
    }

    /// The full append-only event log for one job, oldest first.
    pub async fn list_events_for_job(&self, job_id: &JobId) -> Result<Vec<JobEvent>, DbError> {
        let events = sqlx::query_as::<_, JobEvent>(
            "SELECT * FROM job_events WHERE job_id = ? ORDER BY created_at ASC",
        )
        .bind(job_id)
        .fetch_all(self.pool)
        .await?;
        Ok(events)
    }

    /// Tail of the global event log after `cursor`, oldest first. Backs the
    /// SSE stream: callers advance `cursor` to the last returned event's
    /// `created_at` between polls.
    pub async fn list_events_since(
        &self,
        cursor: chrono::DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<JobEvent>, DbError> {
        let events = sqlx::query_as::<_, JobEvent>(
            "SELECT * FROM job_events WHERE created_at > ? ORDER BY created_at ASC LIMIT ?",
        )
        .bind(cursor)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(events)
    }

    pub async fn set_session_persisted(&self, job_id: &JobId) -> Result<(), DbError> {
        sqlx::query("UPDATE jobs SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(job_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

async fn insert_event(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    event: &JobEvent,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO job_events (id, job_id, level, message, progress, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&event.id)
    .bind(&event.job_id)
    .bind(event.level)
    .bind(&event.message)
    .bind(event.progress)
    .bind(event.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{create_pool, DbConfig};
    use photoflow_protocol::{Account, Provider};

    async fn setup() -> SqlitePool {
        create_pool(DbConfig::memory()).await.unwrap()
    }

    async fn seed_account(pool: &SqlitePool) -> AccountId {
        let account = Account::new("test");
        sqlx::query(
            "INSERT INTO accounts (id, label, is_active, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&account.id)
        .bind(&account.label)
        .bind(account.is_active)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(pool)
        .await
        .unwrap();
        account.id
    }

    #[tokio::test]
    async fn claim_respects_per_account_cap() {
        let pool = setup().await;
        let account_a = seed_account(&pool).await;
        let account_b = seed_account(&pool).await;
        let repo = JobRepo::new(&pool);

        for _ in 0..6 {
            let job = Job::new(account_a.clone(), Provider::NativeRpc, "native-rpc.noop", serde_json::json!({}), true);
            repo.insert(&job).await.unwrap();
        }
        for _ in 0..4 {
            let job = Job::new(account_b.clone(), Provider::NativeRpc, "native-rpc.noop", serde_json::json!({}), true);
            repo.insert(&job).await.unwrap();
        }

        let claimed = repo
            .claim_jobs(4, 1, &std::collections::HashMap::new())
            .await
            .unwrap();

        assert_eq!(claimed.len(), 2);
        let accounts: std::collections::HashSet<_> =
            claimed.iter().map(|j| j.account_id.clone()).collect();
        assert_eq!(accounts.len(), 2);
    }

    #[tokio::test]
    async fn progress_updates_are_clamped_and_logged() {
        let pool = setup().await;
        let account = seed_account(&pool).await;
        let repo = JobRepo::new(&pool);
        let job = Job::new(account, Provider::NativeRpc, "native-rpc.noop", serde_json::json!({}), true);
        repo.insert(&job).await.unwrap();

        repo.record_progress(&job.id, 1.5, "overshoot").await.unwrap();

        let reloaded = repo.get(&job.id).await.unwrap().unwrap();
        assert_eq!(reloaded.progress, 1.0);
        assert_eq!(reloaded.message.as_deref(), Some("overshoot"));
    }

    #[tokio::test]
    async fn cancel_if_queued_transitions_directly() {
        let pool = setup().await;
        let account = seed_account(&pool).await;
        let repo = JobRepo::new(&pool);
        let job = Job::new(account, Provider::NativeRpc, "native-rpc.noop", serde_json::json!({}), true);
        repo.insert(&job).await.unwrap();

        let cancelled = repo.cancel_if_queued(&job.id).await.unwrap();
        assert!(cancelled);

        let reloaded = repo.get(&job.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, JobStatus::Cancelled);
        assert!(reloaded.finished_at.is_some());
    }
}
