//! Preview (two-phase commit) row CRUD.

use chrono::Utc;
use photoflow_protocol::{AccountId, JobId, PreviewAction, PreviewId, PreviewStatus};
use sqlx::SqlitePool;

use crate::pool::DbError;

pub struct PreviewRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PreviewRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, preview: &PreviewAction) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO preview_actions (
                id, account_id, kind, action, query_payload, action_params,
                matched_media_keys, sample_items, warnings, requires_confirm,
                status, committed_job_id, created_at, updated_at, expires_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&preview.id)
        .bind(&preview.account_id)
        .bind(preview.kind)
        .bind(&preview.action)
        .bind(&preview.query_payload)
        .bind(&preview.action_params)
        .bind(sqlx::types::Json(&preview.matched_media_keys))
        .bind(&preview.sample_items)
        .bind(sqlx::types::Json(&preview.warnings))
        .bind(preview.requires_confirm)
        .bind(preview.status)
        .bind(&preview.committed_job_id)
        .bind(preview.created_at)
        .bind(preview.updated_at)
        .bind(preview.expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: &PreviewId) -> Result<Option<PreviewAction>, DbError> {
        let preview =
            sqlx::query_as::<_, PreviewAction>("SELECT * FROM preview_actions WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        Ok(preview)
    }

    pub async fn list(&self, account_id: &AccountId, status: Option<PreviewStatus>) -> Result<Vec<PreviewAction>, DbError> {
        let previews = if let Some(status) = status {
            sqlx::query_as::<_, PreviewAction>(
                "SELECT * FROM preview_actions WHERE account_id = ? AND status = ? ORDER BY created_at DESC",
            )
            .bind(account_id)
            .bind(status)
            .fetch_all(self.pool)
            .await?
        } else {
            sqlx::query_as::<_, PreviewAction>(
                "SELECT * FROM preview_actions WHERE account_id = ? ORDER BY created_at DESC",
            )
            .bind(account_id)
            .fetch_all(self.pool)
            .await?
        };
        Ok(previews)
    }

    pub async fn mark_expired(&self, id: &PreviewId) -> Result<(), DbError> {
        sqlx::query("UPDATE preview_actions SET status = 'expired', updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    pub async fn commit(&self, id: &PreviewId, job_id: &JobId) -> Result<(), DbError> {
        sqlx::query(
            "UPDATE preview_actions SET status = 'committed', committed_job_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(job_id)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Delete every preview past its TTL. Invoked at the head of every
    /// `create` call (see `photoflow_core::preview::PreviewRegistry`).
    pub async fn cleanup_expired(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM preview_actions WHERE expires_at < ?")
            .bind(Utc::now())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
