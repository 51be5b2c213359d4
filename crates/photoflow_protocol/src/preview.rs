//! The preview/confirm two-phase commit token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ids::{AccountId, JobId, PreviewId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum PreviewKind {
    ExplorerAction,
    Upload,
    PipelineDisguiseUpload,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum PreviewStatus {
    Previewed,
    Committed,
    Expired,
}

/// A TTL-bound record capturing the effect of an action, used to let a caller
/// confirm before a job is enqueued.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PreviewAction {
    pub id: PreviewId,
    pub account_id: AccountId,
    pub kind: PreviewKind,
    pub action: String,
    #[sqlx(json)]
    pub query_payload: serde_json::Value,
    #[sqlx(json)]
    pub action_params: serde_json::Value,
    #[sqlx(json)]
    pub matched_media_keys: Vec<String>,
    #[sqlx(json)]
    pub sample_items: serde_json::Value,
    #[sqlx(json)]
    pub warnings: Vec<String>,
    pub requires_confirm: bool,
    pub status: PreviewStatus,
    pub committed_job_id: Option<JobId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PreviewAction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_id: AccountId,
        kind: PreviewKind,
        action: impl Into<String>,
        query_payload: serde_json::Value,
        action_params: serde_json::Value,
        matched_media_keys: Vec<String>,
        sample_items: serde_json::Value,
        warnings: Vec<String>,
        ttl: chrono::Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PreviewId::new(),
            account_id,
            kind,
            action: action.into(),
            query_payload,
            action_params,
            matched_media_keys,
            sample_items,
            warnings,
            requires_confirm: true,
            status: PreviewStatus::Previewed,
            committed_job_id: None,
            created_at: now,
            updated_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
