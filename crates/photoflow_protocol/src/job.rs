//! The job record, its state machine, and the append-only event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ids::{AccountId, JobEventId, JobId};

/// Which adapter owns a job's `operation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "kebab-case")]
pub enum Provider {
    NativeRpc,
    BulkUpload,
    FileDisguise,
    Indexer,
    Pipeline,
    Advanced,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NativeRpc => "native-rpc",
            Self::BulkUpload => "bulk-upload",
            Self::FileDisguise => "file-disguise",
            Self::Indexer => "indexer",
            Self::Pipeline => "pipeline",
            Self::Advanced => "advanced",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native-rpc" => Ok(Self::NativeRpc),
            "bulk-upload" => Ok(Self::BulkUpload),
            "file-disguise" => Ok(Self::FileDisguise),
            "indexer" => Ok(Self::Indexer),
            "pipeline" => Ok(Self::Pipeline),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Job lifecycle status. `Queued` is the only initial state; the remaining
/// terminal variants are `Succeeded`, `Failed`, `Cancelled`, `RequiresCredentials`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    RequiresCredentials,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Cancelled | Self::RequiresCredentials
        )
    }
}

/// The primary entity: a durable unit of work against one account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: JobId,
    pub account_id: AccountId,
    pub provider: Provider,
    pub operation: String,
    pub dry_run: bool,
    #[sqlx(json)]
    pub params: serde_json::Value,
    pub status: JobStatus,
    pub progress: f64,
    pub message: Option<String>,
    #[sqlx(json)]
    pub result: Option<serde_json::Value>,
    #[sqlx(json)]
    pub error: Option<serde_json::Value>,
    pub cancel_requested: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Construct a freshly queued job. Callers still need to persist it.
    pub fn new(
        account_id: AccountId,
        provider: Provider,
        operation: impl Into<String>,
        params: serde_json::Value,
        dry_run: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            account_id,
            provider,
            operation: operation.into(),
            dry_run,
            params,
            status: JobStatus::Queued,
            progress: 0.0,
            message: Some("Queued".to_string()),
            result: None,
            error: None,
            cancel_requested: false,
            created_at: now,
            updated_at: now,
            started_at: None,
            finished_at: None,
        }
    }

    /// `true` once `confirmed` has been set on a non-dry-run job's params.
    pub fn is_confirmed(&self) -> bool {
        self.params
            .get("confirmed")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}

/// Severity of a [`JobEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// An append-only log entry. Never mutated once written.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobEvent {
    pub id: JobEventId,
    pub job_id: JobId,
    pub level: EventLevel,
    pub message: String,
    pub progress: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl JobEvent {
    pub fn new(
        job_id: JobId,
        level: EventLevel,
        message: impl Into<String>,
        progress: Option<f64>,
    ) -> Self {
        Self {
            id: JobEventId::new(),
            job_id,
            level,
            message: message.into(),
            progress,
            created_at: Utc::now(),
        }
    }
}
