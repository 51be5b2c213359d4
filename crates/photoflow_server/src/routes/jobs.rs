//! Job CRUD, cancellation, and the SSE event stream.

use std::convert::Infallible;
use std::str::FromStr;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use photoflow_adapters::safety;
use photoflow_core::CoreError;
use photoflow_db::JobRepo;
use photoflow_protocol::{AccountId, Job, JobEvent, JobId, JobStatus, Provider};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub account_id: String,
    pub provider: String,
    pub operation: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub dry_run: bool,
}

/// `POST /jobs`. Rejects a non-dry-run destructive operation that does not
/// already carry `params.confirmed = true` (the job-creation enforcement
/// point of the safety gate; see `photoflow_adapters::safety`).
pub async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<Json<Job>, ApiError> {
    let provider =
        Provider::from_str(&req.provider).map_err(|e| ApiError(CoreError::Validation(e)))?;

    let confirmed = req
        .params
        .get("confirmed")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !req.dry_run && safety::is_destructive(&req.operation) && !confirmed {
        return Err(ApiError(CoreError::DestructiveRequiresConfirmed));
    }

    let job = Job::new(
        AccountId::from_string(req.account_id),
        provider,
        req.operation,
        req.params,
        req.dry_run,
    );
    JobRepo::new(&state.pool).insert(&job).await?;
    Ok(Json(job))
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub account_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

/// `GET /jobs?account_id&status&limit`.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<Job>>, ApiError> {
    let account_id = query.account_id.map(AccountId::from_string);
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);

    let jobs = JobRepo::new(&state.pool)
        .list(account_id.as_ref(), status, limit)
        .await?;
    Ok(Json(jobs))
}

fn parse_status(raw: &str) -> Result<JobStatus, ApiError> {
    match raw {
        "queued" => Ok(JobStatus::Queued),
        "running" => Ok(JobStatus::Running),
        "succeeded" => Ok(JobStatus::Succeeded),
        "failed" => Ok(JobStatus::Failed),
        "cancelled" => Ok(JobStatus::Cancelled),
        "requires_credentials" => Ok(JobStatus::RequiresCredentials),
        other => Err(ApiError(CoreError::Validation(format!(
            "unknown job status: {other}"
        )))),
    }
}

#[derive(Debug, Deserialize)]
pub struct GetJobQuery {
    #[serde(default)]
    pub include_events: bool,
}

#[derive(Debug, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<JobEvent>>,
}

/// `GET /jobs/{id}`, optionally including the full event log.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<GetJobQuery>,
) -> Result<Json<JobDetail>, ApiError> {
    let repo = JobRepo::new(&state.pool);
    let job_id = JobId::from_string(job_id);
    let job = repo
        .get(&job_id)
        .await?
        .ok_or_else(|| ApiError(CoreError::JobNotFound(job_id.0.clone())))?;

    let events = if query.include_events {
        Some(repo.list_events_for_job(&job_id).await?)
    } else {
        None
    };

    Ok(Json(JobDetail { job, events }))
}

/// `POST /jobs/{id}/cancel`. A still-`queued` job transitions directly;
/// an in-flight job gets `cancel_requested` flipped in the store and its
/// in-memory token flipped for a faster interrupt.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let job_id = JobId::from_string(job_id);
    let repo = JobRepo::new(&state.pool);

    let cancelled_immediately = repo.cancel_if_queued(&job_id).await?;
    if !cancelled_immediately {
        repo.request_cancel(&job_id).await?;
        state.cancel_registry.request_cancel(&job_id).await;
    }

    Ok(Json(serde_json::json!({
        "job_id": job_id.0,
        "cancelled_immediately": cancelled_immediately,
    })))
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub since: Option<DateTime<Utc>>,
    pub poll_seconds: Option<f64>,
}

const STREAM_PAGE_LIMIT: i64 = 500;

/// `GET /jobs/stream?since&poll_seconds`. Polls the event log tail and
/// re-emits oldest-first, sending a keepalive comment between polls so
/// idle connections are not reaped by intermediaries.
pub async fn stream_jobs(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Response {
    let poll = Duration::from_secs_f64(query.poll_seconds.unwrap_or(1.0).max(0.1));
    let cursor = query.since.unwrap_or_else(Utc::now);
    let pool = state.pool.clone();

    let event_stream = stream::unfold((pool, cursor, poll), |(pool, cursor, poll)| async move {
        loop {
            match JobRepo::new(&pool)
                .list_events_since(cursor, STREAM_PAGE_LIMIT)
                .await
            {
                Ok(events) if !events.is_empty() => {
                    let next_cursor = events.last().map(|e| e.created_at).unwrap_or(cursor);
                    let batch: Vec<Result<Event, Infallible>> =
                        events.iter().map(|event| Ok(sse_event(event))).collect();
                    return Some((stream::iter(batch), (pool, next_cursor, poll)));
                }
                Ok(_) => {
                    tokio::time::sleep(poll).await;
                }
                Err(err) => {
                    tracing::error!(error = %err, "event stream poll failed");
                    let keepalive = vec![Ok(Event::default().comment("poll-error"))];
                    return Some((stream::iter(keepalive), (pool, cursor, poll)));
                }
            }
        }
    })
    .flatten();

    Sse::new(event_stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoflow_core::CancelRegistry;
    use photoflow_db::{create_pool, DbConfig};

    async fn setup() -> AppState {
        let pool = create_pool(DbConfig::memory()).await.unwrap();
        AppState {
            pool,
            cancel_registry: CancelRegistry::default(),
            preview_ttl_minutes: 30,
        }
    }

    #[tokio::test]
    async fn create_job_rejects_unconfirmed_destructive_operation() {
        let state = setup().await;
        let req = CreateJobRequest {
            account_id: "acct-1".to_string(),
            provider: "native-rpc".to_string(),
            operation: "native-rpc.move_items_to_trash".to_string(),
            params: serde_json::json!({}),
            dry_run: false,
        };

        let err = create_job(State(state), Json(req)).await.unwrap_err();
        assert!(matches!(err.0, CoreError::DestructiveRequiresConfirmed));
    }

    #[tokio::test]
    async fn create_job_allows_confirmed_destructive_operation() {
        let state = setup().await;
        let req = CreateJobRequest {
            account_id: "acct-1".to_string(),
            provider: "native-rpc".to_string(),
            operation: "native-rpc.move_items_to_trash".to_string(),
            params: serde_json::json!({"confirmed": true}),
            dry_run: false,
        };

        let job = create_job(State(state), Json(req)).await.unwrap().0;
        assert_eq!(job.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn cancel_job_on_queued_job_transitions_directly() {
        let state = setup().await;
        let req = CreateJobRequest {
            account_id: "acct-1".to_string(),
            provider: "native-rpc".to_string(),
            operation: "native-rpc.get_storage_quota".to_string(),
            params: serde_json::json!({}),
            dry_run: true,
        };
        let job = create_job(State(state.clone()), Json(req)).await.unwrap().0;

        let response = cancel_job(State(state), Path(job.id.0.clone()))
            .await
            .unwrap()
            .0;
        assert_eq!(response["cancelled_immediately"], serde_json::json!(true));
    }
}

fn sse_event(event: &JobEvent) -> Event {
    let payload = serde_json::json!({
        "job_id": event.job_id.0,
        "level": event.level,
        "message": event.message,
        "progress": event.progress,
        "created_at": event.created_at,
    });
    Event::default()
        .id(event.id.0.clone())
        .event("job_event")
        .json_data(payload)
        .unwrap_or_else(|_| Event::default().comment("unserializable event"))
}
