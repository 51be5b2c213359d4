//! Preview/confirm two-phase commit endpoints: explorer actions, uploads,
//! the disguise-upload pipeline, and advanced passthrough all share one
//! commit handler (`photoflow_core::preview::PreviewRegistry::commit`
//! dispatches on the preview's own `kind`); only preview creation differs,
//! since only explorer actions resolve a target set through the index.

use axum::extract::State;
use axum::Json;
use photoflow_core::{ActionResolver, PreviewRegistry};
use photoflow_protocol::{AccountId, PreviewAction, PreviewId, PreviewKind};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExplorerPreviewRequest {
    pub account_id: String,
    pub action: String,
    #[serde(default)]
    pub query: Value,
    #[serde(default)]
    pub action_params: Value,
    pub selected_media_keys: Option<Vec<String>>,
}

/// `POST /actions/preview`.
pub async fn preview_explorer_action(
    State(state): State<AppState>,
    Json(req): Json<ExplorerPreviewRequest>,
) -> Result<Json<PreviewAction>, ApiError> {
    let account_id = AccountId::from_string(req.account_id);
    let resolved = ActionResolver::new(&state.pool)
        .resolve(&account_id, req.selected_media_keys.as_deref())
        .await?;

    let sample_items = serde_json::to_value(&resolved.sample_rows).unwrap_or_else(|_| json!([]));
    let preview = PreviewRegistry::new(&state.pool, state.preview_ttl_minutes)
        .create(
            account_id,
            PreviewKind::ExplorerAction,
            req.action,
            req.query,
            req.action_params,
            resolved.media_keys,
            sample_items,
            resolved.warnings,
        )
        .await?;
    Ok(Json(preview))
}

#[derive(Debug, Deserialize)]
pub struct DirectPreviewRequest {
    pub account_id: String,
    pub action: String,
    #[serde(default)]
    pub action_params: Value,
}

/// `POST /uploads/preview`. Uploads have no pre-existing target set to
/// resolve; `action_params` carries the file/folder target directly.
pub async fn preview_upload(
    State(state): State<AppState>,
    Json(req): Json<DirectPreviewRequest>,
) -> Result<Json<PreviewAction>, ApiError> {
    create_direct_preview(&state, PreviewKind::Upload, req).await
}

/// `POST /pipeline/disguise_upload/preview`.
pub async fn preview_pipeline_disguise_upload(
    State(state): State<AppState>,
    Json(req): Json<DirectPreviewRequest>,
) -> Result<Json<PreviewAction>, ApiError> {
    create_direct_preview(&state, PreviewKind::PipelineDisguiseUpload, req).await
}

/// `POST /advanced/preview`.
pub async fn preview_advanced(
    State(state): State<AppState>,
    Json(req): Json<DirectPreviewRequest>,
) -> Result<Json<PreviewAction>, ApiError> {
    create_direct_preview(&state, PreviewKind::Advanced, req).await
}

async fn create_direct_preview(
    state: &AppState,
    kind: PreviewKind,
    req: DirectPreviewRequest,
) -> Result<Json<PreviewAction>, ApiError> {
    let preview = PreviewRegistry::new(&state.pool, state.preview_ttl_minutes)
        .create(
            AccountId::from_string(req.account_id),
            kind,
            req.action,
            json!({}),
            req.action_params,
            Vec::new(),
            json!([]),
            Vec::new(),
        )
        .await?;
    Ok(Json(preview))
}

#[derive(Debug, Deserialize)]
pub struct CommitPreviewRequest {
    pub account_id: String,
    pub preview_id: String,
    #[serde(default)]
    pub confirm: bool,
}

/// Shared commit endpoint for every preview kind.
pub async fn commit_preview(
    State(state): State<AppState>,
    Json(req): Json<CommitPreviewRequest>,
) -> Result<Json<Value>, ApiError> {
    let account_id = AccountId::from_string(req.account_id);
    let preview_id = PreviewId::from_string(req.preview_id);

    let (preview_id, job_id) = PreviewRegistry::new(&state.pool, state.preview_ttl_minutes)
        .commit(&account_id, &preview_id, req.confirm)
        .await?;

    Ok(Json(json!({
        "preview_id": preview_id.0,
        "job_id": job_id.0,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoflow_core::CancelRegistry;
    use photoflow_db::{create_pool, DbConfig, MediaIndexRepo};
    use photoflow_protocol::MediaIndexRow;

    async fn setup() -> AppState {
        let pool = create_pool(DbConfig::memory()).await.unwrap();
        AppState {
            pool,
            cancel_registry: CancelRegistry::default(),
            preview_ttl_minutes: 30,
        }
    }

    #[tokio::test]
    async fn explorer_preview_then_commit_enqueues_a_job() {
        let state = setup().await;
        let account_id = AccountId::new();

        let row = MediaIndexRow {
            account_id: account_id.clone(),
            media_key: "m1".to_string(),
            dedup_key: Some("d1".to_string()),
            thumb: None,
            res_width: None,
            res_height: None,
            timestamp: None,
            timezone_offset: None,
            creation_timestamp: None,
            is_archived: false,
            is_favorite: false,
            duration: None,
            description: None,
            album_ids: Vec::new(),
            updated_at: chrono::Utc::now(),
        };
        MediaIndexRepo::new(&state.pool).upsert(&row).await.unwrap();

        let preview = preview_explorer_action(
            axum::extract::State(state.clone()),
            Json(ExplorerPreviewRequest {
                account_id: account_id.0.clone(),
                action: "trash".to_string(),
                query: json!({}),
                action_params: json!({}),
                selected_media_keys: Some(vec!["m1".to_string()]),
            }),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(preview.matched_media_keys, vec!["m1".to_string()]);

        let commit = commit_preview(
            axum::extract::State(state),
            Json(CommitPreviewRequest {
                account_id: account_id.0,
                preview_id: preview.id.0,
                confirm: true,
            }),
        )
        .await
        .unwrap()
        .0;
        assert!(commit["job_id"].is_string());
    }
}
