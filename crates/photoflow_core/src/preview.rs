//! The preview/confirm two-phase commit registry. Grounded on
//! `action_service.py`'s `create_preview` / `commit_preview` /
//! `cleanup_expired`, and the explorer action mapping table in §6.

use chrono::{Duration, Utc};
use photoflow_db::{JobRepo, MediaIndexRepo, PreviewRepo};
use photoflow_protocol::{AccountId, Job, JobId, PreviewAction, PreviewId, PreviewKind, PreviewStatus, Provider};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::error::CoreError;

pub const DEFAULT_TTL_MINUTES: i64 = 30;

pub struct PreviewRegistry<'a> {
    pool: &'a SqlitePool,
    ttl: Duration,
}

#[allow(clippy::too_many_arguments)]
impl<'a> PreviewRegistry<'a> {
    pub fn new(pool: &'a SqlitePool, ttl_minutes: i64) -> Self {
        Self {
            pool,
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Deletes every preview past its TTL. Called at the head of `create`,
    /// and safe to call independently (e.g. from a periodic sweep).
    pub async fn cleanup_expired(&self) -> Result<u64, CoreError> {
        Ok(PreviewRepo::new(self.pool).cleanup_expired().await?)
    }

    pub async fn create(
        &self,
        account_id: AccountId,
        kind: PreviewKind,
        action: impl Into<String>,
        query_payload: Value,
        action_params: Value,
        media_keys: Vec<String>,
        sample_items: Value,
        warnings: Vec<String>,
    ) -> Result<PreviewAction, CoreError> {
        self.cleanup_expired().await?;

        let preview = PreviewAction::new(
            account_id,
            kind,
            action,
            query_payload,
            action_params,
            media_keys,
            sample_items,
            warnings,
            self.ttl,
        );
        PreviewRepo::new(self.pool).insert(&preview).await?;
        Ok(preview)
    }

    pub async fn get(&self, account_id: &AccountId, preview_id: &PreviewId) -> Result<PreviewAction, CoreError> {
        let preview = PreviewRepo::new(self.pool)
            .get(preview_id)
            .await?
            .filter(|p| &p.account_id == account_id)
            .ok_or_else(|| CoreError::PreviewNotFound(preview_id.0.clone()))?;
        Ok(preview)
    }

    /// Validates ownership, status, expiry, and `confirm`, then enqueues the
    /// concrete job and transitions the preview to `committed`.
    pub async fn commit(
        &self,
        account_id: &AccountId,
        preview_id: &PreviewId,
        confirm: bool,
    ) -> Result<(PreviewId, JobId), CoreError> {
        let preview_repo = PreviewRepo::new(self.pool);
        let preview = self.get(account_id, preview_id).await?;

        let now = Utc::now();
        if preview.is_expired(now) {
            preview_repo.mark_expired(preview_id).await?;
            return Err(CoreError::PreviewExpired(preview_id.0.clone()));
        }
        if preview.status != PreviewStatus::Previewed {
            return Err(CoreError::PreviewAlreadyCommitted(preview_id.0.clone()));
        }
        if preview.requires_confirm && !confirm {
            return Err(CoreError::PreviewRequiresConfirm);
        }

        let (provider, operation, params) = self.build_job_params(&preview).await?;
        let job = Job::new(preview.account_id.clone(), provider, operation, params, false);
        JobRepo::new(self.pool).insert(&job).await?;
        preview_repo.commit(preview_id, &job.id).await?;

        Ok((preview.id, job.id))
    }

    async fn build_job_params(&self, preview: &PreviewAction) -> Result<(Provider, String, Value), CoreError> {
        match preview.kind {
            PreviewKind::ExplorerAction => self.build_explorer_job_params(preview).await,
            PreviewKind::Upload => Ok((
                Provider::BulkUpload,
                format!("bulk-upload.{}", preview.action),
                with_confirmed(preview.action_params.clone()),
            )),
            PreviewKind::PipelineDisguiseUpload => Ok((
                Provider::Pipeline,
                "pipeline.disguise_upload".to_string(),
                with_confirmed(preview.action_params.clone()),
            )),
            PreviewKind::Advanced => Ok((
                Provider::Advanced,
                format!("advanced.{}", preview.action),
                with_confirmed(preview.action_params.clone()),
            )),
        }
    }

    async fn build_explorer_job_params(&self, preview: &PreviewAction) -> Result<(Provider, String, Value), CoreError> {
        let media_keys: Vec<String> = preview
            .matched_media_keys
            .iter()
            .filter(|k| !k.is_empty())
            .cloned()
            .collect();
        if media_keys.is_empty() {
            return Err(CoreError::Validation("Preview has no matching media keys".to_string()));
        }

        let rows = MediaIndexRepo::new(self.pool)
            .get_many(&preview.account_id, &media_keys)
            .await?;
        let dedup_keys: Vec<String> = rows.into_iter().filter_map(|r| r.dedup_key).collect();

        let action = preview.action.trim().to_lowercase();
        let action_params = preview.action_params.clone();
        let require_dedup_keys = |dedup_keys: &[String], action: &str| -> Result<(), CoreError> {
            if dedup_keys.is_empty() {
                return Err(CoreError::Validation(format!(
                    "No dedup keys available for {action} action"
                )));
            }
            Ok(())
        };

        match action.as_str() {
            "trash" | "move_to_trash" => {
                require_dedup_keys(&dedup_keys, "trash")?;
                Ok((
                    Provider::NativeRpc,
                    "native-rpc.move_items_to_trash".to_string(),
                    json!({"dedupKeyArray": dedup_keys, "confirmed": true}),
                ))
            }
            "restore" | "restore_from_trash" => {
                require_dedup_keys(&dedup_keys, "restore")?;
                Ok((
                    Provider::NativeRpc,
                    "native-rpc.restore_from_trash".to_string(),
                    json!({"dedupKeyArray": dedup_keys, "confirmed": true}),
                ))
            }
            "archive" => {
                require_dedup_keys(&dedup_keys, "archive")?;
                Ok((
                    Provider::NativeRpc,
                    "native-rpc.set_archive".to_string(),
                    json!({"dedupKeyArray": dedup_keys, "action": true, "confirmed": true}),
                ))
            }
            "unarchive" => {
                require_dedup_keys(&dedup_keys, "unarchive")?;
                Ok((
                    Provider::NativeRpc,
                    "native-rpc.set_archive".to_string(),
                    json!({"dedupKeyArray": dedup_keys, "action": false, "confirmed": true}),
                ))
            }
            "favorite" => {
                require_dedup_keys(&dedup_keys, "favorite")?;
                Ok((
                    Provider::NativeRpc,
                    "native-rpc.set_favorite".to_string(),
                    json!({"dedupKeyArray": dedup_keys, "action": true, "confirmed": true}),
                ))
            }
            "unfavorite" => {
                require_dedup_keys(&dedup_keys, "unfavorite")?;
                Ok((
                    Provider::NativeRpc,
                    "native-rpc.set_favorite".to_string(),
                    json!({"dedupKeyArray": dedup_keys, "action": false, "confirmed": true}),
                ))
            }
            "add_album" => {
                let album_id = action_params.get("album_id").and_then(Value::as_str);
                let album_name = action_params.get("album_name").and_then(Value::as_str);
                if album_id.is_none() && album_name.is_none() {
                    return Err(CoreError::Validation(
                        "add_album requires action_params.album_id or action_params.album_name".to_string(),
                    ));
                }
                let mut params = json!({"mediaKeyArray": media_keys, "confirmed": true});
                if let Some(album_id) = album_id {
                    params["albumMediaKey"] = json!(album_id);
                }
                if let Some(album_name) = album_name {
                    params["albumName"] = json!(album_name);
                }
                Ok((Provider::NativeRpc, "native-rpc.add_items_to_album".to_string(), params))
            }
            "remove_album" => {
                let album_id = action_params
                    .get("album_id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        CoreError::Validation("remove_album requires action_params.album_id".to_string())
                    })?;
                Ok((
                    Provider::NativeRpc,
                    "native-rpc.remove_items_from_shared_album".to_string(),
                    json!({"albumMediaKey": album_id, "mediaKeyArray": media_keys, "confirmed": true}),
                ))
            }
            "set_datetime" | "set_timestamp" => {
                let timestamp_sec = action_params.get("timestamp_sec").and_then(Value::as_i64).ok_or_else(|| {
                    CoreError::Validation("set_datetime requires action_params.timestamp_sec".to_string())
                })?;
                let timezone_sec = action_params.get("timezone_sec").and_then(Value::as_i64).unwrap_or(0);
                require_dedup_keys(&dedup_keys, "timestamp")?;
                let items: Vec<Value> = dedup_keys
                    .iter()
                    .map(|key| json!({"dedupKey": key, "timestampSec": timestamp_sec, "timezoneSec": timezone_sec}))
                    .collect();
                Ok((
                    Provider::NativeRpc,
                    "native-rpc.set_items_timestamp".to_string(),
                    json!({"items": items, "confirmed": true}),
                ))
            }
            other => Err(CoreError::Validation(format!("Unsupported action: {other}"))),
        }
    }
}

fn with_confirmed(mut params: Value) -> Value {
    if !params.is_object() {
        params = json!({});
    }
    params["confirmed"] = json!(true);
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoflow_db::{create_pool, DbConfig};

    async fn setup() -> SqlitePool {
        create_pool(DbConfig::memory()).await.unwrap()
    }

    #[tokio::test]
    async fn commit_without_confirm_is_rejected() {
        let pool = setup().await;
        let registry = PreviewRegistry::new(&pool, DEFAULT_TTL_MINUTES);
        let account_id = AccountId::new();

        let preview = registry
            .create(
                account_id.clone(),
                PreviewKind::ExplorerAction,
                "trash",
                json!({}),
                json!({}),
                vec!["m1".to_string()],
                json!([]),
                Vec::new(),
            )
            .await
            .unwrap();

        let err = registry.commit(&account_id, &preview.id, false).await.unwrap_err();
        assert!(matches!(err, CoreError::PreviewRequiresConfirm));
    }

    #[tokio::test]
    async fn commit_for_wrong_account_is_not_found() {
        let pool = setup().await;
        let registry = PreviewRegistry::new(&pool, DEFAULT_TTL_MINUTES);
        let account_id = AccountId::new();
        let other_account = AccountId::new();

        let preview = registry
            .create(
                account_id,
                PreviewKind::ExplorerAction,
                "trash",
                json!({}),
                json!({}),
                vec!["m1".to_string()],
                json!([]),
                Vec::new(),
            )
            .await
            .unwrap();

        let err = registry
            .commit(&other_account, &preview.id, true)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::PreviewNotFound(_)));
    }

    #[tokio::test]
    async fn explorer_trash_without_dedup_keys_fails_validation() {
        let pool = setup().await;
        let registry = PreviewRegistry::new(&pool, DEFAULT_TTL_MINUTES);
        let account_id = AccountId::new();

        let preview = registry
            .create(
                account_id.clone(),
                PreviewKind::ExplorerAction,
                "trash",
                json!({}),
                json!({}),
                vec!["m1".to_string()],
                json!([]),
                Vec::new(),
            )
            .await
            .unwrap();

        // No media_index row exists for "m1", so no dedup_key is resolvable.
        let err = registry.commit(&account_id, &preview.id, true).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
