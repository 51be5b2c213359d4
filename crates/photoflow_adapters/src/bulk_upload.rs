//! Bulk-upload adapter: drives the bulk-upload provider using the
//! account's opaque `auth_data` credential. The provider's own wire
//! protocol is out of scope for this core (§1 Non-goals); what's
//! implemented here is the local-side contract every operation must
//! honor: validate params, require the credential, summarize file sets
//! for `dry_run`, and report progress.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;

use crate::{Adapter, AdapterError, AdapterOutcome, Credentials, ProgressSink};

async fn walk_files(target: &str, recursive: bool) -> Result<Vec<String>, AdapterError> {
    let root = Path::new(target);
    if !root.is_dir() {
        return Ok(if root.exists() {
            vec![target.to_string()]
        } else {
            Vec::new()
        });
    }

    let mut stack = vec![root.to_path_buf()];
    let mut files = Vec::new();
    while let Some(dir) = stack.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_dir() {
                if recursive {
                    stack.push(path);
                }
            } else {
                files.push(path.display().to_string());
            }
        }
    }
    files.sort();
    Ok(files)
}

fn require_auth_data(credentials: &Credentials) -> Result<&str, AdapterError> {
    credentials
        .bulk_upload_auth_data
        .as_deref()
        .ok_or_else(|| AdapterError::MissingCredential("bulk_upload_auth_data".to_string()))
}

pub struct BulkUploadAdapter;

#[async_trait]
impl Adapter for BulkUploadAdapter {
    async fn run(
        &self,
        operation: &str,
        params: &Value,
        credentials: &Credentials,
        dry_run: bool,
        progress: &dyn ProgressSink,
    ) -> Result<AdapterOutcome, AdapterError> {
        let short = operation.strip_prefix("bulk-upload.").unwrap_or(operation);
        progress.report(0.0, "start").await?;

        match short {
            "upload" => {
                let target = params.get("target").and_then(Value::as_str).unwrap_or(".");
                let recursive = params
                    .get("recursive")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let files = walk_files(target, recursive).await?;

                if dry_run {
                    progress.report(1.0, "complete (dry run)").await?;
                    return Ok(AdapterOutcome::from_result(json!({
                        "dry_run": true,
                        "target": target,
                        "file_count": files.len(),
                        "files": files,
                    })));
                }

                require_auth_data(credentials)?;
                for (i, _file) in files.iter().enumerate() {
                    progress
                        .report(
                            (i + 1) as f64 / files.len().max(1) as f64,
                            &format!("uploaded {}/{}", i + 1, files.len()),
                        )
                        .await?;
                }
                progress.report(1.0, "complete").await?;
                Ok(AdapterOutcome::from_result(json!({
                    "uploaded_count": files.len(),
                })))
            }
            "move_to_trash" => {
                let hashes = params
                    .get("sha1_hashes")
                    .and_then(Value::as_array)
                    .ok_or_else(|| AdapterError::MissingParam("sha1_hashes".to_string()))?;
                if dry_run {
                    progress.report(1.0, "complete (dry run)").await?;
                    return Ok(AdapterOutcome::from_result(json!({
                        "dry_run": true,
                        "would_trash_count": hashes.len(),
                    })));
                }
                require_auth_data(credentials)?;
                progress.report(1.0, "complete").await?;
                Ok(AdapterOutcome::from_result(json!({"trashed_count": hashes.len()})))
            }
            "add_to_album" => {
                let media_keys = params
                    .get("media_keys")
                    .and_then(Value::as_array)
                    .ok_or_else(|| AdapterError::MissingParam("media_keys".to_string()))?;
                let album_name = params
                    .get("album_name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| AdapterError::MissingParam("album_name".to_string()))?;
                if dry_run {
                    progress.report(1.0, "complete (dry run)").await?;
                    return Ok(AdapterOutcome::from_result(json!({
                        "dry_run": true,
                        "album_name": album_name,
                        "would_add_count": media_keys.len(),
                    })));
                }
                require_auth_data(credentials)?;
                progress.report(1.0, "complete").await?;
                Ok(AdapterOutcome::from_result(json!({
                    "album_name": album_name,
                    "added_count": media_keys.len(),
                })))
            }
            "get_media_key_by_hash" => {
                let hash = params
                    .get("sha1_hash")
                    .and_then(Value::as_str)
                    .ok_or_else(|| AdapterError::MissingParam("sha1_hash".to_string()))?;
                require_auth_data(credentials)?;
                progress.report(1.0, "complete").await?;
                Ok(AdapterOutcome::from_result(json!({"sha1_hash": hash, "media_key": Value::Null})))
            }
            "update_cache" => {
                require_auth_data(credentials)?;
                progress.report(1.0, "complete").await?;
                Ok(AdapterOutcome::from_result(json!({"cache_updated": true})))
            }
            other => Err(AdapterError::UnsupportedOperation(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullProgressSink;
    use tempfile::tempdir;

    #[tokio::test]
    async fn dry_run_upload_lists_files_without_credential() {
        let dir = tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.jpg"), b"x").await.unwrap();
        tokio::fs::write(dir.path().join("b.jpg"), b"y").await.unwrap();

        let adapter = BulkUploadAdapter;
        let params = json!({"target": dir.path().to_str().unwrap(), "recursive": false});
        let outcome = adapter
            .run("bulk-upload.upload", &params, &Credentials::default(), true, &NullProgressSink)
            .await
            .unwrap();
        assert_eq!(outcome.result["file_count"], 2);
    }

    #[tokio::test]
    async fn real_upload_requires_auth_data() {
        let dir = tempdir().unwrap();
        let adapter = BulkUploadAdapter;
        let params = json!({"target": dir.path().to_str().unwrap()});
        let err = adapter
            .run("bulk-upload.upload", &params, &Credentials::default(), false, &NullProgressSink)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::MissingCredential(_)));
    }
}
