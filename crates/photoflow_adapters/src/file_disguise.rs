//! File-disguise adapter: hides files inside image/video containers behind
//! a separator marker, or extracts previously-hidden payloads back out.
//! Operates purely on the local filesystem; no credentials required.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::{Adapter, AdapterError, AdapterOutcome, Credentials, ProgressSink};

const DEFAULT_SEPARATOR: &str = "FILE_DATA_BEGIN";
const DEFAULT_RESTORED_SUFFIX: &str = ".restored";

fn string_list(params: &Value, key: &str) -> Result<Vec<String>, AdapterError> {
    params
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .ok_or_else(|| AdapterError::MissingParam(key.to_string()))
}

async fn hide_one(
    source: &Path,
    container: &Path,
    separator: &str,
) -> Result<PathBuf, AdapterError> {
    let payload = tokio::fs::read(source).await?;
    let mut out = tokio::fs::File::create(container).await?;
    out.write_all(separator.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.write_all(&payload).await?;
    Ok(container.to_path_buf())
}

async fn extract_one(
    container: &Path,
    output: &Path,
    separator: &str,
) -> Result<PathBuf, AdapterError> {
    let mut data = Vec::new();
    tokio::fs::File::open(container)
        .await?
        .read_to_end(&mut data)
        .await?;

    let marker = format!("{separator}\n");
    let marker_bytes = marker.as_bytes();
    let position = data
        .windows(marker_bytes.len())
        .position(|window| window == marker_bytes)
        .ok_or_else(|| {
            AdapterError::InvalidParam {
                name: "files".to_string(),
                reason: format!("separator '{separator}' not found in container"),
            }
        })?;

    let payload = &data[position + marker_bytes.len()..];
    tokio::fs::write(output, payload).await?;
    Ok(output.to_path_buf())
}

pub struct FileDisguiseAdapter;

#[async_trait]
impl Adapter for FileDisguiseAdapter {
    async fn run(
        &self,
        operation: &str,
        params: &Value,
        _credentials: &Credentials,
        dry_run: bool,
        progress: &dyn ProgressSink,
    ) -> Result<AdapterOutcome, AdapterError> {
        let short = operation.strip_prefix("file-disguise.").unwrap_or(operation);
        let files = string_list(params, "files")?;
        let separator = params
            .get("separator")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SEPARATOR);

        progress.report(0.0, "start").await?;

        match short {
            "hide" => {
                if dry_run {
                    progress.report(1.0, "complete (dry run)").await?;
                    return Ok(AdapterOutcome::from_result(json!({
                        "dry_run": true,
                        "would_hide": files,
                        "separator": separator,
                    })));
                }
                let output_dir = params.get("output").and_then(Value::as_str);
                let mut containers = Vec::new();
                for (i, file) in files.iter().enumerate() {
                    let source = PathBuf::from(file);
                    let container = match output_dir {
                        Some(dir) => PathBuf::from(dir).join(
                            source.file_name().unwrap_or_default(),
                        ),
                        None => source.with_extension("disguised"),
                    };
                    containers.push(hide_one(&source, &container, separator).await?);
                    progress
                        .report(
                            (i + 1) as f64 / files.len().max(1) as f64,
                            &format!("hid {}/{}", i + 1, files.len()),
                        )
                        .await?;
                }
                progress.report(1.0, "complete").await?;
                Ok(AdapterOutcome::from_result(json!({
                    "containers": containers.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
                })))
            }
            "extract" => {
                if dry_run {
                    progress.report(1.0, "complete (dry run)").await?;
                    return Ok(AdapterOutcome::from_result(json!({
                        "dry_run": true,
                        "would_extract": files,
                        "separator": separator,
                    })));
                }
                let suffix = params
                    .get("suffix")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_RESTORED_SUFFIX);
                let output_dir = params.get("output").and_then(Value::as_str);
                let mut restored = Vec::new();
                for (i, file) in files.iter().enumerate() {
                    let container = PathBuf::from(file);
                    let output = match output_dir {
                        Some(dir) => PathBuf::from(dir).join(format!(
                            "{}{}",
                            container.file_name().and_then(|n| n.to_str()).unwrap_or("restored"),
                            suffix
                        )),
                        None => {
                            let mut name = container.as_os_str().to_os_string();
                            name.push(suffix);
                            PathBuf::from(name)
                        }
                    };
                    restored.push(extract_one(&container, &output, separator).await?);
                    progress
                        .report(
                            (i + 1) as f64 / files.len().max(1) as f64,
                            &format!("extracted {}/{}", i + 1, files.len()),
                        )
                        .await?;
                }
                progress.report(1.0, "complete").await?;
                Ok(AdapterOutcome::from_result(json!({
                    "restored": restored.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
                })))
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
    async fn hide_then_extract_round_trips() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("secret.txt");
        tokio::fs::write(&source, b"hidden payload").await.unwrap();

        let adapter = FileDisguiseAdapter;
        let params = json!({"files": [source.to_str().unwrap()], "output": dir.path().to_str().unwrap()});
        let outcome = adapter
            .run(
                "file-disguise.hide",
                &params,
                &Credentials::default(),
                false,
                &NullProgressSink,
            )
            .await
            .unwrap();
        let container = outcome.result["containers"][0].as_str().unwrap().to_string();

        let extract_params = json!({"files": [container]});
        let restored = adapter
            .run(
                "file-disguise.extract",
                &extract_params,
                &Credentials::default(),
                false,
                &NullProgressSink,
            )
            .await
            .unwrap();
        let restored_path = restored.result["restored"][0].as_str().unwrap();
        let content = tokio::fs::read(restored_path).await.unwrap();
        assert_eq!(content, b"hidden payload");
    }

    #[tokio::test]
    async fn dry_run_hide_touches_nothing() {
        let adapter = FileDisguiseAdapter;
        let params = json!({"files": ["whatever.txt"]});
        let outcome = adapter
            .run(
                "file-disguise.hide",
                &params,
                &Credentials::default(),
                true,
                &NullProgressSink,
            )
            .await
            .unwrap();
        assert_eq!(outcome.result["dry_run"], true);
    }
}
