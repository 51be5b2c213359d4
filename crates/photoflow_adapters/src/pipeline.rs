//! Pipeline adapter: disguise-then-upload. Hides the input files into
//! containers in a temp directory, then uploads the produced containers.
//! Progress is sub-scaled: disguise fills 0.08→0.50, upload 0.55→0.95.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::bulk_upload::BulkUploadAdapter;
use crate::file_disguise::FileDisguiseAdapter;
use crate::{Adapter, AdapterError, AdapterOutcome, Credentials, ProgressSink};

struct ScaledSink<'a> {
    inner: &'a dyn ProgressSink,
    lo: f64,
    hi: f64,
}

#[async_trait]
impl<'a> ProgressSink for ScaledSink<'a> {
    async fn report(&self, value: f64, message: &str) -> Result<(), AdapterError> {
        let scaled = self.lo + value.clamp(0.0, 1.0) * (self.hi - self.lo);
        self.inner.report(scaled, message).await
    }
}

pub struct PipelineAdapter;

#[async_trait]
impl Adapter for PipelineAdapter {
    async fn run(
        &self,
        _operation: &str,
        params: &Value,
        credentials: &Credentials,
        dry_run: bool,
        progress: &dyn ProgressSink,
    ) -> Result<AdapterOutcome, AdapterError> {
        let keep_artifacts = params
            .get("keep_artifacts")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let temp_dir = tempfile::tempdir()?;

        progress.report(0.0, "start").await?;

        let disguise_params = json!({
            "files": params.get("files").cloned().unwrap_or(json!([])),
            "output": temp_dir.path().to_str(),
            "separator": params.get("separator").cloned().unwrap_or(json!("FILE_DATA_BEGIN")),
        });
        let disguise_sink = ScaledSink {
            inner: progress,
            lo: 0.08,
            hi: 0.50,
        };
        let disguised = FileDisguiseAdapter
            .run("file-disguise.hide", &disguise_params, credentials, dry_run, &disguise_sink)
            .await?;

        if dry_run {
            progress.report(1.0, "complete (dry run)").await?;
            return Ok(AdapterOutcome::from_result(json!({
                "dry_run": true,
                "disguise": disguised.result,
            })));
        }

        let containers = disguised.result["containers"].clone();
        let upload_params = json!({
            "target": temp_dir.path().to_str(),
            "recursive": false,
        });
        let upload_sink = ScaledSink {
            inner: progress,
            lo: 0.55,
            hi: 0.95,
        };
        let uploaded = BulkUploadAdapter
            .run("bulk-upload.upload", &upload_params, credentials, false, &upload_sink)
            .await?;

        if !keep_artifacts {
            let _ = tokio::fs::remove_dir_all(temp_dir.path()).await;
        }

        progress.report(1.0, "complete").await?;
        Ok(AdapterOutcome::from_result(json!({
            "containers": containers,
            "upload": uploaded.result,
        })))
    }
}
