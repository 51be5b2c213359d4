//! Advanced passthrough adapter: `advanced.rpc_execute` bypasses the
//! operation catalog entirely and sends a caller-supplied rpcid/payload
//! straight through the RPC client. Any other `advanced.*` operation is
//! an alias for a native-rpc catalog entry; the job executor re-dispatches
//! those by stripping the `advanced.` prefix and routing through
//! `NativeRpcAdapter` before this adapter ever sees them.

use async_trait::async_trait;
use photoflow_rpc::{RpcClient, RpcClientConfig};
use serde_json::Value;

use crate::{Adapter, AdapterError, AdapterOutcome, Credentials, ProgressSink};

pub struct AdvancedAdapter {
    config: RpcClientConfig,
}

impl AdvancedAdapter {
    pub fn new(config: RpcClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Adapter for AdvancedAdapter {
    async fn run(
        &self,
        operation: &str,
        params: &Value,
        credentials: &Credentials,
        dry_run: bool,
        progress: &dyn ProgressSink,
    ) -> Result<AdapterOutcome, AdapterError> {
        let short = operation.strip_prefix("advanced.").unwrap_or(operation);
        if short != "rpc_execute" {
            return Err(AdapterError::UnsupportedOperation(operation.to_string()));
        }

        let rpcid = params
            .get("rpcid")
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::MissingParam("rpcid".to_string()))?;
        let request_data = params.get("requestData").cloned().unwrap_or(Value::Array(vec![]));
        let source_path = params
            .get("sourcePath")
            .and_then(Value::as_str)
            .unwrap_or("/");
        let force_bootstrap = params
            .get("forceBootstrap")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        progress.report(0.0, "start").await?;

        if dry_run {
            progress.report(1.0, "complete (dry run)").await?;
            return Ok(AdapterOutcome::from_result(serde_json::json!({
                "dry_run": true,
                "rpcid": rpcid,
                "would_send": request_data,
            })));
        }

        let cookie_jar = credentials
            .cookie_jar
            .clone()
            .ok_or_else(|| AdapterError::MissingCredential("cookie_jar".to_string()))?;
        let client = RpcClient::new(cookie_jar, self.config.clone())?;

        let session = if force_bootstrap {
            client.bootstrap_session(source_path).await?
        } else {
            match &credentials.session_state {
                Some(session) => session.clone(),
                None => client.bootstrap_session(source_path).await?,
            }
        };

        progress.report(0.3, "sending rpc request").await?;
        let rpc_result = client
            .execute_rpc(session, rpcid, &request_data, source_path)
            .await?;

        progress.report(1.0, "complete").await?;

        Ok(AdapterOutcome {
            result: rpc_result.data,
            session: Some(rpc_result.session),
        })
    }
}
