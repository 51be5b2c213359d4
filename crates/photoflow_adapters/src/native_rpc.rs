//! Native RPC adapter: resolves an operation against the [`catalog`],
//! builds the request, executes it through [`photoflow_rpc::RpcClient`],
//! and reshapes the reply through the rpcid parser registry.

use async_trait::async_trait;
use photoflow_rpc::{RpcClient, RpcClientConfig};
use serde_json::{json, Value};

use crate::{catalog, Adapter, AdapterError, AdapterOutcome, Credentials, ProgressSink};

pub struct NativeRpcAdapter {
    config: RpcClientConfig,
}

impl NativeRpcAdapter {
    pub fn new(config: RpcClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Adapter for NativeRpcAdapter {
    async fn run(
        &self,
        operation: &str,
        params: &Value,
        credentials: &Credentials,
        dry_run: bool,
        progress: &dyn ProgressSink,
    ) -> Result<AdapterOutcome, AdapterError> {
        let op = catalog::find(operation)
            .ok_or_else(|| AdapterError::UnsupportedOperation(operation.to_string()))?;

        progress.report(0.0, "start").await?;

        if dry_run {
            let request = (op.build_request)(params);
            progress.report(1.0, "complete (dry run)").await?;
            return Ok(AdapterOutcome::from_result(json!({
                "dry_run": true,
                "rpcid": op.rpcid,
                "would_send": request,
            })));
        }

        let cookie_jar = credentials
            .cookie_jar
            .clone()
            .ok_or_else(|| AdapterError::MissingCredential("cookie_jar".to_string()))?;

        let client = RpcClient::new(cookie_jar, self.config.clone())?;

        let session = match &credentials.session_state {
            Some(session) => session.clone(),
            None => client.bootstrap_session(op.source_path_hint).await?,
        };

        progress.report(0.2, "sending rpc request").await?;

        let request_data = (op.build_request)(params);
        let rpc_result = client
            .execute_rpc(session, op.rpcid, &request_data, op.source_path_hint)
            .await?;

        let decoded = catalog::parse_response_for(op.rpcid, &rpc_result.data);

        progress.report(1.0, "complete").await?;

        Ok(AdapterOutcome {
            result: decoded,
            session: Some(rpc_result.session),
        })
    }
}
