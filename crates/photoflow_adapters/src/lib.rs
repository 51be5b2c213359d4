//! Per-provider adapters: each translates an operation + params into
//! concrete work against a provider, honoring `dry_run` and reporting
//! progress through a caller-supplied sink.

pub mod advanced;
pub mod bulk_upload;
pub mod catalog;
pub mod error;
pub mod file_disguise;
pub mod indexer;
pub mod native_rpc;
pub mod pipeline;
pub mod safety;

pub use advanced::AdvancedAdapter;
pub use bulk_upload::BulkUploadAdapter;
pub use error::AdapterError;
pub use file_disguise::FileDisguiseAdapter;
pub use indexer::IndexerAdapter;
pub use native_rpc::NativeRpcAdapter;
pub use pipeline::PipelineAdapter;

use async_trait::async_trait;
use photoflow_protocol::{CookieJar, SessionState};
use serde_json::Value;

/// Opaque per-account secrets an adapter may need. Adapters pull out only
/// the fields their provider uses; the rest are ignored.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub cookie_jar: Option<CookieJar>,
    pub session_state: Option<SessionState>,
    pub bulk_upload_auth_data: Option<String>,
}

/// Callback an adapter reports progress through. Implemented by the job
/// executor in `photoflow_core`, which persists the update to the store and
/// re-checks `cancel_requested`; a `Cancelled` error returned here should
/// propagate straight back up through the adapter's `run`.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, value: f64, message: &str) -> Result<(), AdapterError>;
}

/// A no-op sink for dry runs and tests.
pub struct NullProgressSink;

#[async_trait]
impl ProgressSink for NullProgressSink {
    async fn report(&self, _value: f64, _message: &str) -> Result<(), AdapterError> {
        Ok(())
    }
}

/// The result of a completed adapter call.
#[derive(Debug, Clone, Default)]
pub struct AdapterOutcome {
    pub result: Value,
    /// Present when a native-RPC call refreshed the session; the caller
    /// persists it to the account on success.
    pub session: Option<SessionState>,
}

impl AdapterOutcome {
    pub fn from_result(result: Value) -> Self {
        Self {
            result,
            session: None,
        }
    }
}

#[async_trait]
pub trait Adapter: Send + Sync {
    async fn run(
        &self,
        operation: &str,
        params: &Value,
        credentials: &Credentials,
        dry_run: bool,
        progress: &dyn ProgressSink,
    ) -> Result<AdapterOutcome, AdapterError>;
}
