use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("cookie jar is empty, cannot bootstrap a session")]
    EmptyCookieJar,

    #[error("session bootstrap could not find required fields (f.sid/bl/at) in the response")]
    SessionBootstrapIncomplete,

    #[error("transport error talking to the provider: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("no wrb.fr envelope found in response body")]
    MissingEnvelope,

    #[error("wrb.fr envelope payload was empty or malformed")]
    MalformedEnvelope,

    #[error("failed to decode response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("session state is missing fSid/bl/path/at")]
    IncompleteSession,

    #[error("rpc call exhausted all {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

impl RpcError {
    /// Whether this failure should trigger a session re-bootstrap before the
    /// next retry, mirroring the 401/403 branch in the reference client.
    pub fn should_rebootstrap(&self) -> bool {
        matches!(self, RpcError::HttpStatus { status: 401 | 403 })
    }
}
