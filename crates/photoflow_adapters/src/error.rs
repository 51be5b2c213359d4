use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("missing required param '{0}'")]
    MissingParam(String),

    #[error("invalid param '{name}': {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error(transparent)]
    Rpc(#[from] photoflow_rpc::RpcError),

    #[error(transparent)]
    Db(#[from] photoflow_db::DbError),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("job was cancelled")]
    Cancelled,
}
