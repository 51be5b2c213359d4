//! The core crate's composed error type. The HTTP layer maps each variant
//! to a status code; see SPEC §7 for the observable names.

use photoflow_adapters::AdapterError;
use photoflow_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("store error: {0}")]
    Db(#[from] DbError),

    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("preview not found: {0}")]
    PreviewNotFound(String),

    #[error("preview expired: {0}")]
    PreviewExpired(String),

    #[error("preview already committed or invalid: {0}")]
    PreviewAlreadyCommitted(String),

    #[error("commit requires explicit confirm=true")]
    PreviewRequiresConfirm,

    #[error("destructive operation requires params.confirmed=true after dry-run")]
    DestructiveRequiresConfirmed,
}

impl CoreError {
    /// Coarse HTTP status mapping; the server layer still owns the body shape.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AccountNotFound(_) | Self::JobNotFound(_) => 404,
            Self::Validation(_)
            | Self::PreviewNotFound(_)
            | Self::PreviewExpired(_)
            | Self::PreviewAlreadyCommitted(_)
            | Self::PreviewRequiresConfirm
            | Self::DestructiveRequiresConfirmed => 400,
            Self::Db(_) | Self::Adapter(_) => 500,
        }
    }
}
