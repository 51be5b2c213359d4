//! Shared application state handed to every axum handler.

use photoflow_core::CancelRegistry;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub cancel_registry: CancelRegistry,
    pub preview_ttl_minutes: i64,
}
