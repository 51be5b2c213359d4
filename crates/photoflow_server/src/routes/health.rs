//! `GET /healthz`: liveness/readiness, confirming the store is reachable.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, Json(json!({"status": "ok"}))),
        Err(err) => {
            tracing::error!(error = %err, "healthz: store unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unavailable", "error": err.to_string()})),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoflow_core::CancelRegistry;
    use photoflow_db::{create_pool, DbConfig};

    #[tokio::test]
    async fn healthz_reports_ok_against_a_reachable_store() {
        let pool = create_pool(DbConfig::memory()).await.unwrap();
        let state = AppState {
            pool,
            cancel_registry: CancelRegistry::default(),
            preview_ttl_minutes: 30,
        };

        let (status, _) = healthz(State(state)).await;
        assert_eq!(status, StatusCode::OK);
    }
}
