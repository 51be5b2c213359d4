//! `GET /operations/catalog`: the merged static-provider + native-RPC
//! operation list, read straight from `photoflow_adapters::catalog`.

use axum::Json;
use serde_json::Value;

pub async fn list_operations() -> Json<Vec<Value>> {
    Json(photoflow_adapters::catalog::catalog_entries())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_operations_is_non_empty() {
        let Json(entries) = list_operations().await;
        assert!(!entries.is_empty());
    }
}
