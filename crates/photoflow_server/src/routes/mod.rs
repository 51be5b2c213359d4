//! Route handlers, grouped by the resource they serve.

pub mod actions;
pub mod catalog;
pub mod health;
pub mod jobs;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/jobs", post(jobs::create_job).get(jobs::list_jobs))
        .route("/jobs/stream", get(jobs::stream_jobs))
        .route("/jobs/:id", get(jobs::get_job))
        .route("/jobs/:id/cancel", post(jobs::cancel_job))
        .route(
            "/actions/preview",
            post(actions::preview_explorer_action),
        )
        .route("/actions/commit", post(actions::commit_preview))
        .route("/uploads/preview", post(actions::preview_upload))
        .route("/uploads/commit", post(actions::commit_preview))
        .route(
            "/pipeline/disguise_upload/preview",
            post(actions::preview_pipeline_disguise_upload),
        )
        .route("/pipeline/disguise_upload/commit", post(actions::commit_preview))
        .route("/advanced/preview", post(actions::preview_advanced))
        .route("/advanced/commit", post(actions::commit_preview))
        .route("/operations/catalog", get(catalog::list_operations))
        .route("/healthz", get(health::healthz))
        .with_state(state)
}
