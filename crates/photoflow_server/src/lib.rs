//! The HTTP surface: job CRUD, the preview/confirm endpoints, the
//! operation catalog, and the SSE event stream. Built with `axum`;
//! everything here is a thin translation from HTTP onto `photoflow_core`
//! and `photoflow_db` calls — no business logic lives in this crate.

pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::Server;
pub use state::AppState;
