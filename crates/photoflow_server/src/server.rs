//! HTTP server with graceful shutdown. Grounded on the acton-service
//! `Server::serve` idiom, trimmed to the `trace` and `cors` layers this
//! workspace actually declares in `tower-http`.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub struct Server {
    bind_addr: SocketAddr,
    state: AppState,
}

impl Server {
    pub fn new(bind_addr: SocketAddr, state: AppState) -> Self {
        Self { bind_addr, state }
    }

    pub async fn serve(self, mut shutdown: tokio::sync::watch::Receiver<bool>) -> std::io::Result<()> {
        let app: Router = crate::routes::router(self.state)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http());

        let listener = TcpListener::bind(self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "http server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
                tracing::info!("http server shutting down");
            })
            .await
    }
}
