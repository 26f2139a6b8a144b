//! Server execution logic.

use std::future::Future;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::Timings;
use crate::domain::CredentialVerifier;
use crate::realtime::Dispatcher;

use super::{
    handler::{debug_hubs, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Whiteboard collaboration server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(dispatcher, verifier, Timings::default());
/// server.run("127.0.0.1".to_string(), 8082).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        verifier: Arc<dyn CredentialVerifier>,
        timings: Timings,
    ) -> Self {
        let registry = dispatcher.registry().clone();
        Self {
            state: Arc::new(AppState {
                dispatcher,
                registry,
                verifier,
                timings,
            }),
        }
    }

    /// Routes of the server
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/debug/hubs", get(debug_hubs))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind to `host:port` and serve until Ctrl+C / SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Kokuban server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let reaper = self.state.registry.spawn_reaper();
        let app = self.router();

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        reaper.abort();
        tracing::info!("Server shutdown complete");
        result
    }
}
