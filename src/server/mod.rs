//! HTTP front-end over the loaded classifier.

pub mod routes;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::model::ModelHandle;

pub use routes::{app_routes, validate_submission};

/// Application state shared across handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub model: ModelHandle,
    /// Minimum submission length in characters.
    pub min_chars: usize,
}

impl AppState {
    pub fn new(model: ModelHandle, config: &ServerConfig) -> Self {
        Self {
            model,
            min_chars: config.min_chars,
        }
    }
}

/// Serve `state` on an already-bound listener until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "HTTP server started");
    axum::serve(listener, app_routes(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        // No signal handler available; run until the process is killed.
        Err(_) => std::future::pending::<()>().await,
    }
}
