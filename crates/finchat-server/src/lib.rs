//! HTTP surface for finchat
//!
//! Serves stock details, one-month price charts and the chat endpoint over
//! axum. The binary in `main.rs` wires the Gemini provider and the Yahoo
//! gateway into [`AppState`] and calls [`serve`].

pub mod config;
pub mod error;
pub mod routes;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::{AppState, ChatRequest, SESSION_HEADER, router};

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Run the server until Ctrl+C
///
/// Also sweeps expired chat sessions every `cleanup_interval`.
pub async fn serve(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let sessions = Arc::clone(state.bridge.sessions());
    let interval = config.cleanup_interval;
    let cleanup = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            sessions.cleanup_expired().await;
        }
    });

    let app = router(state, config.cors_permissive);
    let listener = TcpListener::bind(config.bind).await?;
    info!(
        bind = %config.bind,
        cors = config.cors_permissive,
        session_ttl_secs = config.session_ttl.as_secs(),
        "finchat server listening"
    );

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cleanup.abort();
    info!("finchat server stopped");
    Ok(result?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
