//! Server startup helper for the engine binary.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerError, bind, serve};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Bind `host:port` and run the server on a background task.
///
/// The bind happens before the task is spawned, so a bad address or a port
/// already in use is reported to the caller instead of being logged from the
/// background. The task ends after the shutdown signal in `state` fires.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the listener cannot bind.
pub async fn spawn_server(
    host: &str,
    port: u16,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, StartupError> {
    let listener = bind(host, port).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, state).await {
            tracing::error!(error = %e, "Colony server exited with error");
        }
    });

    tracing::info!(host, port, "Colony server spawned on background task");

    Ok(handle)
}
