//! Axum router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router: the status page, the `WebSocket` endpoint,
/// and the read-only REST API. CORS allows any origin.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws", get(ws::ws_session))
        .route("/api/grid", get(handlers::get_grid))
        .route("/api/status", get(handlers::get_status))
        .route("/api/patterns", get(handlers::list_patterns))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
