//! REST endpoint handlers.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/grid` | Current snapshot with metadata |
//! | `GET` | `/api/status` | Size, generation, population, subscribers |
//! | `GET` | `/api/patterns` | Preset pattern names and offsets |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use colony_core::Snapshot;
use colony_grid::PRESETS;
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /api/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    /// Side length of the grid.
    pub size: usize,
    /// Current generation.
    pub generation: u64,
    /// Living cells.
    pub population: usize,
    /// Connected `WebSocket` sessions.
    pub subscribers: usize,
}

/// One entry of `GET /api/patterns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternInfo {
    /// Name to pass as `pattern` in a spawn message.
    pub name: &'static str,
    /// `[dx, dy]` offsets from the anchor.
    pub cells: Vec<[i64; 2]>,
}

async fn status(state: &AppState) -> StatusResponse {
    let world = state.world.status().await;
    StatusResponse {
        size: world.size,
        generation: world.generation,
        population: world.population,
        subscribers: state.registry.len().await,
    }
}

/// Serve a minimal HTML page showing the world counters and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let s = status(&state).await;

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Colony</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 640px;
        }}
        td {{ padding: 0.2rem 1rem 0.2rem 0; }}
        a {{ color: #58a6ff; }}
    </style>
</head>
<body>
    <h1>Colony</h1>
    <table>
        <tr><td>Grid</td><td>{size}x{size}</td></tr>
        <tr><td>Generation</td><td>{generation}</td></tr>
        <tr><td>Population</td><td>{population}</td></tr>
        <tr><td>Subscribers</td><td>{subscribers}</td></tr>
    </table>
    <h2>API</h2>
    <ul>
        <li><a href="/api/grid">/api/grid</a></li>
        <li><a href="/api/status">/api/status</a></li>
        <li><a href="/api/patterns">/api/patterns</a></li>
        <li>/ws (WebSocket, optional <code>?color=</code>)</li>
    </ul>
</body>
</html>"#,
        size = s.size,
        generation = s.generation,
        population = s.population,
        subscribers = s.subscribers,
    ))
}

/// Return the current snapshot.
pub async fn get_grid(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.world.snapshot().await)
}

/// Return the world counters.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(status(&state).await)
}

/// List the preset patterns.
pub async fn list_patterns() -> Json<Vec<PatternInfo>> {
    Json(
        PRESETS
            .iter()
            .map(|&(name, offsets)| PatternInfo {
                name,
                cells: offsets.iter().map(|&(dx, dy)| [dx, dy]).collect(),
            })
            .collect(),
    )
}
