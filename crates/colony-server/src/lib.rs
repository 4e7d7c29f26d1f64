//! HTTP and `WebSocket` surface for the Colony simulation.
//!
//! - **`WebSocket` endpoint** (`/ws`): each connection is a subscriber that
//!   receives periodic snapshot frames and may send `flip` / `spawn`
//!   messages.
//! - **REST endpoints** for reading the grid, its counters, and the preset
//!   patterns.
//! - **Minimal HTML status page** (`GET /`).
//!
//! Handlers never touch the grid directly: reads go through
//! [`World`](colony_core::World) snapshots and writes through the
//! [`MutationGateway`](colony_core::MutationGateway).

pub mod error;
pub mod handlers;
pub mod protocol;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, bind, serve};
pub use startup::{StartupError, spawn_server};
pub use state::{AppState, SessionLimits};
