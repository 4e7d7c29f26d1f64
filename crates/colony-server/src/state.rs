//! Shared application state for the Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use colony_core::{MutationGateway, ShutdownSignal, SubscriberRegistry, World};

/// Per-connection limits applied to every `WebSocket` session.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Capacity of each subscriber's snapshot queue.
    pub subscriber_queue: usize,
    /// Longest a single socket write may take before the subscriber is
    /// dropped.
    pub send_timeout: Duration,
    /// Most ad-hoc cells one `spawn` message may list.
    pub max_spawn_cells: usize,
}

/// State handed to every handler through [`axum::extract::State`].
#[derive(Debug, Clone)]
pub struct AppState {
    /// Read access to the grid.
    pub world: World,
    /// Write access to the grid.
    pub gateway: MutationGateway,
    /// Connected `WebSocket` subscribers.
    pub registry: Arc<SubscriberRegistry>,
    /// Per-connection limits.
    pub limits: SessionLimits,
    /// Fires when the process is shutting down.
    pub shutdown: ShutdownSignal,
}

impl AppState {
    /// Bundle the shared handles.
    pub fn new(
        gateway: MutationGateway,
        registry: Arc<SubscriberRegistry>,
        limits: SessionLimits,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            world: gateway.world().clone(),
            gateway,
            registry,
            limits,
            shutdown,
        }
    }
}
