//! Shared world state and the concurrent machinery around it.
//!
//! The [`World`] owns the only live [`Grid`](colony_grid::Grid) behind a
//! single lock. Three kinds of tasks use it:
//!
//! - [`Simulation`] advances it one generation per tick;
//! - [`MutationGateway`] applies `flip` and `spawn` requests from actors;
//! - [`Broadcaster`] copies out a [`Snapshot`] and fans it out to the
//!   [`SubscriberRegistry`].
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with environment overrides.
//! - [`world`] -- [`World`] and [`WorldStatus`].
//! - [`simulation`] -- The periodic tick loop.
//! - [`gateway`] -- Synchronized mutations.
//! - [`registry`] -- Connected subscribers.
//! - [`broadcast`] -- Periodic snapshot fan-out.
//! - [`snapshot`] -- Immutable views of the live cells.
//! - [`shutdown`] -- Stop signal for the loops.

pub mod broadcast;
pub mod config;
pub mod gateway;
pub mod registry;
pub mod shutdown;
pub mod simulation;
pub mod snapshot;
pub mod world;

pub use broadcast::{BroadcastReport, Broadcaster};
pub use config::{ColonyConfig, ConfigError, LogFormat};
pub use gateway::{GatewayError, MutationGateway, PersistBatch};
pub use registry::{SnapshotSender, SubscriberId, SubscriberRegistry};
pub use shutdown::{ShutdownSignal, ShutdownTrigger, shutdown_channel};
pub use simulation::{Simulation, SimulationError, TickSummary};
pub use snapshot::Snapshot;
pub use world::{World, WorldStatus};
