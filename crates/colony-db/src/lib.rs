//! Persistence layer for the Colony simulation.
//!
//! The grid lives in memory; this crate keeps a best-effort copy of the last
//! known state of each position in `SQLite` so a restarted process can
//! hydrate from it.
//!
//! # Modules
//!
//! - [`sqlite`] -- Connection pool, configuration, and migrations.
//! - [`cell_store`] -- Reads and upserts on the `cells` table.
//! - [`writer`] -- Batched background writer fed by the mutation gateway.
//! - [`error`] -- [`DbError`].

pub mod cell_store;
pub mod error;
pub mod sqlite;
pub mod writer;

pub use cell_store::CellStore;
pub use error::DbError;
pub use sqlite::{CellDb, SqliteConfig};
pub use writer::{WriterStats, spawn_persistence_writer};
