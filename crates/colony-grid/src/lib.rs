//! Cell grid and Life transition for the Colony simulation.
//!
//! This crate is pure data and logic with no I/O and no locking. The
//! concurrent wrapper that the simulation loop, the mutation gateway and the
//! snapshot broadcaster share lives in `colony-core`.
//!
//! # Modules
//!
//! - [`cell`] -- [`Color`], [`Slot`], [`Position`], and the [`LiveCell`] /
//!   [`CellRecord`] projections used for broadcast and storage.
//! - [`grid`] -- The bounded [`Grid`], its mutations, and [`Grid::step`].
//! - [`pattern`] -- Ad-hoc and preset [`Pattern`]s for batch spawns.
//! - [`error`] -- [`GridError`].

pub mod cell;
pub mod error;
pub mod grid;
pub mod pattern;

pub use cell::{CellRecord, Color, LiveCell, Position, Slot};
pub use error::GridError;
pub use grid::Grid;
pub use pattern::{PRESETS, Pattern};
