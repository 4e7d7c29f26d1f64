//! Immutable point-in-time view of the living cells.
//!
//! A [`Snapshot`] is captured under the world lock, then released to the
//! broadcaster and shared by every subscriber through an [`Arc`]. It is
//! never mutated after capture.
//!
//! [`Arc`]: std::sync::Arc

use chrono::{DateTime, Utc};
use colony_grid::LiveCell;
use serde::Serialize;

/// Every living cell at one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    generation: u64,
    taken_at: DateTime<Utc>,
    size: usize,
    cells: Vec<LiveCell>,
}

impl Snapshot {
    /// Wrap cells copied out of the grid at `generation`.
    pub fn new(generation: u64, size: usize, cells: Vec<LiveCell>) -> Self {
        Self {
            generation,
            taken_at: Utc::now(),
            size,
            cells,
        }
    }

    /// Generation the cells belong to.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Wall-clock capture time.
    pub const fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Side length of the grid the cells were taken from.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Living cells in row-major order.
    pub fn cells(&self) -> &[LiveCell] {
        &self.cells
    }

    /// Encode the wire frame sent to subscribers: a bare JSON array of
    /// `[x, y, color]` triples.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.cells)
    }
}
