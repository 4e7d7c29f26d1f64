//! The single shared, lock-guarded grid.
//!
//! [`World`] is the only owner of the live [`Grid`]. Every access goes
//! through one [`tokio::sync::Mutex`]:
//!
//! - the mutation gateway holds it for one `flip` or `spawn`;
//! - the simulation loop holds it for one full transition;
//! - the broadcaster holds it only long enough to copy out a [`Snapshot`].
//!
//! The lock is never nested and never held across network or storage I/O.
//! Callers outside this crate can read snapshots and status but cannot reach
//! the grid itself.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use colony_grid::Grid;
use rand::Rng;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::simulation::{SimulationError, TickSummary};
use crate::snapshot::Snapshot;

#[derive(Debug)]
struct WorldState {
    grid: Grid,
    generation: u64,
}

/// Cheap-to-clone handle to the shared grid.
#[derive(Debug, Clone)]
pub struct World {
    state: Arc<Mutex<WorldState>>,
    size: usize,
}

/// Counters describing the world at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorldStatus {
    /// Side length of the grid.
    pub size: usize,
    /// Number of transitions applied since startup.
    pub generation: u64,
    /// Number of living cells.
    pub population: usize,
}

impl World {
    /// Take ownership of `grid` as the shared world at generation 0.
    pub fn new(grid: Grid) -> Self {
        let size = grid.size();
        Self {
            state: Arc::new(Mutex::new(WorldState {
                grid,
                generation: 0,
            })),
            size,
        }
    }

    /// Side length of the grid. Fixed for the life of the world.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Copy every living cell out under a brief lock.
    pub async fn snapshot(&self) -> Snapshot {
        let (generation, cells) = {
            let state = self.state.lock().await;
            (state.generation, state.grid.live_cells())
        };
        Snapshot::new(generation, self.size, cells)
    }

    /// Current generation and population.
    pub async fn status(&self) -> WorldStatus {
        let state = self.state.lock().await;
        WorldStatus {
            size: self.size,
            generation: state.generation,
            population: state.grid.population(),
        }
    }

    /// Run `f` against the grid with exclusive access.
    pub(crate) async fn mutate<T>(&self, f: impl FnOnce(&mut Grid) -> T) -> T {
        let mut state = self.state.lock().await;
        f(&mut state.grid)
    }

    /// Replace the grid with its next generation.
    ///
    /// A panic inside the transition is caught and reported; the grid and
    /// generation counter are left unchanged in that case.
    pub(crate) async fn advance<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<TickSummary, SimulationError> {
        let mut state = self.state.lock().await;
        let next = std::panic::catch_unwind(AssertUnwindSafe(|| state.grid.step(rng)))
            .map_err(|payload| SimulationError::StepPanicked {
                message: panic_message(payload.as_ref()),
            })?;
        state.grid = next;
        state.generation = state.generation.saturating_add(1);
        Ok(TickSummary {
            generation: state.generation,
            population: state.grid.population(),
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
