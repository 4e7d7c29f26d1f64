//! Periodic driver that advances the world one generation per tick.
//!
//! Each tick takes the world lock for exactly one full transition. A tick
//! that panics is logged and skipped; the loop keeps going with the grid it
//! had before. The loop only ends when the shutdown signal fires.

use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::shutdown::ShutdownSignal;
use crate::world::World;

/// Errors that can occur while advancing one generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    /// The transition function panicked. The tick was discarded.
    #[error("simulation step panicked: {message}")]
    StepPanicked {
        /// Panic payload, when it was a string.
        message: String,
    },
}

/// Outcome of one successful tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    /// Generation reached by this tick.
    pub generation: u64,
    /// Living cells after the tick.
    pub population: usize,
}

/// The simulation loop.
#[derive(Debug)]
pub struct Simulation<R> {
    world: World,
    rng: R,
    interval: Duration,
}

impl<R: Rng + Send + 'static> Simulation<R> {
    /// Create a loop that advances `world` every `interval`.
    pub const fn new(world: World, rng: R, interval: Duration) -> Self {
        Self {
            world,
            rng,
            interval,
        }
    }

    /// Advance the world by exactly one generation.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::StepPanicked`] if the transition panicked.
    pub async fn tick(&mut self) -> Result<TickSummary, SimulationError> {
        self.world.advance(&mut self.rng).await
    }

    /// Tick until `shutdown` fires. Returns the number of ticks that failed.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) -> u64 {
        info!(
            interval_ms = self.interval.as_millis(),
            size = self.world.size(),
            "Simulation loop started"
        );
        let mut failed: u64 = 0;
        loop {
            if shutdown.is_triggered() {
                break;
            }
            match self.tick().await {
                Ok(summary) => debug!(
                    generation = summary.generation,
                    population = summary.population,
                    "Tick complete"
                ),
                Err(e) => {
                    failed = failed.saturating_add(1);
                    error!(error = %e, failed, "Tick skipped");
                }
            }
            tokio::select! {
                () = shutdown.wait() => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }
        let generation = self.world.status().await.generation;
        info!(generation, failed, "Simulation loop stopped");
        failed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use colony_grid::{Grid, Pattern};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::gateway::MutationGateway;
    use crate::shutdown::shutdown_channel;

    fn simulation(world: &World, interval: Duration) -> Simulation<SmallRng> {
        Simulation::new(world.clone(), SmallRng::seed_from_u64(3), interval)
    }

    #[tokio::test]
    async fn tick_advances_a_blinker() {
        let world = World::new(Grid::new(5).unwrap());
        let gateway = MutationGateway::new(world.clone());
        gateway
            .spawn(2, 1, &Pattern::named("blinker").unwrap(), None)
            .await
            .unwrap();

        let mut sim = simulation(&world, Duration::from_millis(1));
        let summary = sim.tick().await.unwrap();
        assert_eq!(summary, TickSummary { generation: 1, population: 3 });

        let xs: Vec<usize> = world.snapshot().await.cells().iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn run_ticks_on_schedule_and_stops_on_shutdown() {
        let world = World::new(Grid::new(4).unwrap());
        let (trigger, signal) = shutdown_channel();
        let handle = tokio::spawn(simulation(&world, Duration::from_millis(100)).run(signal));

        tokio::time::sleep(Duration::from_millis(450)).await;
        trigger.trigger();
        let failed = handle.await.unwrap();

        assert_eq!(failed, 0);
        assert_eq!(world.status().await.generation, 5);
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn run_future_is_send() {
        let world = World::new(Grid::new(4).unwrap());
        let (_trigger, signal) = shutdown_channel();
        let run = simulation(&world, Duration::from_millis(1)).run(signal);
        assert_send(&run);
    }

    #[tokio::test]
    async fn run_returns_immediately_if_already_stopped() {
        let world = World::new(Grid::new(4).unwrap());
        let (trigger, signal) = shutdown_channel();
        trigger.trigger();
        simulation(&world, Duration::from_secs(60)).run(signal).await;
        assert_eq!(world.status().await.generation, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_spawns_are_never_lost() {
        let world = World::new(Grid::new(40).unwrap());
        let gateway = MutationGateway::new(world.clone());
        let (trigger, signal) = shutdown_channel();
        let sim = tokio::spawn(simulation(&world, Duration::from_millis(1)).run(signal));

        let block = Arc::new(Pattern::named("block").unwrap());
        let mut handles = Vec::new();
        for i in 0..10_i64 {
            for j in 0..10_i64 {
                let gateway = gateway.clone();
                let block = Arc::clone(&block);
                handles.push(tokio::spawn(async move {
                    gateway.spawn(i * 4, j * 4, &block, None).await.unwrap();
                }));
            }
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Blocks are still lifes, so every spawned block must survive.
        let mut stepper = simulation(&world, Duration::from_millis(1));
        stepper.tick().await.unwrap();
        trigger.trigger();
        sim.await.unwrap();

        assert_eq!(world.status().await.population, 400);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_flips_each_apply_once() {
        let world = World::new(Grid::new(30).unwrap());
        let gateway = MutationGateway::new(world.clone());

        let mut handles = Vec::new();
        for i in 0..10_i64 {
            for j in 0..10_i64 {
                let gateway = gateway.clone();
                handles.push(tokio::spawn(async move {
                    gateway.flip(i * 3, j * 3, None).await.unwrap()
                }));
            }
        }
        for handle in handles {
            assert!(handle.await.unwrap().alive);
        }
        assert_eq!(world.status().await.population, 100);

        // Isolated cells all die of underpopulation.
        simulation(&world, Duration::from_millis(1)).tick().await.unwrap();
        assert_eq!(world.status().await.population, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_flips_match_serial_replay_while_running() {
        const SIZE: usize = 60;
        const SPACING: i64 = 6;
        // A boat is a still life; flipping its open corner turns it into a
        // ship, which is also a still life. Ticking never changes either.
        let boat = Pattern::new(vec![(0, 0), (0, 1), (1, 0), (1, 2), (2, 1)]);
        let anchors: Vec<(i64, i64)> = (0..10_i64)
            .flat_map(|i| (0..10_i64).map(move |j| (i * SPACING, j * SPACING)))
            .collect();
        let flips = |n: usize| n % 7 + 1;

        let world = World::new(Grid::new(SIZE).unwrap());
        let gateway = MutationGateway::new(world.clone());
        for &(x, y) in &anchors {
            gateway.spawn(x, y, &boat, None).await.unwrap();
        }

        let (trigger, signal) = shutdown_channel();
        let sim = tokio::spawn(simulation(&world, Duration::from_millis(1)).run(signal));
        while world.status().await.generation == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let mut handles = Vec::new();
        for (n, &(x, y)) in anchors.iter().enumerate() {
            let gateway = gateway.clone();
            handles.push(tokio::spawn(async move {
                let mut states = Vec::new();
                for _ in 0..flips(n) {
                    states.push(gateway.flip(x + 2, y + 2, None).await.unwrap().alive);
                    tokio::task::yield_now().await;
                }
                states
            }));
        }
        for handle in handles {
            let states = handle.await.unwrap();
            for (k, alive) in states.iter().enumerate() {
                assert_eq!(*alive, k % 2 == 0);
            }
        }

        trigger.trigger();
        assert_eq!(sim.await.unwrap(), 0);

        let mut serial = Grid::new(SIZE).unwrap();
        for (n, &(x, y)) in anchors.iter().enumerate() {
            serial.spawn(x, y, &boat, None).unwrap();
            for _ in 0..flips(n) {
                serial.flip(x + 2, y + 2, None).unwrap();
            }
        }
        let snapshot = world.snapshot().await;
        assert_eq!(snapshot.cells(), serial.live_cells().as_slice());
        assert_eq!(snapshot.cells().len(), serial.population());
    }
}
