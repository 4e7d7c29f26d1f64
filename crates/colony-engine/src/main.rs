//! Colony engine binary.
//!
//! Wires the grid, the persistence layer, the periodic loops and the
//! HTTP/WebSocket server together and runs until a shutdown signal.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (`COLONY_CONFIG` or `colony-config.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Open the database and run migrations
//! 4. Hydrate the grid from stored cells
//! 5. Start the persistence writer
//! 6. Start the simulation loop and the snapshot broadcaster
//! 7. Start the HTTP/WebSocket server
//! 8. Wait for SIGINT/SIGTERM, then stop everything in order

mod error;
mod signals;

use std::sync::Arc;
use std::time::Duration;

use colony_core::{
    Broadcaster, ColonyConfig, LogFormat, MutationGateway, Simulation, SubscriberRegistry, World,
    shutdown_channel,
};
use colony_db::{CellDb, CellStore, SqliteConfig, spawn_persistence_writer};
use colony_grid::Grid;
use colony_server::{AppState, SessionLimits};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Longest the engine waits for a task to finish after shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Largest number of queued mutations the writer commits per transaction.
const PERSIST_BATCH: usize = 256;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any startup step fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ColonyConfig::load().map_err(EngineError::from)?;
    init_tracing(&config);
    info!(
        size = config.grid.size,
        tick_interval_ms = config.simulation.tick_interval_ms,
        broadcast_interval_ms = config.simulation.broadcast_interval_ms,
        database_url = %config.storage.database_url,
        "colony-engine starting"
    );

    run(config).await?;
    info!("colony-engine stopped");
    Ok(())
}

fn init_tracing(config: &ColonyConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match config.logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(config: ColonyConfig) -> Result<(), EngineError> {
    // Storage.
    let db_config = SqliteConfig::new(&config.storage.database_url)
        .with_max_connections(config.storage.max_connections);
    let db = CellDb::connect(&db_config).await?;
    db.run_migrations().await?;

    // Hydrate.
    let records = CellStore::new(db.pool()).load_all().await?;
    let loaded = records.len();
    let (grid, skipped) = Grid::from_records(config.grid.size, records)?;
    for record in &skipped {
        warn!(
            x = record.x,
            y = record.y,
            size = config.grid.size,
            "Stored cell outside grid, skipped"
        );
    }
    info!(
        loaded,
        skipped = skipped.len(),
        population = grid.population(),
        "Grid hydrated"
    );
    let world = World::new(grid);

    // Persistence writer.
    let (persist_tx, persist_rx) = mpsc::channel(config.storage.persist_queue);
    let writer = spawn_persistence_writer(db, persist_rx, PERSIST_BATCH);
    let gateway = MutationGateway::with_persistence(world.clone(), persist_tx);

    // Loops.
    let (trigger, signal) = shutdown_channel();
    let registry = Arc::new(SubscriberRegistry::new());

    let rng = match config.grid.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let simulation = Simulation::new(world.clone(), rng, config.simulation.tick_interval());
    let simulation = tokio::spawn(simulation.run(signal.clone()));

    let broadcaster = Broadcaster::new(
        world,
        Arc::clone(&registry),
        config.simulation.broadcast_interval(),
    );
    let broadcaster = tokio::spawn(broadcaster.run(signal.clone()));

    // Server.
    let limits = SessionLimits {
        subscriber_queue: config.server.subscriber_queue,
        send_timeout: config.server.send_timeout(),
        max_spawn_cells: config.server.max_spawn_cells,
    };
    let state = Arc::new(AppState::new(gateway, registry, limits, signal));
    let server = match colony_server::spawn_server(
        &config.server.host,
        config.server.port,
        state,
    )
    .await
    {
        Ok(handle) => handle,
        Err(e) => {
            trigger.trigger();
            join_with_grace("simulation", simulation).await;
            join_with_grace("broadcaster", broadcaster).await;
            return Err(e.into());
        }
    };

    let waited = signals::wait_for_shutdown_signal().await;
    info!("Shutdown requested");
    trigger.trigger();

    // The server owns the last gateway handle; once it stops, the writer's
    // queue closes and it drains.
    join_with_grace("server", server).await;
    if let Some(failed) = join_with_grace("simulation", simulation).await {
        info!(failed_ticks = failed, "Simulation loop joined");
    }
    join_with_grace("broadcaster", broadcaster).await;
    if let Some(stats) = join_with_grace("persistence writer", writer).await {
        info!(
            written = stats.written,
            failed = stats.failed,
            "Persistence writer joined"
        );
    }

    waited?;
    Ok(())
}

async fn join_with_grace<T>(name: &str, handle: JoinHandle<T>) -> Option<T> {
    match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            error!(task = name, error = %e, "Task ended abnormally");
            None
        }
        Err(_) => {
            error!(
                task = name,
                grace_secs = SHUTDOWN_GRACE.as_secs(),
                "Task did not stop within grace period"
            );
            None
        }
    }
}
