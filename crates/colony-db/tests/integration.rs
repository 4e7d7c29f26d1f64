//! Integration tests for the `colony-db` persistence layer.
//!
//! Every test runs against a private in-memory `SQLite` database, so no
//! external service is needed.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use colony_db::{CellDb, CellStore, SqliteConfig, spawn_persistence_writer};
use colony_grid::{CellRecord, Color, Grid};
use tokio::sync::mpsc;

async fn setup_db() -> CellDb {
    let config = SqliteConfig::new("sqlite::memory:").with_max_connections(1);
    let db = CellDb::connect(&config)
        .await
        .expect("Failed to open in-memory SQLite");
    db.run_migrations().await.expect("Failed to run migrations");
    db
}

fn alive(x: usize, y: usize, color: Option<&str>) -> CellRecord {
    CellRecord {
        x,
        y,
        alive: true,
        color: color.map(|c| Color::new(c).unwrap()),
    }
}

fn dead(x: usize, y: usize) -> CellRecord {
    CellRecord {
        x,
        y,
        alive: false,
        color: None,
    }
}

#[tokio::test]
async fn empty_database_loads_nothing() {
    let db = setup_db().await;
    let records = CellStore::new(db.pool()).load_all().await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = setup_db().await;
    db.run_migrations().await.unwrap();
}

#[tokio::test]
async fn upsert_keeps_last_state_per_position() {
    let db = setup_db().await;
    let store = CellStore::new(db.pool());

    store.upsert(&alive(2, 3, Some("#ff0000"))).await.unwrap();
    store.upsert(&alive(0, 1, None)).await.unwrap();
    store.upsert(&dead(2, 3)).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 2);
    let records = store.load_all().await.unwrap();
    assert_eq!(records, vec![alive(0, 1, None), dead(2, 3)]);
}

#[tokio::test]
async fn batch_upsert_is_applied_in_order() {
    let db = setup_db().await;
    let store = CellStore::new(db.pool());

    store
        .upsert_batch(&[
            alive(1, 1, Some("#00ff00")),
            alive(1, 2, Some("#00ff00")),
            dead(1, 1),
            alive(1, 1, Some("#0000ff")),
        ])
        .await
        .unwrap();

    let records = store.load_all().await.unwrap();
    assert_eq!(
        records,
        vec![alive(1, 1, Some("#0000ff")), alive(1, 2, Some("#00ff00"))]
    );
}

#[tokio::test]
async fn hydration_round_trip_through_grid() {
    let db = setup_db().await;
    let store = CellStore::new(db.pool());
    store
        .upsert_batch(&[
            alive(0, 0, Some("#123456")),
            alive(4, 4, None),
            alive(9, 9, Some("#abcdef")),
            dead(1, 1),
        ])
        .await
        .unwrap();

    let (grid, skipped) = Grid::from_records(5, store.load_all().await.unwrap()).unwrap();
    assert_eq!(grid.population(), 2);
    assert_eq!(skipped, vec![alive(9, 9, Some("#abcdef"))]);
}

#[tokio::test]
async fn negative_and_invalid_rows_are_tolerated() {
    let db = setup_db().await;
    sqlx::query("INSERT INTO cells (x, y, state, color) VALUES (-1, 2, 1, '#ff0000'), (3, 3, 1, '')")
        .execute(db.pool())
        .await
        .unwrap();

    let records = CellStore::new(db.pool()).load_all().await.unwrap();
    assert_eq!(records, vec![alive(3, 3, None)]);
}

#[tokio::test]
async fn writer_drains_queue_and_stops() {
    let db = setup_db().await;
    let shared = db.clone();
    let (tx, rx) = mpsc::channel(8);
    let handle = spawn_persistence_writer(db, rx, 3);

    for i in 0..5 {
        tx.send(vec![alive(i, 0, Some("#ff00ff"))]).await.unwrap();
    }
    tx.send(vec![alive(5, 0, None), alive(6, 0, None)]).await.unwrap();
    tx.send(vec![dead(0, 0)]).await.unwrap();
    drop(tx);

    let stats = handle.await.unwrap();
    assert_eq!(stats.written, 8);
    assert_eq!(stats.failed, 0);
    assert!(shared.pool().is_closed());
}

#[tokio::test]
async fn writer_applies_queued_mutations_in_order() {
    let db = setup_db().await;
    let shared = db.clone();
    let (tx, rx) = mpsc::channel(8);
    let handle = spawn_persistence_writer(db, rx, 8);

    tx.send(vec![alive(2, 2, Some("#ff0000"))]).await.unwrap();
    tx.send(vec![dead(2, 2)]).await.unwrap();
    tx.send(vec![alive(2, 2, Some("#0000ff")), alive(0, 1, None)])
        .await
        .unwrap();
    tx.send(vec![dead(0, 1)]).await.unwrap();

    let expected = vec![dead(0, 1), alive(2, 2, Some("#0000ff"))];
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    let records = loop {
        let records = CellStore::new(shared.pool()).load_all().await.unwrap();
        if records == expected || tokio::time::Instant::now() > deadline {
            break records;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    };
    assert_eq!(records, expected);

    drop(tx);
    let stats = handle.await.unwrap();
    assert_eq!(stats.written, 5);
}
