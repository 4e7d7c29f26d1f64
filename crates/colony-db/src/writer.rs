//! Background task that drains mutation records into the database.
//!
//! The mutation gateway pushes the [`CellRecord`]s of each accepted mutation
//! into a bounded channel, in the order the mutations were applied. This
//! task pulls several mutations off at a time and upserts their records, in
//! queue order, in a single transaction.
//! A failed batch is logged and dropped: the in-memory grid stays
//! authoritative and the process keeps running.
//!
//! The task ends when every sender has been dropped and the queue is empty,
//! then closes the pool.

use colony_grid::CellRecord;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cell_store::CellStore;
use crate::sqlite::CellDb;

/// Totals reported by the writer when it stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Records committed to the database.
    pub written: u64,
    /// Records lost to failed batches.
    pub failed: u64,
}

/// Spawn the persistence writer. `batch` caps how many queued mutations go
/// into one transaction.
pub fn spawn_persistence_writer(
    db: CellDb,
    mut rx: mpsc::Receiver<Vec<CellRecord>>,
    batch: usize,
) -> JoinHandle<WriterStats> {
    let batch = batch.max(1);
    tokio::spawn(async move {
        let mut stats = WriterStats::default();
        let mut buf = Vec::with_capacity(batch);
        let mut records = Vec::new();
        while rx.recv_many(&mut buf, batch).await > 0 {
            records.extend(buf.drain(..).flatten());
            let n = u64::try_from(records.len()).unwrap_or(u64::MAX);
            match CellStore::new(db.pool()).upsert_batch(&records).await {
                Ok(()) => {
                    stats.written = stats.written.saturating_add(n);
                    debug!(records = n, "Persisted cell batch");
                }
                Err(e) => {
                    stats.failed = stats.failed.saturating_add(n);
                    error!(error = %e, records = n, "Failed to persist cell batch");
                }
            }
            records.clear();
        }
        info!(
            written = stats.written,
            failed = stats.failed,
            "Persistence writer drained"
        );
        db.close().await;
        stats
    })
}
