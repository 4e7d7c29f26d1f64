//! Snapshot broadcaster: periodic fan-out of the live cells to every
//! subscriber.
//!
//! Each pass captures one [`Snapshot`](crate::snapshot::Snapshot) under a
//! brief world lock and then, with the lock released, offers it to every
//! subscriber's bounded queue with a non-blocking `try_send`:
//!
//! - queue accepted the frame: delivered;
//! - queue full: the subscriber is lagging, so this frame is dropped for it
//!   and it gets the next one;
//! - queue closed: the connection is gone and the subscriber is removed.
//!
//! A slow or dead subscriber therefore never delays delivery to the others.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::registry::SubscriberRegistry;
use crate::shutdown::ShutdownSignal;
use crate::world::World;

/// Outcome of one broadcast pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    /// Generation of the snapshot that was sent.
    pub generation: u64,
    /// Subscribers whose queue accepted the snapshot.
    pub delivered: usize,
    /// Subscribers whose queue was full.
    pub lagged: usize,
    /// Subscribers removed because their connection had closed.
    pub removed: usize,
}

/// The periodic broadcaster.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    world: World,
    registry: Arc<SubscriberRegistry>,
    interval: Duration,
}

impl Broadcaster {
    /// Create a broadcaster that publishes `world` to `registry` every
    /// `interval`.
    pub const fn new(world: World, registry: Arc<SubscriberRegistry>, interval: Duration) -> Self {
        Self {
            world,
            registry,
            interval,
        }
    }

    /// Run a single capture and fan-out pass.
    ///
    /// Returns `None` without touching the world when nobody is subscribed.
    pub async fn broadcast_once(&self) -> Option<BroadcastReport> {
        let members = self.registry.members().await;
        if members.is_empty() {
            return None;
        }

        let snapshot = Arc::new(self.world.snapshot().await);
        let mut report = BroadcastReport {
            generation: snapshot.generation(),
            ..BroadcastReport::default()
        };

        for (id, tx) in members {
            match tx.try_send(Arc::clone(&snapshot)) {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(TrySendError::Full(_)) => {
                    report.lagged = report.lagged.saturating_add(1);
                    debug!(subscriber = %id, "Subscriber lagging, frame dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    if self.registry.unregister(id).await {
                        report.removed = report.removed.saturating_add(1);
                    }
                    debug!(subscriber = %id, "Subscriber gone, removed");
                }
            }
        }
        Some(report)
    }

    /// Broadcast every interval until `shutdown` fires.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        info!(
            interval_ms = self.interval.as_millis(),
            "Snapshot broadcaster started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = shutdown.wait() => break,
                _ = ticker.tick() => {}
            }
            if let Some(report) = self.broadcast_once().await {
                if report.lagged > 0 || report.removed > 0 {
                    warn!(
                        generation = report.generation,
                        delivered = report.delivered,
                        lagged = report.lagged,
                        removed = report.removed,
                        "Broadcast incomplete"
                    );
                } else {
                    debug!(
                        generation = report.generation,
                        delivered = report.delivered,
                        "Broadcast complete"
                    );
                }
            }
        }
        info!("Snapshot broadcaster stopped");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use colony_grid::{Color, Grid, Pattern};
    use tokio::sync::mpsc;

    use super::*;
    use crate::gateway::MutationGateway;
    use crate::shutdown::shutdown_channel;

    fn setup(size: usize) -> (World, Arc<SubscriberRegistry>, Broadcaster) {
        let world = World::new(Grid::new(size).unwrap());
        let registry = Arc::new(SubscriberRegistry::new());
        let broadcaster =
            Broadcaster::new(world.clone(), Arc::clone(&registry), Duration::from_millis(50));
        (world, registry, broadcaster)
    }

    #[tokio::test]
    async fn no_subscribers_means_no_pass() {
        let (_, _, broadcaster) = setup(4);
        assert!(broadcaster.broadcast_once().await.is_none());
    }

    #[tokio::test]
    async fn every_subscriber_gets_the_same_snapshot() {
        let (world, registry, broadcaster) = setup(6);
        let red = Color::new("#ff0000").unwrap();
        MutationGateway::new(world)
            .spawn(0, 0, &Pattern::named("block").unwrap(), Some(&red))
            .await
            .unwrap();

        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = mpsc::channel(2);
            registry.register(tx).await;
            receivers.push(rx);
        }

        let report = broadcaster.broadcast_once().await.unwrap();
        assert_eq!(report.delivered, 3);

        let first = receivers.first_mut().unwrap().recv().await.unwrap();
        assert_eq!(first.cells().len(), 4);
        for rx in receivers.iter_mut().skip(1) {
            let snapshot = rx.recv().await.unwrap();
            assert!(Arc::ptr_eq(&first, &snapshot));
        }
    }

    #[tokio::test]
    async fn disconnect_mid_broadcast_removes_only_that_subscriber() {
        let (_, registry, broadcaster) = setup(4);
        let (tx_a, mut rx_a) = mpsc::channel(1);
        let (tx_b, rx_b) = mpsc::channel(1);
        let (tx_c, mut rx_c) = mpsc::channel(1);
        let a = registry.register(tx_a).await;
        let b = registry.register(tx_b).await;
        let c = registry.register(tx_c).await;
        drop(rx_b);

        let report = broadcaster.broadcast_once().await.unwrap();
        assert_eq!(report.delivered, 2);
        assert_eq!(report.removed, 1);
        assert!(rx_a.recv().await.is_some());
        assert!(rx_c.recv().await.is_some());

        assert!(registry.contains(a).await);
        assert!(!registry.contains(b).await);
        assert!(registry.contains(c).await);
    }

    #[tokio::test]
    async fn full_queue_is_lagged_not_removed() {
        let (_, registry, broadcaster) = setup(4);
        let (tx, mut rx) = mpsc::channel(1);
        let id = registry.register(tx).await;

        assert_eq!(broadcaster.broadcast_once().await.unwrap().delivered, 1);
        let report = broadcaster.broadcast_once().await.unwrap();
        assert_eq!(report.lagged, 1);
        assert_eq!(report.delivered, 0);
        assert!(registry.contains(id).await);

        rx.recv().await.unwrap();
        assert_eq!(broadcaster.broadcast_once().await.unwrap().delivered, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_publishes_periodically_until_shutdown() {
        let (_, registry, broadcaster) = setup(4);
        let (tx, mut rx) = mpsc::channel(16);
        registry.register(tx).await;
        let (trigger, signal) = shutdown_channel();
        let handle = tokio::spawn(broadcaster.run(signal));

        tokio::time::sleep(Duration::from_millis(120)).await;
        trigger.trigger();
        handle.await.unwrap();

        let mut frames = 0;
        while rx.try_recv().is_ok() {
            frames += 1;
        }
        // Ticks at 0, 50 and 100 ms.
        assert_eq!(frames, 3);
    }
}
