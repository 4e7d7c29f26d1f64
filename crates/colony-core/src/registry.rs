//! Subscriber registry: the set of currently connected observers.
//!
//! Each subscriber is represented by the sending half of a bounded channel
//! of [`Snapshot`]s; the connection task that owns the receiving half
//! writes frames to its socket. Subscribers are keyed by an opaque
//! [`SubscriberId`].
//!
//! The broadcaster never iterates the live map. It takes a copy of the
//! membership via [`SubscriberRegistry::members`], so a register or
//! unregister that races a broadcast pass cannot invalidate the iteration.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use tracing::debug;
use uuid::Uuid;

use crate::snapshot::Snapshot;

/// Channel half through which a subscriber receives snapshots.
pub type SnapshotSender = mpsc::Sender<Arc<Snapshot>>;

/// Opaque handle identifying one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Concurrent map of subscribers.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<BTreeMap<SubscriberId, SnapshotSender>>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber and return its handle.
    pub async fn register(&self, sender: SnapshotSender) -> SubscriberId {
        let id = SubscriberId::new();
        let count = {
            let mut subscribers = self.subscribers.write().await;
            subscribers.insert(id, sender);
            subscribers.len()
        };
        debug!(subscriber = %id, count, "Subscriber registered");
        id
    }

    /// Remove a subscriber. Returns `false` if it was already gone, which
    /// happens when the broadcaster and the connection task both notice the
    /// same disconnect.
    pub async fn unregister(&self, id: SubscriberId) -> bool {
        let (removed, count) = {
            let mut subscribers = self.subscribers.write().await;
            let removed = subscribers.remove(&id).is_some();
            (removed, subscribers.len())
        };
        if removed {
            debug!(subscriber = %id, count, "Subscriber unregistered");
        }
        removed
    }

    /// Whether `id` is currently registered.
    pub async fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers.read().await.contains_key(&id)
    }

    /// Number of registered subscribers.
    pub async fn len(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Whether no subscriber is registered.
    pub async fn is_empty(&self) -> bool {
        self.subscribers.read().await.is_empty()
    }

    /// Copy of the current membership, safe to iterate while the registry
    /// keeps changing.
    pub async fn members(&self) -> Vec<(SubscriberId, SnapshotSender)> {
        self.subscribers
            .read()
            .await
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect()
    }
}
