//! Spawner notifications
//!
//! A plain observer list. Hosts subscribe and unsubscribe explicitly;
//! nothing is tied to scene membership.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::SpawnError;
use crate::items::{Label, SpawnedInstance};

/// Events emitted by the catalog and the spawn coordinator
#[derive(Debug, Clone)]
pub enum SpawnerEvent {
    /// A reload finished; every tracked label has its key list
    CatalogLoaded { labels: usize, keys: usize },
    /// An item finished instantiating
    InstanceSpawned { instance: SpawnedInstance },
    /// A spawn request produced nothing
    SpawnSkipped { label: Label, error: SpawnError },
}

/// Id returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&SpawnerEvent) + Send + Sync>;

/// Subscriber list for [`SpawnerEvent`]s
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<(SubscriptionId, Callback)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback, called for every event until unsubscribed
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SpawnerEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        subscribers.len() != before
    }

    /// Number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Deliver an event to every subscriber, in subscription order
    pub fn emit(&self, event: &SpawnerEvent) {
        // Snapshot so callbacks may (un)subscribe without deadlocking
        let callbacks: Vec<Callback> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
